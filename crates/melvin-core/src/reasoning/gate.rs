//! Three-mode emission gate with hysteresis and a dynamic threshold
//!.

use crate::genome::ParameterGenome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gate {
    Emit,
    Ask,
    #[default]
    Listen,
}

#[derive(Debug, Clone)]
pub struct GateState {
    pub last: Gate,
    pub ticks_since_change: u32,
}

impl Default for GateState {
    fn default() -> Self {
        Self {
            last: Gate::Listen,
            ticks_since_change: 999,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Factoid,
    ControlRobot,
    General,
}

/// Heuristic intent classifier over query tokens.
pub fn detect_intent(tokens: &[String]) -> Intent {
    for token in tokens {
        let t = token.as_str();
        if t.contains("control") || t.contains("robot") || t.contains("move") || t.contains("action") {
            return Intent::ControlRobot;
        }
        if t.contains("what") || t.contains("define") || t.contains("meaning") {
            return Intent::Factoid;
        }
    }
    Intent::General
}

pub fn threshold_for_intent(intent: Intent, genome: &ParameterGenome) -> f32 {
    match intent {
        Intent::ControlRobot => genome.get("reasoning.t_emit_control_robot"),
        Intent::Factoid => genome.get("reasoning.t_emit_factoid"),
        Intent::General => genome.get("reasoning.t_emit_general"),
    }
}

/// `T_dyn = clamp(0.08 + 0.5 · Q75(conf_history), 0.08, 0.25)` — raises the
/// emit bar when recent confidence has been running high.
pub fn dynamic_threshold(conf_history: &[f32]) -> f32 {
    let q75 = rolling_quantile(conf_history, 0.75);
    (0.08 + 0.5 * q75).clamp(0.08, 0.25)
}

fn rolling_quantile(hist: &[f32], q: f32) -> f32 {
    if hist.is_empty() {
        return 0.5;
    }
    let mut sorted: Vec<f32> = hist.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((q * (sorted.len() - 1) as f32).round() as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// Raw three-mode decision, before hysteresis is applied.
pub fn decide_gate(conf: f32, entropy: f32, top2_margin: f32, t_emit: f32, genome: &ParameterGenome) -> Gate {
    let t_ask = genome.get("reasoning.t_ask");
    let h_max = genome.get("reasoning.h_max");
    let m_min = genome.get("reasoning.m_min");
    let certain = entropy <= h_max && top2_margin >= m_min;
    if conf >= t_emit && certain {
        Gate::Emit
    } else if conf >= t_ask {
        Gate::Ask
    } else {
        Gate::Listen
    }
}

/// Hold the previous decision for `COOLDOWN` ticks unless it has been
/// stable that long.
pub fn hysteresis_gate(raw: Gate, state: &mut GateState, genome: &ParameterGenome) -> Gate {
    let cooldown = genome.get("reasoning.cooldown_ticks") as u32;
    if raw == state.last {
        state.ticks_since_change = state.ticks_since_change.saturating_add(1);
        return raw;
    }
    if state.ticks_since_change < cooldown {
        return state.last;
    }
    state.last = raw;
    state.ticks_since_change = 0;
    raw
}

/// Null-hypothesis and contradiction safety gate.
pub fn safety_check(s_path: f32, max_contradiction: f32, genome: &ParameterGenome) -> bool {
    let baseline_delta = genome.get_or("reasoning.baseline_delta", 0.1);
    if s_path <= baseline_delta {
        return false;
    }
    let limit = genome.get("reasoning.max_contradiction_safety");
    if max_contradiction > limit {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hysteresis_holds_decision_during_cooldown() {
        let genome = ParameterGenome::default_genome();
        let mut state = GateState {
            last: Gate::Emit,
            ticks_since_change: 0,
        };
        let gate = hysteresis_gate(Gate::Listen, &mut state, &genome);
        assert_eq!(gate, Gate::Emit); // held
    }

    #[test]
    fn hysteresis_flips_after_cooldown_elapses() {
        let genome = ParameterGenome::default_genome();
        let mut state = GateState {
            last: Gate::Emit,
            ticks_since_change: 100,
        };
        let gate = hysteresis_gate(Gate::Listen, &mut state, &genome);
        assert_eq!(gate, Gate::Listen);
    }

    #[test]
    fn safety_check_rejects_high_contradiction() {
        let genome = ParameterGenome::default_genome();
        assert!(!safety_check(1.0, 0.9, &genome));
        assert!(safety_check(1.0, 0.1, &genome));
    }

    #[test]
    fn decide_gate_requires_certainty_for_emit() {
        let genome = ParameterGenome::default_genome();
        let t_emit = genome.get("reasoning.t_emit_general");
        // High confidence but high entropy => not certain, so not Emit.
        let gate = decide_gate(0.9, 5.0, 0.0, t_emit, &genome);
        assert_ne!(gate, Gate::Emit);
    }
}
