use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Storage kind of a genome parameter's value. `Derived`
/// parameters are computed from others by the meta-evolution layer and
/// are never mutated directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Float,
    Int,
    Bool,
    Derived,
}

/// A single named, bounded, evolvable hyperparameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenomeParam {
    pub value: f32,
    pub min: f32,
    pub max: f32,
    pub kind: ParamKind,
    /// Generation before which this parameter is shielded from pruning
    ///.
    pub protected_until_gen: u64,
    /// Rolling EMA of this parameter's observed contribution to fitness;
    /// drives retirement of stale parameters.
    pub contrib_ema: f32,
    /// Optional fixed reference value a parameter is pulled back toward.
    pub anchor: Option<f32>,
    pub half_life_s: Option<f32>,
    pub decay_target: Option<f32>,
    pub active: bool,
    pub innovation_id: u64,
}

impl GenomeParam {
    pub fn new(value: f32, min: f32, max: f32) -> Self {
        Self {
            value: value.clamp(min, max),
            min,
            max,
            kind: ParamKind::Float,
            protected_until_gen: 0,
            contrib_ema: 0.0,
            anchor: None,
            half_life_s: None,
            decay_target: None,
            active: true,
            innovation_id: 0,
        }
    }

    pub fn set(&mut self, value: f32) {
        self.value = value.clamp(self.min, self.max);
    }
}

/// The full set of runtime hyperparameters, keyed by name, plus the
/// bookkeeping the evolutionary controller needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterGenome {
    pub params: HashMap<String, GenomeParam>,
    pub generation: u64,
    pub fitness: f32,
    pub next_innovation_id: u64,
}

impl ParameterGenome {
    /// Get a parameter's value, panicking only if the default-population
    /// table in [`ParameterGenome::default_genome`] is out of sync with a
    /// caller — every production caller uses a name from that table.
    pub fn get(&self, name: &str) -> f32 {
        self.params
            .get(name)
            .map(|p| p.value)
            .unwrap_or_else(|| panic!("unknown genome parameter `{name}`"))
    }

    pub fn get_or(&self, name: &str, default: f32) -> f32 {
        self.params.get(name).map(|p| p.value).unwrap_or(default)
    }

    pub fn set(&mut self, name: &str, value: f32) {
        if let Some(p) = self.params.get_mut(name) {
            p.set(value);
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, param: GenomeParam) {
        let mut param = param;
        param.innovation_id = self.next_innovation_id;
        self.next_innovation_id += 1;
        self.params.insert(name.into(), param);
    }

    /// The literal (non-`MELVIN_`-prefixed) override names documented for
    /// the most commonly tuned coefficients, each aliased onto its genome
    /// key.
    fn literal_env_aliases() -> &'static [(&'static str, &'static str)] {
        &[
            ("MIN_CONF_EMIT", "reasoning.t_emit_general"),
            ("REL_EXACT", "scoring.rel_prior.exact"),
            ("BETA0", "scoring.conf_beta0"),
            ("BETA1", "scoring.conf_beta1"),
            ("BETA2", "scoring.conf_beta2"),
            ("BETA3", "scoring.conf_beta3"),
            ("BETA4", "scoring.conf_beta4"),
            ("PATH_LOG_SHIFT", "scoring.path_log_shift"),
            ("PATH_LOG_SCALE", "scoring.path_log_scale"),
        ]
    }

    /// Apply environment variable overrides for every known parameter.
    /// Two naming schemes are honored: the generic
    /// `MELVIN_<UPPER_SNAKE_NAME>` form for any registered parameter, and
    /// the literal documented names (`MIN_CONF_EMIT`, `REL_EXACT`,
    /// `BETA0..BETA4`, `PATH_LOG_SHIFT`, `PATH_LOG_SCALE`) aliased onto
    /// their genome keys. Unknown env vars are ignored; malformed values
    /// are ignored rather than surfaced, since config loading happens
    /// before logging is wired up.
    pub fn apply_env_overrides(&mut self) {
        let names: Vec<String> = self.params.keys().cloned().collect();
        for name in names {
            let env_name = format!("MELVIN_{}", name.to_uppercase().replace('.', "_"));
            if let Ok(raw) = std::env::var(&env_name) {
                if let Ok(value) = raw.parse::<f32>() {
                    self.set(&name, value);
                }
            }
        }
        for (env_name, key) in Self::literal_env_aliases() {
            if let Ok(raw) = std::env::var(env_name) {
                if let Ok(value) = raw.parse::<f32>() {
                    self.set(key, value);
                }
            }
        }
    }

    /// The default genome: every tunable coefficient with its
    /// default value and a sane mutation range.
    pub fn default_genome() -> Self {
        let mut params = HashMap::new();
        let mut add = |name: &str, value: f32, min: f32, max: f32| {
            params.insert(name.to_string(), GenomeParam::new(value, min, max));
        };

        // Scoring kernel
        add("scoring.lambda_mix", 0.7, 0.0, 1.0);
        add("scoring.epsilon_mix", 1e-4, 1e-6, 1e-2);
        add("scoring.recency_tau", 300.0, 10.0, 3600.0);
        add("scoring.pseudo_count", 0.75, 0.0, 5.0);
        add("scoring.rel_prior.exact", 1.00, 0.1, 3.0);
        add("scoring.rel_prior.temporal", 1.20, 0.1, 3.0);
        add("scoring.rel_prior.leap", 0.85, 0.1, 3.0);
        add("scoring.rel_prior.generalization", 1.10, 0.1, 3.0);
        add("scoring.rel_prior.default", 1.00, 0.1, 3.0);
        add("scoring.degree_delta", 1e-6, 1e-9, 1e-2);
        add("scoring.contradiction_beta", 1.5, 0.0, 5.0);
        add("scoring.temporal_continuity_t", 5.0, 0.1, 60.0);
        add("scoring.multi_hop_gamma", 0.93, 0.5, 1.0);
        add("scoring.diversity_lambda", 0.3, 0.0, 2.0);
        add("scoring.conf_beta0", -0.5, -3.0, 3.0);
        add("scoring.conf_beta1", 3.0, 0.0, 10.0);
        add("scoring.conf_beta2", 0.15, 0.0, 2.0);
        add("scoring.conf_beta3", 0.5, 0.0, 2.0);
        add("scoring.conf_beta4", 1.0, 0.0, 3.0);
        add("scoring.path_log_shift", 12.0, 0.0, 50.0);
        add("scoring.path_log_scale", 1.0, 0.1, 10.0);

        // Reasoning engine / emission gate
        add("reasoning.beam_width", 4.0, 1.0, 32.0);
        add("reasoning.max_hops", 4.0, 1.0, 8.0);
        add("reasoning.min_edge_weight", 0.1, 0.0, 1.0);
        add("reasoning.t_emit_general", 0.15, 0.0, 1.0);
        add("reasoning.t_emit_factoid", 0.12, 0.0, 1.0);
        add("reasoning.t_emit_control_robot", 0.35, 0.0, 1.0);
        add("reasoning.t_ask", 0.06, 0.0, 1.0);
        add("reasoning.h_max", 1.25, 0.0, 5.0);
        add("reasoning.m_min", 0.35, 0.0, 1.0);
        add("reasoning.cooldown_ticks", 8.0, 1.0, 64.0);
        add("reasoning.max_contradiction_safety", 0.5, 0.0, 1.0);
        add("reasoning.baseline_delta", 0.1, 0.0, 1.0);
        add("reasoning.leap_bias", 0.1, 0.0, 1.0);
        add("reasoning.abstraction_threshold", 0.6, 0.0, 1.0);

        // Emergent dynamics
        add("emergent.formation_rate", 0.01, 1e-4, 0.5);
        add("emergent.elimination_rate", 0.005, 1e-4, 0.5);
        add("emergent.decay_rate", 0.9, 0.5, 0.999);
        add("emergent.spread_factor", 0.3, 0.0, 1.0);
        add("emergent.prune_threshold", 0.05, 0.0, 0.5);
        add("emergent.initial_strength", 0.01, 0.0, 0.2);
        add("emergent.recovery_rate", 0.02, 0.0, 1.0);
        add("emergent.activation_epsilon", 0.01, 0.0, 0.5);
        add("emergent.initial_cost", 0.05, 1e-4, 1.0);
        add("emergent.initial_energy_consumption", 0.001, 1e-5, 1.0);
        add("emergent.unused_age_ticks", 100.0, 1.0, 10000.0);
        add("emergent.need_decay_ticks", 50.0, 1.0, 1000.0);
        add("emergent.budget_refuse_fraction", 0.9, 0.1, 1.0);
        add("emergent.energy_budget", 100.0, 1.0, 100000.0);

        // Learning pipeline / SM-2
        add("srs.ease_start", 2.5, 1.3, 4.0);
        add("srs.ease_floor", 1.3, 1.0, 2.0);
        add("srs.ease_step_good", 0.15, 0.0, 1.0);
        add("srs.ease_step_hard", -0.2, -1.0, 0.0);
        add("srs.ease_step_easy", 0.18, 0.0, 1.0);
        add("srs.lapse_factor", 0.5, 0.1, 1.0);
        add("srs.easy_interval_bonus", 1.3, 1.0, 3.0);
        add("srs.min_interval_days", 1.0, 0.1, 10.0);
        add("srs.max_interval_days", 60.0, 10.0, 3650.0);
        add("srs.daily_limit", 200.0, 1.0, 10000.0);
        add("srs.match_threshold", 0.85, 0.0, 1.0);
        add("srs.decay_eta", 0.02, 0.0, 1.0);

        // Metrics & evolution
        add("evolution.fitness_w1", 0.3, 0.0, 1.0);
        add("evolution.fitness_w2", 0.2, 0.0, 1.0);
        add("evolution.fitness_w3", 0.3, 0.0, 1.0);
        add("evolution.fitness_w4", 0.2, 0.0, 1.0);
        add("evolution.ema_alpha", 0.1, 0.01, 0.9);
        add("evolution.entropy_trigger", 1.5, 0.5, 3.0);
        add("evolution.success_trigger", 0.6, 0.0, 1.0);
        add("evolution.drift_trigger", 0.25, 0.0, 1.0);
        add("evolution.slope_threshold", -0.002, -0.1, 0.0);
        add("evolution.confidence_threshold", 0.18, 0.0, 1.0);
        add("evolution.reward_threshold", 0.10, 0.0, 1.0);
        add("evolution.ucb_exploration", 1.0, 0.0, 5.0);
        add("evolution.rate_limit_ticks", 50.0, 1.0, 1000.0);
        add("evolution.mutation_rate", 0.2, 0.0, 1.0);
        add("evolution.mutation_strength", 0.05, 0.0, 1.0);

        // Cross-modal binding
        add("crossmodal.alpha_context", 0.3, 0.0, 2.0);
        add("crossmodal.beta_temporal", 0.2, 0.0, 2.0);
        add("crossmodal.temporal_decay_gamma", 0.98, 0.5, 1.0);
        add("crossmodal.softmax_temperature", 1.0, 0.05, 5.0);

        let mut genome = Self {
            params,
            generation: 0,
            fitness: 0.0,
            next_innovation_id: 0,
        };
        genome.apply_env_overrides();
        genome
    }
}

impl Default for ParameterGenome {
    fn default() -> Self {
        Self::default_genome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_genome_matches_documented_defaults() {
        let g = ParameterGenome::default_genome();
        assert_eq!(g.get("scoring.lambda_mix"), 0.7);
        assert_eq!(g.get("scoring.rel_prior.temporal"), 1.20);
        assert_eq!(g.get("reasoning.t_emit_control_robot"), 0.35);
        assert_eq!(g.get("emergent.decay_rate"), 0.9);
    }

    #[test]
    fn set_clamps_to_declared_range() {
        let mut g = ParameterGenome::default_genome();
        g.set("scoring.lambda_mix", 5.0);
        assert_eq!(g.get("scoring.lambda_mix"), 1.0);
        g.set("scoring.lambda_mix", -5.0);
        assert_eq!(g.get("scoring.lambda_mix"), 0.0);
    }

    #[test]
    fn literal_env_alias_overrides_its_genome_key() {
        // SAFETY-equivalent: tests run single-threaded within this module
        // for env-var mutation; restore afterward so other tests are
        // unaffected.
        std::env::set_var("BETA0", "2.0");
        let g = ParameterGenome::default_genome();
        std::env::remove_var("BETA0");
        assert_eq!(g.get("scoring.conf_beta0"), 2.0);
    }
}
