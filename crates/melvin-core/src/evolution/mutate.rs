//! Micro-evolution step: UCB-guided mutation, elitist rank-blending, and
//! parameter life-cycle management, grounded on
//! `ReflectionEngine.cpp`'s `compute_ucb` and UCB-based parameter
//! selection.

use std::collections::HashMap;

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::genome::{GenomeParam, ParamKind, ParameterGenome};

use super::metrics::Metrics;

const POPULATION_SIZE: usize = 6;

/// Per-parameter reward history feeding `UCB(p) = mean_reward(p) +
/// c*sqrt(ln(N)/n_p)`.
#[derive(Debug, Clone, Default)]
pub struct UcbStats {
    trials: HashMap<String, (f32, u32)>,
    total_trials: u32,
}

impl UcbStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &str, reward: f32) {
        let entry = self.trials.entry(name.to_string()).or_insert((0.0, 0));
        entry.1 += 1;
        entry.0 += (reward - entry.0) / entry.1 as f32;
        self.total_trials += 1;
    }

    /// Unseen parameters get `+inf` so every parameter is tried at least
    /// once before exploitation kicks in.
    pub fn ucb(&self, name: &str, exploration: f32) -> f32 {
        match self.trials.get(name) {
            None => f32::INFINITY,
            Some(&(mean, n)) if n > 0 => {
                mean + exploration * ((self.total_trials.max(1) as f32).ln() / n as f32).sqrt()
            }
            Some(_) => f32::INFINITY,
        }
    }
}

fn parameter_balance_bonus(genome: &ParameterGenome) -> f32 {
    let mut bonus = 0.0;
    let mut count = 0;
    for param in genome.params.values() {
        if param.kind != ParamKind::Float || !param.active {
            continue;
        }
        let span = param.max - param.min;
        if span <= 0.0 {
            continue;
        }
        let centered = 1.0 - (2.0 * (param.value - param.min) / span - 1.0).abs();
        bonus += centered;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        0.05 * (bonus / count as f32)
    }
}

fn mutate_once(
    base: &ParameterGenome,
    mutation_rate: f32,
    mutation_strength: f32,
    exploration: f32,
    ucb: &UcbStats,
    rng: &mut impl Rng,
) -> ParameterGenome {
    let mut child = base.clone();
    let names: Vec<String> = child.params.keys().cloned().collect();
    for name in names {
        let (kind, active, value, min, max) = {
            let p = &child.params[&name];
            (p.kind, p.active, p.value, p.min, p.max)
        };
        if kind != ParamKind::Float || !active {
            continue;
        }
        let score = ucb.ucb(&name, exploration);
        let effective_rate = if score.is_infinite() {
            1.0
        } else {
            (mutation_rate * (1.0 + score)).clamp(0.0, 1.0)
        };
        if rng.gen::<f32>() >= effective_rate {
            continue;
        }
        let normal = Normal::new(0.0, mutation_strength as f64).expect("positive sigma");
        let delta = normal.sample(rng) as f32;
        child.set(&name, (value + delta).clamp(min, max));
    }
    child
}

/// Generate a mutated population, score it against the current metrics
/// snapshot plus a parameter-balance bonus, and blend the ranked
/// candidates (weight `1/rank`) into the next genome. The current genome
/// always participates in the ranking (elitism).
pub fn micro_evolve(
    current: &ParameterGenome,
    metrics: &Metrics,
    ucb: &UcbStats,
    rng: &mut impl Rng,
) -> ParameterGenome {
    let mutation_rate = current.get("evolution.mutation_rate");
    let mutation_strength = current.get("evolution.mutation_strength");
    let exploration = current.get("evolution.ucb_exploration");

    let mut ranked: Vec<(f32, ParameterGenome)> = (0..POPULATION_SIZE)
        .map(|_| mutate_once(current, mutation_rate, mutation_strength, exploration, ucb, rng))
        .map(|g| {
            let fitness = metrics.fitness(&g) + parameter_balance_bonus(&g);
            (fitness, g)
        })
        .collect();
    let current_fitness = metrics.fitness(current) + parameter_balance_bonus(current);
    ranked.push((current_fitness, current.clone()));
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut blended = current.clone();
    blended.generation = current.generation + 1;
    blended.fitness = ranked[0].0;

    let names: Vec<String> = current.params.keys().cloned().collect();
    for name in names {
        if current.params[&name].kind != ParamKind::Float {
            continue;
        }
        let mut weighted_sum = 0.0f32;
        let mut weight_total = 0.0f32;
        for (rank, (_, genome)) in ranked.iter().enumerate() {
            let weight = 1.0 / (rank as f32 + 1.0);
            weighted_sum += weight * genome.get(&name);
            weight_total += weight;
        }
        blended.set(&name, weighted_sum / weight_total);
    }

    blended
}

/// Add a new evolvable parameter, protected from retirement until
/// `generation + protection_window`.
pub fn spawn_parameter(
    genome: &mut ParameterGenome,
    name: impl Into<String>,
    value: f32,
    min: f32,
    max: f32,
    protection_window: u64,
) {
    let mut param = GenomeParam::new(value, min, max);
    param.protected_until_gen = genome.generation + protection_window;
    genome.insert(name, param);
}

pub fn update_contrib_ema(genome: &mut ParameterGenome, name: &str, contribution: f32, alpha: f32) {
    if let Some(p) = genome.params.get_mut(name) {
        p.contrib_ema = alpha * contribution + (1.0 - alpha) * p.contrib_ema;
    }
}

/// Retire parameters whose `contrib_ema` has stayed near zero past their
/// protection window.
pub fn retire_stale_parameters(genome: &mut ParameterGenome, epsilon: f32) {
    for param in genome.params.values_mut() {
        if param.active
            && genome.generation > param.protected_until_gen
            && param.contrib_ema.abs() < epsilon
        {
            param.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn micro_evolve_keeps_values_within_declared_ranges() {
        let genome = ParameterGenome::default_genome();
        let metrics = Metrics::new();
        let ucb = UcbStats::new();
        let mut rng = StdRng::seed_from_u64(7);
        let next = micro_evolve(&genome, &metrics, &ucb, &mut rng);
        for (name, param) in &next.params {
            assert!(
                param.value >= param.min && param.value <= param.max,
                "{name} out of range: {}",
                param.value
            );
        }
        assert_eq!(next.generation, genome.generation + 1);
    }

    #[test]
    fn ucb_prefers_untried_parameters() {
        let mut ucb = UcbStats::new();
        ucb.record("scoring.lambda_mix", 0.5);
        assert!(ucb.ucb("scoring.recency_tau", 1.0).is_infinite());
        assert!(ucb.ucb("scoring.lambda_mix", 1.0).is_finite());
    }

    #[test]
    fn stale_parameter_is_retired_past_protection_window() {
        let mut genome = ParameterGenome::default_genome();
        spawn_parameter(&mut genome, "evolution.experimental_x", 0.5, 0.0, 1.0, 2);
        genome.generation = 3;
        update_contrib_ema(&mut genome, "evolution.experimental_x", 0.0, 0.5);
        retire_stale_parameters(&mut genome, 1e-3);
        assert!(!genome.params["evolution.experimental_x"].active);
    }
}
