use std::collections::HashMap;

use crate::genome::ParameterGenome;

/// Per-edge emergent-dynamics bookkeeping, keyed by the
/// owning [`crate::graph::GraphStore`] edge id. Kept out of [`crate::graph::Edge`]
/// itself so the graph store's core record stays free of dynamics state
/// other components don't need.
#[derive(Debug, Clone)]
pub struct EmergentEdgeState {
    pub strength: f32,
    pub need_signal: f32,
    pub cost: f32,
    pub coactivations: u32,
    pub ticks_since_use: u32,
    pub info_value: f32,
    pub energy_consumption: f32,
}

impl EmergentEdgeState {
    pub fn new(genome: &ParameterGenome) -> Self {
        Self {
            strength: genome.get("emergent.initial_strength"),
            need_signal: 0.0,
            cost: genome.get("emergent.initial_cost"),
            coactivations: 1,
            ticks_since_use: 0,
            info_value: 0.0,
            energy_consumption: genome.get("emergent.initial_energy_consumption"),
        }
    }
}

/// Per-tick energy ceiling: a hard cap on cumulative
/// `energy_consumption` applied across activation spread and Hebbian
/// growth; node/edge creation is refused once it's nearly spent.
#[derive(Debug, Clone)]
pub struct EnergyBudget {
    pub budget: f32,
    pub current_used: f32,
    pub recovery_rate: f32,
}

impl EnergyBudget {
    pub fn new(genome: &ParameterGenome) -> Self {
        Self {
            budget: genome.get("emergent.energy_budget"),
            current_used: 0.0,
            recovery_rate: genome.get("emergent.recovery_rate"),
        }
    }

    /// Returns `true` and deducts `amount` if the budget allows it,
    /// otherwise leaves state untouched and returns `false` (P3).
    pub fn try_consume(&mut self, amount: f32) -> bool {
        if self.current_used + amount > self.budget {
            return false;
        }
        self.current_used += amount;
        true
    }

    pub fn refuse_new_creation(&self, genome: &ParameterGenome) -> bool {
        let fraction = genome.get("emergent.budget_refuse_fraction");
        self.current_used >= fraction * self.budget
    }

    pub fn recover(&mut self, dt: f32) {
        self.current_used = (self.current_used - self.recovery_rate * dt).max(0.0);
    }
}

pub type EdgeStateMap = HashMap<u64, EmergentEdgeState>;
