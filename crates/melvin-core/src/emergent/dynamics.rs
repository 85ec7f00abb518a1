use super::state::{EdgeStateMap, EmergentEdgeState, EnergyBudget};
use crate::genome::ParameterGenome;
use crate::graph::{GraphStore, RelType};

/// Need-vs-cost emergent dynamics engine. Owns no graph data
/// itself — it mutates node `activation` and edge weights/strength
/// in-place on a borrowed [`GraphStore`], and keeps its own per-edge side
/// table plus the energy budget.
pub struct EmergentDynamics {
    pub edge_state: EdgeStateMap,
    pub energy: EnergyBudget,
}

impl EmergentDynamics {
    pub fn new(genome: &ParameterGenome) -> Self {
        Self {
            edge_state: EdgeStateMap::new(),
            energy: EnergyBudget::new(genome),
        }
    }

    fn state_for(&mut self, edge_id: u64, genome: &ParameterGenome) -> &mut EmergentEdgeState {
        self.edge_state
            .entry(edge_id)
            .or_insert_with(|| EmergentEdgeState::new(genome))
    }

    /// Step 1: activation input. Requested nodes get `activation +=
    /// input_strength`; the caller pays a fraction of the energy budget.
    pub fn activate(&mut self, store: &mut GraphStore, nodes: &[u64], input_strength: f32, genome: &ParameterGenome) {
        let per_node_cost = genome.get("emergent.initial_energy_consumption") * input_strength.max(0.0);
        for &id in nodes {
            if !self.energy.try_consume(per_node_cost) {
                break;
            }
            if let Some(node) = store.node_mut(id) {
                node.activation = (node.activation + input_strength).clamp(0.0, 1.0);
            }
        }
    }

    /// Hebbian growth: co-activated node pairs get a weak associative edge
    /// if one doesn't already exist.
    pub fn hebbian_grow(
        &mut self,
        store: &mut GraphStore,
        active_nodes: &[u64],
        now_ns: u64,
        genome: &ParameterGenome,
    ) {
        if self.energy.refuse_new_creation(genome) {
            return;
        }
        let s0 = genome.get("emergent.initial_strength");
        for (i, &a) in active_nodes.iter().enumerate() {
            for &b in &active_nodes[i + 1..] {
                if store.find_edge(a, b, RelType::Assoc).is_some() {
                    if let Some(eid) = store.find_edge(a, b, RelType::Assoc).map(|e| e.id) {
                        let state = self.state_for(eid, genome);
                        state.coactivations += 1;
                        state.ticks_since_use = 0;
                    }
                    continue;
                }
                if let Ok(edge_id) = store.upsert_edge(a, b, RelType::Assoc, s0, now_ns) {
                    self.state_for(edge_id, genome);
                }
            }
        }
    }

    /// Step 2: activation spread along outgoing edges where `need > cost`.
    pub fn spread(&mut self, store: &mut GraphStore, genome: &ParameterGenome) {
        let spread_factor = genome.get("emergent.spread_factor");
        let eps = genome.get("emergent.activation_epsilon");
        let decay_ticks = genome.get("emergent.need_decay_ticks");

        let active: Vec<u64> = store
            .nodes_iter()
            .filter(|n| n.activation > eps)
            .map(|n| n.id)
            .collect();

        for src in active {
            let src_activation = store.node(src).map(|n| n.activation).unwrap_or(0.0);
            for (edge_id, dst, _rel) in store.adjacency_out(src) {
                let (need, cost, strength) = {
                    let state = self.state_for(edge_id, genome);
                    let need = 0.4 * state.info_value
                        + 0.3 * (state.coactivations as f32 / 100.0).min(1.0)
                        + 0.3 * (-(state.ticks_since_use as f32) / decay_ticks).exp();
                    state.need_signal = need;
                    (need, state.cost, state.strength)
                };
                if need <= cost {
                    continue;
                }
                let energy_consumption = self.edge_state[&edge_id].energy_consumption;
                if !self.energy.try_consume(energy_consumption) {
                    continue;
                }
                let transmitted = src_activation * strength * spread_factor * (need - cost);
                if let Some(node) = store.node_mut(dst) {
                    node.activation = (node.activation + transmitted).clamp(0.0, 1.0);
                }
                self.state_for(edge_id, genome).ticks_since_use = 0;
            }
        }
    }

    /// Step 3: decay activation and age out unused edges.
    pub fn decay(&mut self, store: &mut GraphStore, genome: &ParameterGenome) {
        let decay_rate = genome.get("emergent.decay_rate");
        let unused_age = genome.get("emergent.unused_age_ticks") as u32;

        for id in 0..store.node_count() as u64 {
            if let Some(node) = store.node_mut(id) {
                node.activation = (node.activation * decay_rate).clamp(0.0, 1.0);
            }
        }
        for (edge_id, state) in self.edge_state.iter_mut() {
            state.ticks_since_use += 1;
            if state.ticks_since_use > unused_age {
                state.strength *= 0.99;
            }
            let _ = edge_id;
        }
    }

    /// Step 4: strengthen or weaken edges based on `need - cost`.
    pub fn update(&mut self, genome: &ParameterGenome) {
        let formation_rate = genome.get("emergent.formation_rate");
        let elimination_rate = genome.get("emergent.elimination_rate");
        for state in self.edge_state.values_mut() {
            let change = state.need_signal - state.cost;
            if change > 0.0 {
                state.strength = (state.strength + formation_rate * change).min(1.0);
                state.info_value += 0.001 * change;
                if state.need_signal > 2.0 * state.cost {
                    state.cost *= 0.999;
                }
            } else if change < 0.0 {
                state.strength = (state.strength - elimination_rate * change.abs()).max(0.0);
                state.cost *= 1.001;
            }
        }
    }

    /// Step 5: prune connections that no longer pay for themselves.
    pub fn prune(&mut self, store: &mut GraphStore, genome: &ParameterGenome) {
        let prune_threshold = genome.get("emergent.prune_threshold");
        let to_drop: Vec<u64> = self
            .edge_state
            .iter()
            .filter(|(_, s)| {
                s.strength < prune_threshold || (s.cost > 1.5 * s.need_signal && s.strength < 0.1)
            })
            .map(|(&id, _)| id)
            .collect();
        for edge_id in to_drop {
            store.remove_edge(edge_id);
            self.edge_state.remove(&edge_id);
        }
    }

    /// Step 6: energy replenishment.
    pub fn replenish(&mut self, dt: f32) {
        self.energy.recover(dt);
    }

    /// Run one full tick of emergent dynamics over the currently active
    /// nodes.
    pub fn tick(&mut self, store: &mut GraphStore, now_ns: u64, dt: f32, genome: &ParameterGenome) {
        let eps = genome.get("emergent.activation_epsilon");
        let active: Vec<u64> = store
            .nodes_iter()
            .filter(|n| n.activation > eps)
            .map(|n| n.id)
            .collect();
        self.hebbian_grow(store, &active, now_ns, genome);
        self.spread(store, genome);
        self.decay(store, genome);
        self.update(genome);
        self.prune(store, genome);
        self.replenish(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;

    #[test]
    fn activation_never_exceeds_one() {
        let mut store = GraphStore::new();
        let genome = ParameterGenome::default_genome();
        let mut dyn_ = EmergentDynamics::new(&genome);
        let a = store.get_or_create_node("a", NodeKind::Concept, 0);
        dyn_.activate(&mut store, &[a], 5.0, &genome);
        assert!(store.node(a).unwrap().activation <= 1.0);
    }

    #[test]
    fn hebbian_growth_creates_weak_assoc_edge() {
        let mut store = GraphStore::new();
        let genome = ParameterGenome::default_genome();
        let mut dyn_ = EmergentDynamics::new(&genome);
        let a = store.get_or_create_node("a", NodeKind::Concept, 0);
        let b = store.get_or_create_node("b", NodeKind::Concept, 0);
        dyn_.hebbian_grow(&mut store, &[a, b], 0, &genome);
        let edge = store.find_edge(a, b, RelType::Assoc);
        assert!(edge.is_some());
        assert!((edge.unwrap().w_core - genome.get("emergent.initial_strength")).abs() < 1e-6);
    }

    #[test]
    fn prune_removes_weak_edges() {
        let mut store = GraphStore::new();
        let genome = ParameterGenome::default_genome();
        let mut dyn_ = EmergentDynamics::new(&genome);
        let a = store.get_or_create_node("a", NodeKind::Concept, 0);
        let b = store.get_or_create_node("b", NodeKind::Concept, 0);
        let eid = store.upsert_edge(a, b, RelType::Assoc, 0.01, 0).unwrap();
        dyn_.edge_state.insert(eid, crate::emergent::state::EmergentEdgeState::new(&genome));
        dyn_.edge_state.get_mut(&eid).unwrap().strength = 0.0;
        dyn_.prune(&mut store, &genome);
        assert!(store.find_edge(a, b, RelType::Assoc).is_none());
    }

    #[test]
    fn energy_budget_blocks_spend_past_cap() {
        let genome = ParameterGenome::default_genome();
        let mut energy = EnergyBudget::new(&genome);
        energy.budget = 1.0;
        assert!(energy.try_consume(0.6));
        assert!(energy.try_consume(0.3));
        assert!(!energy.try_consume(0.2));
    }
}
