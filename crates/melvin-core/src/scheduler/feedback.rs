//! Reinforcement of used paths from per-tick feedback, grounded on
//! `LearningEngine.cpp`'s Hebbian-with-decay edge update.

use crate::graph::GraphStore;
use crate::reasoning::ReasoningPath;

const HEBBIAN_ETA: f32 = 0.01;
const DECAY_LAMBDA: f32 = 1e-4;

/// Internal curiosity plus externally supplied reward for one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Feedback {
    pub reward: f32,
}

impl Feedback {
    /// Curiosity term rewards low confidence (novelty); emission adds a
    /// positive-shaping floor at the emitted confidence, mirroring
    /// `fb.reward = max(fb.reward, rr.confidence)` in the reference loop.
    pub fn collect(confidence: f32, emitted: bool, external_reward: Option<f32>) -> Self {
        let curiosity = 1.0 - confidence;
        let mut reward = 0.3 * curiosity + 0.7 * confidence;
        if emitted {
            reward = reward.max(confidence);
        }
        if let Some(ext) = external_reward {
            reward = 0.5 * reward + 0.5 * ext;
        }
        Self {
            reward: reward.clamp(0.0, 1.0),
        }
    }
}

/// Hebbian-with-decay reinforcement of every edge used by `paths`,
/// proportional to the tick's feedback reward.
pub fn reinforce(store: &mut GraphStore, paths: &[ReasoningPath], feedback: Feedback) -> u32 {
    let mut edges_updated = 0;
    for path in paths {
        for &edge_id in &path.edge_ids {
            if let Some(edge) = store.edge_mut(edge_id) {
                let increment = HEBBIAN_ETA * feedback.reward;
                edge.w_core = ((1.0 - DECAY_LAMBDA) * edge.w_core + increment).clamp(0.0, 1.0);
                edges_updated += 1;
            }
        }
    }
    edges_updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeKind, RelType};

    #[test]
    fn reinforce_raises_weight_proportional_to_reward() {
        let mut store = GraphStore::new();
        let a = store.get_or_create_node("a", NodeKind::Concept, 0);
        let b = store.get_or_create_node("b", NodeKind::Concept, 0);
        let edge_id = store.upsert_edge(a, b, RelType::Exact, 0.2, 0).unwrap();
        let before = store.edge(edge_id).unwrap().w_core;
        let path = ReasoningPath {
            node_ids: vec![a, b],
            edge_ids: vec![edge_id],
            confidence: 0.9,
        };
        let updated = reinforce(&mut store, &[path], Feedback { reward: 1.0 });
        assert_eq!(updated, 1);
        assert!(store.edge(edge_id).unwrap().w_core > before);
    }

    #[test]
    fn collect_shapes_reward_up_to_confidence_when_emitted() {
        let fb = Feedback::collect(0.8, true, None);
        assert!(fb.reward >= 0.8);
    }
}
