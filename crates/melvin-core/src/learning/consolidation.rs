//! Decay and consolidation: idle-schedule edge decay, replay
//! of `Thought` nodes to track memory health, and near-duplicate node
//! clustering.

use crate::graph::node::{Node, NodeKind};
use crate::graph::GraphStore;

#[derive(Debug, Clone, Default)]
pub struct ReplayStats {
    pub attempted: u32,
    pub successful: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ConsolidationReport {
    pub decayed_edges: u32,
    pub replay: ReplayStats,
    pub merged_nodes: u32,
}

/// Decay `w_core` on edges untouched for longer than `window_ns`
/// (`w <- w*(1-eta)`).
pub fn decay_edges(store: &mut GraphStore, window_ns: u64, eta: f32, now_ns: u64) -> u32 {
    let mut decayed = 0;
    for edge_id in store.live_edge_ids() {
        let stale = store
            .edge(edge_id)
            .map(|e| now_ns.saturating_sub(e.last_access_ns) > window_ns)
            .unwrap_or(false);
        if stale {
            if let Some(edge) = store.edge_mut(edge_id) {
                edge.w_core *= 1.0 - eta;
                decayed += 1;
            }
        }
    }
    decayed
}

/// Replay a sample of `Thought` nodes: a replay succeeds if every hop in
/// its recorded path still resolves to a live edge end-to-end.
pub fn replay_thoughts(store: &GraphStore, sample: &[u64]) -> ReplayStats {
    let mut stats = ReplayStats::default();
    for &node_id in sample {
        let Some(path) = store.thought_path(node_id) else {
            continue;
        };
        stats.attempted += 1;
        let intact = path.windows(2).all(|pair| {
            let (a, b) = (pair[0], pair[1]);
            store
                .adjacency_out(a)
                .iter()
                .any(|&(_, dst, _)| dst == b)
        });
        if intact {
            stats.successful += 1;
        }
    }
    stats
}

/// Cluster near-duplicate nodes: identical normalized text, or one's
/// normalized text contained in the other's. Incoming edges of the
/// duplicate are redirected to the primary (lower id) and the duplicate
/// is dropped from traversal.
pub fn cluster_near_duplicates(store: &mut GraphStore, now_ns: u64) -> u32 {
    let candidates: Vec<(u64, String, NodeKind)> = store
        .nodes_iter()
        .filter(|n| n.kind != NodeKind::Thought)
        .map(|n| (n.id, Node::normalize(&n.text), n.kind))
        .collect();

    let mut merged_into: std::collections::HashMap<u64, u64> = std::collections::HashMap::new();
    let mut merged = 0u32;

    for i in 0..candidates.len() {
        let (id_a, ref text_a, kind_a) = candidates[i];
        if merged_into.contains_key(&id_a) {
            continue;
        }
        for (id_b, text_b, kind_b) in &candidates[i + 1..] {
            if merged_into.contains_key(id_b) || kind_a != *kind_b {
                continue;
            }
            let duplicate = text_a == text_b || text_a.contains(text_b.as_str()) || text_b.contains(text_a.as_str());
            if !duplicate {
                continue;
            }
            let (primary, secondary) = if id_a < *id_b { (id_a, *id_b) } else { (*id_b, id_a) };
            if store.redirect_incoming(secondary, primary, now_ns).is_ok() {
                merged_into.insert(secondary, primary);
                merged += 1;
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RelType;

    #[test]
    fn decay_only_affects_stale_edges() {
        let mut store = GraphStore::new();
        let a = store.get_or_create_node("a", NodeKind::Concept, 0);
        let b = store.get_or_create_node("b", NodeKind::Concept, 0);
        let edge_id = store.upsert_edge(a, b, RelType::Exact, 1.0, 0).unwrap();
        let decayed = decay_edges(&mut store, 100, 0.5, 1_000);
        assert_eq!(decayed, 1);
        assert!(store.edge(edge_id).unwrap().w_core < 1.0);
    }

    #[test]
    fn near_duplicate_nodes_get_merged() {
        let mut store = GraphStore::new();
        let a = store.get_or_create_node("well-known cat", NodeKind::Concept, 0);
        let b = store.get_or_create_node("cat", NodeKind::Concept, 0);
        let c = store.get_or_create_node("dog", NodeKind::Concept, 0);
        store.upsert_edge(c, a, RelType::Exact, 1.0, 0).unwrap();
        let merged = cluster_near_duplicates(&mut store, 0);
        assert_eq!(merged, 1);
        assert!(store.find_edge(c, b, RelType::Exact).is_some() || store.find_edge(c, a, RelType::Exact).is_some());
    }
}
