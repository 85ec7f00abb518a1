//! Bidirectional search variant used when a specific target node is named
//!.

use std::collections::{BinaryHeap, HashMap};

use super::path::PathCandidate;
use crate::genome::ParameterGenome;
use crate::graph::GraphStore;
use crate::scoring::edge_score;

#[derive(Clone)]
struct Frontier {
    /// node -> best path reaching it from this side, with its priority.
    best: HashMap<u64, PathCandidate>,
    queue: BinaryHeap<QueueEntry>,
}

#[derive(Clone)]
struct QueueEntry {
    priority: f32,
    node: u64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}
impl Eq for QueueEntry {}
impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority
            .partial_cmp(&other.priority)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

impl Frontier {
    fn new(start: u64) -> Self {
        let mut best = HashMap::new();
        best.insert(start, PathCandidate::start(start));
        let mut queue = BinaryHeap::new();
        queue.push(QueueEntry {
            priority: 1.0,
            node: start,
        });
        Self { best, queue }
    }

    /// Expand the best entry one hop along `forward` (out-edges) or
    /// `!forward` (in-edges, walked as reversed out-edges of the target
    /// side), using edges whose adjacency comes from `store`.
    fn step(&mut self, store: &GraphStore, genome: &ParameterGenome, now_ns: u64, forward: bool) {
        let Some(QueueEntry { node, .. }) = self.queue.pop() else {
            return;
        };
        let path = match self.best.get(&node) {
            Some(p) => p.clone(),
            None => return,
        };

        let neighbors: Vec<(u64, u64, crate::graph::RelType)> = if forward {
            store.adjacency_out(node)
        } else {
            store
                .adjacency_in(node)
                .into_iter()
                .filter_map(|eid| store.edge(eid).map(|e| (eid, e.src, e.rel)))
                .collect()
        };

        for (edge_id, other, rel) in neighbors {
            if path.contains(other) {
                continue;
            }
            let edge = match store.edge(edge_id) {
                Some(e) => e,
                None => continue,
            };
            let (deg_a, deg_b) = (store.degree(node), store.degree(other));
            let es = edge_score(edge, deg_a, deg_b, now_ns, genome);
            let next = path.extended(edge_id, other, rel, es, edge.last_access_ns, edge.contradiction);
            let priority: f32 = next.edge_scores.iter().product();
            let better = self
                .best
                .get(&other)
                .map(|existing| priority > existing.edge_scores.iter().product())
                .unwrap_or(true);
            if better {
                self.best.insert(other, next);
                self.queue.push(QueueEntry { priority, node: other });
            }
        }
    }
}

/// Grow two frontiers from `start` and `target`, alternating expansion,
/// until they meet at a common node or `max_hops` (per side) elapses.
/// Returns the concatenated meeting path, if any.
pub fn bidirectional_search(
    store: &GraphStore,
    genome: &ParameterGenome,
    start: u64,
    target: u64,
    max_hops: usize,
    now_ns: u64,
) -> Option<PathCandidate> {
    if start == target {
        return Some(PathCandidate::start(start));
    }

    let mut forward = Frontier::new(start);
    let mut backward = Frontier::new(target);

    for _ in 0..max_hops {
        forward.step(store, genome, now_ns, true);
        if let Some(meet) = meeting_node(&forward, &backward) {
            return Some(join(&forward, &backward, meet));
        }
        backward.step(store, genome, now_ns, false);
        if let Some(meet) = meeting_node(&forward, &backward) {
            return Some(join(&forward, &backward, meet));
        }
    }
    None
}

fn meeting_node(forward: &Frontier, backward: &Frontier) -> Option<u64> {
    forward
        .best
        .keys()
        .find(|n| backward.best.contains_key(*n))
        .copied()
}

fn join(forward: &Frontier, backward: &Frontier, meet: u64) -> PathCandidate {
    let fwd_path = forward.best.get(&meet).expect("meeting node present");
    let back_path = backward.best.get(&meet).expect("meeting node present");

    let mut nodes = fwd_path.nodes.clone();
    let mut edge_ids = fwd_path.edge_ids.clone();
    let mut rels = fwd_path.rels.clone();
    let mut edge_scores = fwd_path.edge_scores.clone();

    // Append the backward half in reverse, skipping the shared meeting node.
    for i in (0..back_path.nodes.len() - 1).rev() {
        nodes.push(back_path.nodes[i]);
        edge_ids.push(back_path.edge_ids[i]);
        rels.push(back_path.rels[i]);
        edge_scores.push(back_path.edge_scores[i]);
    }

    let max_contradiction = fwd_path.max_contradiction.max(back_path.max_contradiction);
    PathCandidate {
        nodes,
        edge_ids,
        rels,
        edge_scores,
        score: 0.0,
        last_access_ns: fwd_path.last_access_ns.max(back_path.last_access_ns),
        max_contradiction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeKind, RelType};

    #[test]
    fn bidirectional_search_finds_meeting_path() {
        let mut store = GraphStore::new();
        let genome = ParameterGenome::default_genome();
        let a = store.get_or_create_node("cats", NodeKind::Concept, 0);
        let b = store.get_or_create_node("mammals", NodeKind::Concept, 0);
        let c = store.get_or_create_node("water", NodeKind::Concept, 0);
        store.upsert_edge(a, b, RelType::Generalization, 0.9, 0).unwrap();
        store.upsert_edge(b, c, RelType::Consumes, 0.9, 0).unwrap();

        let found = bidirectional_search(&store, &genome, a, c, 4, 0);
        assert!(found.is_some());
    }
}
