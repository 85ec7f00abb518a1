//! Query tokenization and start-node extraction.

use crate::graph::{GraphStore, node::Node};

pub fn tokenize(query: &str) -> Vec<String> {
    Node::normalize(query)
        .split_whitespace()
        .map(|s| s.to_string())
        .collect()
}

/// Map query tokens to a ranked candidate start set of at most
/// `beam_width` nodes: ring-buffer recency first, then a BM25-mini
/// fallback scored by token rarity (inverse document frequency) times
/// node popularity (`freq`).
pub fn start_nodes(store: &GraphStore, tokens: &[String], beam_width: usize) -> Vec<u64> {
    use std::collections::HashMap;

    let mut scores: HashMap<u64, f32> = HashMap::new();
    let total_nodes = store.node_count().max(1) as f32;

    for token in tokens {
        for id in store.token_ring(token) {
            *scores.entry(id).or_insert(0.0) += 2.0; // recency bonus
        }

        let matching: Vec<&Node> = store
            .nodes_iter()
            .filter(|n| n.text.split_whitespace().any(|w| w == token))
            .collect();
        if matching.is_empty() {
            continue;
        }
        let df = matching.len() as f32;
        let idf = (total_nodes / (1.0 + df)).ln().max(0.0);
        for node in matching {
            *scores.entry(node.id).or_insert(0.0) += idf * (1.0 + (node.freq as f32).ln());
        }
    }

    let mut ranked: Vec<(u64, f32)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(beam_width.max(1));
    ranked.into_iter().map(|(id, _)| id).collect()
}
