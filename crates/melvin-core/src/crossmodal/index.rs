//! Per-modality vector index supporting `top_k_cosine`.

use super::embed::cosine_similarity;
use super::embed::Modality;

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    vector: Vec<f32>,
}

/// One modality's flat index. A linear scan is adequate at the scale
/// this engine targets (bindings capped at 64 per concept); swap for an
/// ANN index if that changes.
#[derive(Debug, Clone, Default)]
pub struct ModalityIndex {
    modality: Option<Modality>,
    entries: Vec<Entry>,
}

impl ModalityIndex {
    pub fn new(modality: Modality) -> Self {
        Self {
            modality: Some(modality),
            entries: Vec::new(),
        }
    }

    pub fn upsert(&mut self, key: impl Into<String>, vector: Vec<f32>) {
        let key = key.into();
        if let Some(e) = self.entries.iter_mut().find(|e| e.key == key) {
            e.vector = vector;
        } else {
            self.entries.push(Entry { key, vector });
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|e| e.key != key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Top-`k` entries by cosine similarity to `query`, descending.
pub fn top_k_cosine(index: &ModalityIndex, query: &[f32], k: usize) -> Vec<(String, f32)> {
    let mut scored: Vec<(String, f32)> = index
        .entries
        .iter()
        .map(|e| (e.key.clone(), cosine_similarity(query, &e.vector)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crossmodal::embed::CrossModalEmbedder;

    #[test]
    fn top_k_cosine_ranks_the_closest_match_first() {
        let embedder = CrossModalEmbedder::default();
        let mut index = ModalityIndex::new(Modality::Vision);
        index.upsert("apple", embedder.embed(Modality::Vision, "apple"));
        index.upsert("banana", embedder.embed(Modality::Vision, "banana"));
        let query = embedder.embed(Modality::Vision, "apple");
        let top = top_k_cosine(&index, &query, 1);
        assert_eq!(top[0].0, "apple");
        assert!(top[0].1 > 0.99);
    }
}
