//! Bidirectional concept <-> (modality, key, weight) bindings table,
//! grounded on `cm_binding.cpp`'s `CMBindings`.

use std::collections::HashMap;

use super::embed::Modality;

const MAX_BINDINGS_PER_CONCEPT: usize = 64;

#[derive(Debug, Clone)]
pub struct Binding {
    pub concept_id: u64,
    pub modality: Modality,
    pub key: String,
    pub weight: f32,
    pub source: String,
}

/// Maps concept ids to modality bindings and back, capping each
/// concept's binding set to the top-weighted entries.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    by_concept: HashMap<u64, Vec<Binding>>,
    by_key: HashMap<String, Vec<Binding>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, binding: Binding) {
        let vc = self.by_concept.entry(binding.concept_id).or_default();
        if let Some(existing) = vc
            .iter_mut()
            .find(|b| b.key == binding.key && b.modality == binding.modality)
        {
            existing.weight = binding.weight;
            existing.source = binding.source.clone();
        } else {
            vc.push(binding.clone());
        }
        if vc.len() > MAX_BINDINGS_PER_CONCEPT {
            vc.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(std::cmp::Ordering::Equal));
            vc.truncate(MAX_BINDINGS_PER_CONCEPT);
        }

        let vk = self.by_key.entry(binding.key.clone()).or_default();
        if let Some(existing) = vk
            .iter_mut()
            .find(|b| b.concept_id == binding.concept_id && b.modality == binding.modality)
        {
            existing.weight = binding.weight;
            existing.source = binding.source;
        } else {
            vk.push(binding);
        }
    }

    pub fn for_concept(&self, concept_id: u64) -> &[Binding] {
        self.by_concept.get(&concept_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn for_key(&self, key: &str) -> &[Binding] {
        self.by_key.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn prune_concept(&mut self, concept_id: u64, max_keep: usize) {
        if let Some(vc) = self.by_concept.get_mut(&concept_id) {
            if vc.len() > max_keep {
                vc.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(std::cmp::Ordering::Equal));
                vc.truncate(max_keep);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(concept_id: u64, key: &str, weight: f32) -> Binding {
        Binding {
            concept_id,
            modality: Modality::Vision,
            key: key.to_string(),
            weight,
            source: "test".to_string(),
        }
    }

    #[test]
    fn upsert_updates_weight_rather_than_duplicating() {
        let mut table = BindingTable::new();
        table.upsert(binding(1, "red_apple", 0.5));
        table.upsert(binding(1, "red_apple", 0.9));
        assert_eq!(table.for_concept(1).len(), 1);
        assert!((table.for_concept(1)[0].weight - 0.9).abs() < 1e-6);
    }

    #[test]
    fn for_key_finds_bindings_from_any_concept() {
        let mut table = BindingTable::new();
        table.upsert(binding(1, "shared_key", 0.4));
        table.upsert(binding(2, "shared_key", 0.6));
        assert_eq!(table.for_key("shared_key").len(), 2);
    }

    #[test]
    fn prune_concept_keeps_only_the_highest_weighted() {
        let mut table = BindingTable::new();
        for i in 0..5 {
            table.upsert(binding(1, &format!("k{i}"), i as f32 / 10.0));
        }
        table.prune_concept(1, 2);
        assert_eq!(table.for_concept(1).len(), 2);
        assert!(table.for_concept(1).iter().all(|b| b.weight >= 0.2));
    }
}
