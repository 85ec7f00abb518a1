//! Deterministic cross-modal embedding: hashing a modality
//! key with a per-modality salt into a low-discrepancy projection onto
//! the unit 256-sphere. Same key + salt always yields the same vector,
//! which is the reproducibility contract the binding table depends on.

use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

pub const EMBEDDING_DIM: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modality {
    Text,
    Vision,
    Audio,
    Motor,
}

impl Modality {
    /// Fixed per-modality salt folded into the hash seed.
    fn salt(self) -> u64 {
        match self {
            Modality::Text => 0x7465_7874_0000_0001,
            Modality::Vision => 0x7669_7369_6f6e_0002,
            Modality::Audio => 0x6175_6469_6f00_0003,
            Modality::Motor => 0x6d6f_746f_7200_0004,
        }
    }
}

/// FNV-1a over the modality salt, `key`, and an extra caller-supplied
/// salt, used only to seed the projection RNG — never for general hashing.
fn seed(modality: Modality, key: &str, extra_salt: u64) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET ^ modality.salt() ^ extra_salt;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

/// The shared 256-D embedding for `(modality, key)`, L2-normalized.
pub struct CrossModalEmbedder {
    salt: u64,
}

impl CrossModalEmbedder {
    pub fn new(salt: u64) -> Self {
        Self { salt }
    }

    pub fn embed(&self, modality: Modality, key: &str) -> Vec<f32> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed(modality, key, self.salt));
        let mut v: Vec<f32> = (0..EMBEDDING_DIM)
            .map(|_| StandardNormal.sample(&mut rng))
            .collect();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-9);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Default for CrossModalEmbedder {
    fn default() -> Self {
        Self::new(0)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na <= 1e-9 || nb <= 1e-9 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_and_salt_produce_the_same_vector() {
        let embedder = CrossModalEmbedder::new(42);
        let a = embedder.embed(Modality::Vision, "red_apple");
        let b = embedder.embed(Modality::Vision, "red_apple");
        assert_eq!(a, b);
    }

    #[test]
    fn embedding_is_unit_length() {
        let embedder = CrossModalEmbedder::default();
        let v = embedder.embed(Modality::Audio, "bark");
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn different_modalities_diverge_for_the_same_key() {
        let embedder = CrossModalEmbedder::default();
        let text = embedder.embed(Modality::Text, "apple");
        let vision = embedder.embed(Modality::Vision, "apple");
        assert!(cosine_similarity(&text, &vision) < 0.9);
    }
}
