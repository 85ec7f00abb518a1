//! Context/temporal grounding gate: multiplicative gating
//! `score · (1 + α·context + β·temporal)` followed by a temperature
//! softmax, plus per-tick temporal decay.

use crate::genome::ParameterGenome;

/// Gate raw cosine scores by context relevance and temporal consistency,
/// then normalize with a temperature softmax.
pub fn ground(raw_scores: &[f32], context: f32, temporal: &[f32], genome: &ParameterGenome) -> Vec<f32> {
    let alpha = genome.get("crossmodal.alpha_context");
    let beta = genome.get("crossmodal.beta_temporal");
    let temperature = genome.get("crossmodal.softmax_temperature").max(1e-3);

    let gated: Vec<f32> = raw_scores
        .iter()
        .zip(temporal.iter().chain(std::iter::repeat(&0.0)))
        .map(|(&score, &temporal_term)| score * (1.0 + alpha * context + beta * temporal_term))
        .collect();

    softmax(&gated, temperature)
}

fn softmax(values: &[f32], temperature: f32) -> Vec<f32> {
    if values.is_empty() {
        return Vec::new();
    }
    let max = values.iter().cloned().fold(f32::MIN, f32::max);
    let exps: Vec<f32> = values.iter().map(|&v| ((v - max) / temperature).exp()).collect();
    let sum: f32 = exps.iter().sum::<f32>().max(1e-9);
    exps.into_iter().map(|e| e / sum).collect()
}

/// Decay temporal-consistency scores by `γ` per tick.
pub fn decay_temporal(values: &mut [f32], genome: &ParameterGenome) {
    let gamma = genome.get("crossmodal.temporal_decay_gamma");
    for v in values.iter_mut() {
        *v *= gamma;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_sums_to_one() {
        let genome = ParameterGenome::default_genome();
        let scores = [0.9, 0.4, 0.1];
        let temporal = [0.5, 0.2, 0.0];
        let probs = ground(&scores, 1.0, &temporal, &genome);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn higher_context_and_temporal_boost_relative_rank() {
        let genome = ParameterGenome::default_genome();
        let scores = [0.5, 0.5];
        let low_temporal = [0.0, 0.0];
        let high_temporal = [1.0, 0.0];
        let flat = ground(&scores, 0.0, &low_temporal, &genome);
        let boosted = ground(&scores, 0.0, &high_temporal, &genome);
        assert!(boosted[0] > flat[0]);
    }

    #[test]
    fn temporal_decay_shrinks_values_by_gamma() {
        let genome = ParameterGenome::default_genome();
        let mut values = [1.0, 0.5];
        decay_temporal(&mut values, &genome);
        let gamma = genome.get("crossmodal.temporal_decay_gamma");
        assert!((values[0] - gamma).abs() < 1e-6);
    }
}
