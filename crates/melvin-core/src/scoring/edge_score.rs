use super::clamp_factor;
use crate::genome::ParameterGenome;
use crate::graph::{Edge, RelType};

fn rel_prior(rel: RelType, genome: &ParameterGenome) -> f32 {
    let key = match rel {
        RelType::Exact => "scoring.rel_prior.exact",
        RelType::Temporal => "scoring.rel_prior.temporal",
        RelType::Leap => "scoring.rel_prior.leap",
        RelType::Generalization => "scoring.rel_prior.generalization",
        _ => "scoring.rel_prior.default",
    };
    genome.get(key)
}

/// Score a single edge at time `now_ns`. `deg_src`/`deg_dst`
/// are the total incident degrees of the edge's endpoints.
pub fn edge_score(edge: &Edge, deg_src: usize, deg_dst: usize, now_ns: u64, genome: &ParameterGenome) -> f32 {
    let lambda = genome.get("scoring.lambda_mix");
    let epsilon = genome.get("scoring.epsilon_mix");
    let w_mix = edge.w_mix(lambda).max(epsilon);

    let tau = genome.get("scoring.recency_tau") as f64;
    let dt_s = (now_ns.saturating_sub(edge.last_access_ns)) as f64 / 1e9;
    let recency = (-dt_s / tau).exp() as f32;

    let pseudo_count = genome.get("scoring.pseudo_count");
    let trust = ((edge.count as f32 + pseudo_count) / 10.0).min(1.0);

    let prior = rel_prior(edge.rel, genome);

    let delta = genome.get("scoring.degree_delta");
    let degree_norm = 1.0 / (((deg_src as f32) * (deg_dst as f32)).sqrt() + delta);

    let beta = genome.get("scoring.contradiction_beta");
    let contradiction_penalty = (-beta * edge.contradiction).exp();

    clamp_factor(w_mix)
        * clamp_factor(recency)
        * clamp_factor(trust)
        * clamp_factor(prior)
        * clamp_factor(degree_norm)
        * clamp_factor(contradiction_penalty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;

    #[test]
    fn edge_score_is_finite_for_fresh_high_count_edge() {
        let genome = ParameterGenome::default_genome();
        let mut edge = Edge::new(0, 1, 2, RelType::Exact, 0.8, 1_000_000_000);
        edge.count = 20;
        let score = edge_score(&edge, 3, 4, 1_000_000_000, &genome);
        assert!(score.is_finite());
        assert!(score > 0.0);
    }

    #[test]
    fn edge_score_decays_with_staleness() {
        let genome = ParameterGenome::default_genome();
        let edge = Edge::new(0, 1, 2, RelType::Exact, 0.8, 0);
        let fresh = edge_score(&edge, 2, 2, 0, &genome);
        let stale = edge_score(&edge, 2, 2, 10_000_000_000_000, &genome);
        assert!(stale < fresh);
    }

    #[test]
    fn edge_score_never_nan_or_inf_on_zero_degree() {
        let genome = ParameterGenome::default_genome();
        let edge = Edge::new(0, 1, 2, RelType::Assoc, 0.0, 0);
        let score = edge_score(&edge, 0, 0, 0, &genome);
        assert!(score.is_finite());
    }
}
