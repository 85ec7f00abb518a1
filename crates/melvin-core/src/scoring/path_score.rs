use super::clamp_factor;
use crate::genome::ParameterGenome;

/// Everything needed to score one candidate path. `edge_scores`
/// is the per-edge `edge_score` already computed along the path in order.
pub struct PathScoreInput<'a> {
    pub edge_scores: &'a [f32],
    /// Mean inter-hop time gap in seconds, for temporal continuity.
    pub avg_gap_s: f32,
    /// `min` Jaccard similarity (over node-sets) against already-kept beam
    /// paths; `1.0` when no prior path has been kept (no penalty).
    pub min_jaccard: f32,
    /// Cosine similarity of this path's answer to the recently emitted
    /// answer, feeding the confidence calibration's `β3` term.
    pub sim_to_recent: f32,
    /// Max edge `contradiction` observed along the path.
    pub max_contradiction: f32,
}

/// Diagnostic breakdown of a path's score and confidence terms, mirroring
/// every quantity the reasoning engine and metrics pipeline need to log.
#[derive(Debug, Clone, Default)]
pub struct ExtraMetrics {
    pub entropy: f32,
    pub path_score: f32,
    pub div_pen: f32,
    pub temporal_gap: f32,
    pub avg_deg_norm: f32,
    pub max_contradiction: f32,
    pub rel_prior_sum: f32,
    pub multi_hop_disc: f32,
    pub path_log_e: f32,
    pub path_log10: f32,
    pub s_path: f32,
    pub top2_margin: f32,
    pub conf_b0: f32,
    pub conf_b1_term: f32,
    pub conf_b2_term: f32,
    pub conf_b3_term: f32,
    pub conf_b4_term: f32,
    pub conf_logit: f32,
}

/// Compute `path_score` and the metrics needed downstream.
/// Returns `(path_score, metrics)`; `metrics.conf_logit`/`top2_margin` are
/// left at zero here — those are filled in by [`confidence`] once the
/// competing beam is known.
pub fn path_score(input: &PathScoreInput, genome: &ParameterGenome) -> (f32, ExtraMetrics) {
    let l = input.edge_scores.len().max(1) as f32;

    let sum_log: f32 = input
        .edge_scores
        .iter()
        .map(|&s| clamp_factor(s).ln())
        .sum();
    let mean_log = sum_log / l;
    let geo_mean = clamp_factor(mean_log.exp());

    let t_c = genome.get("scoring.temporal_continuity_t");
    let temporal_continuity = clamp_factor((-input.avg_gap_s / t_c).exp());

    let gamma = genome.get("scoring.multi_hop_gamma");
    let multi_hop_discount = clamp_factor(gamma.powf(l));

    let lambda_div = genome.get("scoring.diversity_lambda");
    let diversity_penalty = clamp_factor((-lambda_div * (1.0 - input.min_jaccard)).exp());

    let score = geo_mean * temporal_continuity * multi_hop_discount * diversity_penalty;

    let metrics = ExtraMetrics {
        path_score: score,
        div_pen: diversity_penalty,
        temporal_gap: input.avg_gap_s,
        max_contradiction: input.max_contradiction,
        multi_hop_disc: multi_hop_discount,
        path_log_e: mean_log,
        path_log10: mean_log / std::f32::consts::LN_10,
        ..Default::default()
    };

    (score, metrics)
}

/// Confidence calibration: log-odds with learned coefficients,
/// squashed through a sigmoid. `mean_log_edge` is `ExtraMetrics.path_log_e`
/// from [`path_score`].
pub fn confidence(
    mean_log_edge: f32,
    path_len_hops: usize,
    sim_to_recent: f32,
    max_contradiction: f32,
    genome: &ParameterGenome,
) -> (f32, ExtraMetrics) {
    let shift = genome.get("scoring.path_log_shift");
    let scale = genome.get("scoring.path_log_scale");
    let s_path = (mean_log_edge + shift) * scale;

    let b0 = genome.get("scoring.conf_beta0");
    let b1 = genome.get("scoring.conf_beta1");
    let b2 = genome.get("scoring.conf_beta2");
    let b3 = genome.get("scoring.conf_beta3");
    let b4 = genome.get("scoring.conf_beta4");

    let b1_term = b1 * s_path;
    let b2_term = b2 * -(path_len_hops as f32);
    let b3_term = b3 * -sim_to_recent;
    let b4_term = b4 * -max_contradiction;
    let logit = b0 + b1_term + b2_term + b3_term + b4_term;
    let confidence = 1.0 / (1.0 + (-logit).exp());

    let metrics = ExtraMetrics {
        s_path,
        conf_b0: b0,
        conf_b1_term: b1_term,
        conf_b2_term: b2_term,
        conf_b3_term: b3_term,
        conf_b4_term: b4_term,
        conf_logit: logit,
        max_contradiction,
        ..Default::default()
    };

    (confidence, metrics)
}
