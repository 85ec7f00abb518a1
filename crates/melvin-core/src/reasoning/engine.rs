use std::time::Instant;

use super::beam::{beam_search, BeamOptions};
use super::bidirectional::bidirectional_search;
use super::gate::{
    decide_gate, detect_intent, dynamic_threshold, hysteresis_gate, safety_check,
    threshold_for_intent, GateState,
};
use super::lookup::{start_nodes, tokenize};
use super::path::{PathCandidate, ReasoningPath};
use super::result::{OutputType, ReasoningResult};
use crate::genome::ParameterGenome;
use crate::graph::GraphStore;
use crate::scoring::{confidence, ExtraMetrics};

/// Shannon entropy (natural log) of the softmax distribution over the
/// kept beam's raw path scores.
fn softmax_entropy(scores: &[f32]) -> f32 {
    if scores.is_empty() {
        return -1.0; // spec default sentinel when no candidates exist
    }
    let max = scores.iter().cloned().fold(f32::MIN, f32::max);
    let exps: Vec<f32> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum::<f32>().max(1e-9);
    let probs: Vec<f32> = exps.iter().map(|&e| e / sum).collect();
    -probs
        .iter()
        .filter(|&&p| p > 1e-9)
        .map(|&p| p * p.ln())
        .sum::<f32>()
}

/// Answer a free-text query by beam search, or by bidirectional
/// search when `target` names a specific node.
#[allow(clippy::too_many_arguments)]
pub fn answer_query(
    store: &GraphStore,
    genome: &ParameterGenome,
    query: &str,
    target: Option<u64>,
    now_ns: u64,
    deadline: Option<Instant>,
    conf_history: &[f32],
    gate_state: &mut GateState,
) -> ReasoningResult {
    let tokens = tokenize(query);
    let intent = detect_intent(&tokens);
    let opts = BeamOptions::from_genome(genome);
    let starts = start_nodes(store, &tokens, opts.beam_width);

    if starts.is_empty() {
        return ReasoningResult::default();
    }

    let (mut candidates, timed_out) = match target {
        Some(target_id) => {
            let found: Vec<PathCandidate> = starts
                .iter()
                .filter_map(|&s| bidirectional_search(store, genome, s, target_id, opts.max_hops, now_ns))
                .collect();
            (found, false)
        }
        None => beam_search(store, genome, &starts, &opts, now_ns, deadline),
    };

    if candidates.is_empty() {
        let mut result = ReasoningResult::default();
        result.timed_out = timed_out;
        return result;
    }

    // Score confidence for every surviving candidate.
    let mut scored: Vec<(PathCandidate, f32, ExtraMetrics)> = Vec::with_capacity(candidates.len());
    for cand in candidates.drain(..) {
        let mean_log_edge = if cand.edge_scores.is_empty() {
            0.0
        } else {
            cand.edge_scores.iter().map(|&s| s.max(1e-9).ln()).sum::<f32>() / cand.edge_scores.len() as f32
        };
        let (conf, metrics) = confidence(mean_log_edge, cand.hop_count(), 0.0, cand.max_contradiction, genome);
        scored.push((cand, conf, metrics));
    }
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let entropy = softmax_entropy(&scored.iter().map(|(c, _, _)| c.score).collect::<Vec<_>>());
    let top2_margin = if scored.len() >= 2 {
        scored[0].2.conf_logit - scored[1].2.conf_logit
    } else {
        10.0
    };

    let (best_path, best_conf, mut best_metrics) = scored.into_iter().next().expect("non-empty");
    best_metrics.entropy = entropy;
    best_metrics.top2_margin = top2_margin;

    let t_emit_intent = threshold_for_intent(intent, genome);
    let t_dyn = dynamic_threshold(conf_history);
    let t_emit = t_emit_intent.max(t_dyn);

    let raw_gate = decide_gate(best_conf, entropy, top2_margin, t_emit, genome);
    let mut gate = hysteresis_gate(raw_gate, gate_state, genome);
    let safe = safety_check(best_metrics.s_path, best_metrics.max_contradiction, genome);
    if gate == super::gate::Gate::Emit && !safe {
        gate = super::gate::Gate::Ask;
    }

    let answer_text = store
        .node(best_path.terminal())
        .map(|n| n.text.clone())
        .unwrap_or_default();

    let used_paths = vec![ReasoningPath {
        node_ids: best_path.nodes.clone(),
        edge_ids: best_path.edge_ids.clone(),
        confidence: best_conf,
    }];

    ReasoningResult {
        output_type: if matches!(gate, super::gate::Gate::Emit) {
            OutputType::Text
        } else {
            OutputType::None
        },
        text: answer_text,
        used_paths,
        confidence: best_conf,
        gate,
        timed_out,
        extra: best_metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::gate::Gate;
    use crate::graph::{GraphStore, NodeKind, RelType};

    #[test]
    fn learn_one_fact_then_answer() {
        let mut store = GraphStore::new();
        let genome = ParameterGenome::default_genome();
        let cats = store.get_or_create_node("cats", NodeKind::Concept, 0);
        let mammals = store.get_or_create_node("mammals", NodeKind::Concept, 0);
        store
            .upsert_edge(cats, mammals, RelType::Generalization, 0.9, 0)
            .unwrap();

        let mut gate_state = GateState::default();
        let result = answer_query(
            &store,
            &genome,
            "what are cats",
            None,
            1_000_000_000,
            None,
            &[],
            &mut gate_state,
        );
        assert!(result.text.contains("mammals"));
    }

    #[test]
    fn contradiction_suppresses_emit() {
        let mut store = GraphStore::new();
        let genome = ParameterGenome::default_genome();
        let cats = store.get_or_create_node("cats", NodeKind::Concept, 0);
        let reptiles = store.get_or_create_node("reptiles", NodeKind::Concept, 0);
        let edge_id = store
            .upsert_edge(cats, reptiles, RelType::Generalization, 0.9, 0)
            .unwrap();
        store.edge_mut(edge_id).unwrap().contradiction = 0.9;

        let mut gate_state = GateState::default();
        let result = answer_query(
            &store,
            &genome,
            "cats are reptiles",
            None,
            1_000_000_000,
            None,
            &[],
            &mut gate_state,
        );
        assert_ne!(result.gate, Gate::Emit);
    }
}
