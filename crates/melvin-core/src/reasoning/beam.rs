use std::collections::HashSet;
use std::time::Instant;

use super::path::PathCandidate;
use crate::genome::ParameterGenome;
use crate::graph::{GraphStore, RelType};
use crate::scoring::{edge_score, path_score, PathScoreInput};

#[derive(Debug, Clone)]
pub struct BeamOptions {
    pub max_hops: usize,
    pub beam_width: usize,
    pub min_edge_weight: f32,
}

impl BeamOptions {
    pub fn from_genome(genome: &ParameterGenome) -> Self {
        Self {
            max_hops: genome.get("reasoning.max_hops") as usize,
            beam_width: genome.get("reasoning.beam_width") as usize,
            min_edge_weight: genome.get("reasoning.min_edge_weight"),
        }
    }
}

fn jaccard(a: &[u64], b: &[u64]) -> f32 {
    let sa: HashSet<u64> = a.iter().copied().collect();
    let sb: HashSet<u64> = b.iter().copied().collect();
    if sa.is_empty() && sb.is_empty() {
        return 1.0;
    }
    let inter = sa.intersection(&sb).count() as f32;
    let union = sa.union(&sb).count() as f32;
    if union == 0.0 {
        1.0
    } else {
        inter / union
    }
}

fn min_jaccard_against_kept(path: &PathCandidate, kept: &[PathCandidate]) -> f32 {
    if kept.is_empty() {
        return 1.0;
    }
    kept.iter()
        .map(|k| jaccard(&path.nodes, &k.nodes))
        .fold(1.0_f32, f32::min)
}

/// Tie-break order: higher score, shorter length,
/// younger `last_access`, smaller terminal node id.
fn compare_candidates(a: &PathCandidate, b: &PathCandidate) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.hop_count().cmp(&b.hop_count()))
        .then_with(|| b.last_access_ns.cmp(&a.last_access_ns))
        .then_with(|| a.terminal().cmp(&b.terminal()))
}

/// Forward beam search from `starts`. Returns the ranked final
/// beam (best path first) and whether the deadline was hit.
pub fn beam_search(
    store: &GraphStore,
    genome: &ParameterGenome,
    starts: &[u64],
    opts: &BeamOptions,
    now_ns: u64,
    deadline: Option<Instant>,
) -> (Vec<PathCandidate>, bool) {
    let mut beam: Vec<PathCandidate> = starts.iter().map(|&n| PathCandidate::start(n)).collect();
    let mut all_candidates: Vec<PathCandidate> = beam.clone();
    let mut timed_out = false;

    let leap_bias = genome.get("reasoning.leap_bias");
    let abstraction_threshold = genome.get("reasoning.abstraction_threshold");

    for _hop in 0..opts.max_hops {
        if let Some(dl) = deadline {
            if Instant::now() >= dl {
                timed_out = true;
                break;
            }
        }

        let mut extended: Vec<PathCandidate> = Vec::new();
        for path in &beam {
            for (edge_id, dst, rel) in store.adjacency_out(path.terminal()) {
                if path.contains(dst) {
                    continue; // no cycles (P8)
                }
                let edge = match store.edge(edge_id) {
                    Some(e) => e,
                    None => continue,
                };
                let lambda = genome.get("scoring.lambda_mix");
                let w_mix = edge.w_mix(lambda);
                if w_mix < opts.min_edge_weight {
                    continue;
                }
                // A generalization hop only clears the bar when it's a
                // confident abstraction, not an incidental one.
                if rel == RelType::Generalization && w_mix < abstraction_threshold {
                    continue;
                }
                let deg_src = store.degree(path.terminal());
                let deg_dst = store.degree(dst);
                let mut es = edge_score(edge, deg_src, deg_dst, now_ns, genome);
                if rel == RelType::Leap {
                    es *= 1.0 + leap_bias;
                }
                extended.push(path.extended(edge_id, dst, rel, es, edge.last_access_ns, edge.contradiction));
            }
        }

        if extended.is_empty() {
            break;
        }

        // Preliminary ranking by raw plausibility (product of edge scores)
        // before diversity penalties are applied against the kept set.
        extended.sort_by(|a, b| {
            let pa: f32 = a.edge_scores.iter().product();
            let pb: f32 = b.edge_scores.iter().product();
            pb.partial_cmp(&pa).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut kept: Vec<PathCandidate> = Vec::with_capacity(opts.beam_width);
        for mut cand in extended {
            let min_j = min_jaccard_against_kept(&cand, &kept);
            let avg_gap_s = if cand.nodes.len() > 1 {
                (now_ns.saturating_sub(cand.last_access_ns)) as f32 / 1e9
            } else {
                0.0
            };
            let input = PathScoreInput {
                edge_scores: &cand.edge_scores,
                avg_gap_s,
                min_jaccard: min_j,
                sim_to_recent: 0.0,
                max_contradiction: 0.0,
            };
            let (score, _) = path_score(&input, genome);
            cand.score = score;
            kept.push(cand);
            if kept.len() >= opts.beam_width {
                break;
            }
        }
        kept.sort_by(compare_candidates);

        all_candidates.extend(kept.iter().cloned());
        beam = kept;
        if beam.is_empty() {
            break;
        }
    }

    all_candidates.sort_by(compare_candidates);
    all_candidates.truncate(opts.beam_width.max(1) * (opts.max_hops.max(1) + 1));
    (all_candidates, timed_out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeKind, RelType};

    #[test]
    fn beam_search_never_revisits_a_node() {
        let mut store = GraphStore::new();
        let genome = ParameterGenome::default_genome();
        let a = store.get_or_create_node("cats", NodeKind::Concept, 0);
        let b = store.get_or_create_node("mammals", NodeKind::Concept, 0);
        store.upsert_edge(a, b, RelType::Generalization, 0.9, 0).unwrap();
        store.upsert_edge(b, a, RelType::Assoc, 0.9, 0).unwrap();

        let opts = BeamOptions::from_genome(&genome);
        let (candidates, timed_out) = beam_search(&store, &genome, &[a], &opts, 0, None);
        assert!(!timed_out);
        for c in &candidates {
            let unique: HashSet<u64> = c.nodes.iter().copied().collect();
            assert_eq!(unique.len(), c.nodes.len());
        }
    }

    #[test]
    fn beam_search_finds_chain_answer() {
        let mut store = GraphStore::new();
        let genome = ParameterGenome::default_genome();
        let cats = store.get_or_create_node("cats", NodeKind::Concept, 0);
        let mammals = store.get_or_create_node("mammals", NodeKind::Concept, 0);
        let water = store.get_or_create_node("water", NodeKind::Concept, 0);
        store
            .upsert_edge(cats, mammals, RelType::Generalization, 0.9, 0)
            .unwrap();
        store
            .upsert_edge(mammals, water, RelType::Consumes, 0.9, 0)
            .unwrap();

        let opts = BeamOptions::from_genome(&genome);
        let (candidates, _) = beam_search(&store, &genome, &[cats], &opts, 0, None);
        assert!(candidates.iter().any(|c| c.terminal() == water));
    }
}
