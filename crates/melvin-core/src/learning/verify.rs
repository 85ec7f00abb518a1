//! Verification pass: re-run every `Query`+`Expect` pair
//! through the reasoning engine at a minimal beam and fuzzy-match the
//! answer.

use std::time::Instant;

use super::teaching::{Block, TeachingDocument};
use crate::genome::ParameterGenome;
use crate::graph::GraphStore;
use crate::reasoning::{answer_query, GateState};

const SIMILARITY_THRESHOLD: f32 = 0.85;

#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub total: u32,
    pub passed: u32,
    pub pass_rate: f64,
}

/// Sorensen-Dice coefficient over character bigrams of the normalized
/// strings; 1.0 for identical short strings, 0.0 for disjoint ones.
fn normalized_similarity(a: &str, b: &str) -> f32 {
    let a = crate::graph::node::Node::normalize(a);
    let b = crate::graph::node::Node::normalize(b);
    if a == b {
        return 1.0;
    }
    let bigrams = |s: &str| -> Vec<(char, char)> {
        let chars: Vec<char> = s.chars().collect();
        chars.windows(2).map(|w| (w[0], w[1])).collect()
    };
    let ab = bigrams(&a);
    let bb = bigrams(&b);
    if ab.is_empty() || bb.is_empty() {
        return 0.0;
    }
    let mut matches = 0usize;
    let mut pool = bb.clone();
    for bigram in &ab {
        if let Some(pos) = pool.iter().position(|x| x == bigram) {
            pool.remove(pos);
            matches += 1;
        }
    }
    (2 * matches) as f32 / (ab.len() + bb.len()) as f32
}

fn answer_matches(answer: &str, expect: &str) -> bool {
    let a_norm = crate::graph::node::Node::normalize(answer);
    let e_norm = crate::graph::node::Node::normalize(expect);
    if a_norm.contains(&e_norm) || e_norm.contains(&a_norm) {
        return true;
    }
    normalized_similarity(answer, expect) >= SIMILARITY_THRESHOLD
}

/// Run every query in `doc` at a minimal beam width and compute the pass
/// rate against its expected answers.
pub fn verify(store: &GraphStore, genome: &ParameterGenome, doc: &TeachingDocument, now_ns: u64) -> VerifyReport {
    let mut minimal = genome.clone();
    minimal.set("reasoning.beam_width", 1.0);

    let mut report = VerifyReport::default();
    let mut gate_state = GateState::default();

    let mut run_query = |question: &str, expects: &[String]| {
        if expects.is_empty() {
            return;
        }
        report.total += 1;
        let result = answer_query(
            store,
            &minimal,
            question,
            None,
            now_ns,
            Some(Instant::now()),
            &[],
            &mut gate_state,
        );
        if expects.iter().any(|e| answer_matches(&result.text, e)) {
            report.passed += 1;
        }
    };

    for block in &doc.blocks {
        match block {
            Block::Query(q) => run_query(&q.question, &q.expects),
            Block::Test(t) => {
                if let Some(q) = &t.query {
                    run_query(&q.question, &q.expects);
                }
            }
            _ => {}
        }
    }

    report.pass_rate = if report.total > 0 {
        report.passed as f64 / report.total as f64
    } else {
        0.0
    };
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_is_one_for_identical_normalized_strings() {
        assert_eq!(normalized_similarity("Mammals!", "mammals"), 1.0);
    }

    #[test]
    fn substring_inclusion_counts_as_a_match() {
        assert!(answer_matches("cats are mammals", "mammals"));
    }

    #[test]
    fn unrelated_strings_do_not_match() {
        assert!(!answer_matches("cats are mammals", "quantum entanglement"));
    }
}
