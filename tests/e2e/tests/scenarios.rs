//! End-to-end teaching/query/contradiction/SRS scenarios run through the
//! public `melvin_core` API, without any internal test-only hooks.

use melvin_core::{answer_query, ingest, parse, Gate, GateState, GraphStore, Grade, IngestOptions, ParameterGenome, SrsScheduler};

fn fresh_genome() -> ParameterGenome {
    ParameterGenome::default_genome()
}

#[test]
fn learn_one_fact_and_answer() {
    let mut store = GraphStore::new();
    let genome = fresh_genome();
    let doc = parse("#FACT\ncats are mammals\n");
    let report = ingest(&mut store, &doc, IngestOptions::default(), 0);
    assert_eq!(report.nodes_added, 2);
    assert_eq!(report.edges_added, 1);

    let mut gate_state = GateState::default();
    let result = answer_query(&store, &genome, "what are cats", None, 1, None, &[], &mut gate_state);
    assert!(result.text.contains("mammals"));
    assert!(result.confidence >= 0.5);
    assert_eq!(result.used_paths[0].edge_ids.len(), 1);
}

#[test]
fn chain_of_facts_answers_with_two_hops() {
    let mut store = GraphStore::new();
    let genome = fresh_genome();
    let doc = parse("#FACT\ncats are mammals\nmammals drink water\n");
    let report = ingest(&mut store, &doc, IngestOptions::default(), 0);
    assert_eq!(report.nodes_added, 3);
    assert_eq!(report.edges_added, 2);

    let mut gate_state = GateState::default();
    let direct = answer_query(&store, &genome, "what are cats", None, 1, None, &[], &mut gate_state);
    let chained = answer_query(&store, &genome, "what do cats drink", None, 2, None, &[], &mut gate_state);

    assert!(chained.text.contains("water"));
    assert_eq!(chained.used_paths[0].edge_ids.len(), 2);
    assert!(chained.confidence <= direct.confidence);
}

#[test]
fn contradiction_keeps_the_gate_from_emitting() {
    let mut store = GraphStore::new();
    let genome = fresh_genome();
    let doc = parse("#FACT\ncats are mammals\ncats are reptiles\n");
    ingest(&mut store, &doc, IngestOptions::default(), 0);

    // Re-asserting a conflicting relation on the same pair should raise
    // the edge's contradiction score above the safety threshold.
    let mut gate_state = GateState::default();
    let result = answer_query(&store, &genome, "cats are reptiles", None, 1, None, &[], &mut gate_state);
    assert_ne!(result.gate, Gate::Emit);
}

#[test]
fn srs_cycle_intervals_grow_then_shrink_on_a_lapse() {
    let genome = fresh_genome();
    let mut srs = SrsScheduler::new();
    let edge_id = 1u64;
    let day_ns = 86_400u64 * 1_000_000_000;

    srs.add_item(edge_id, 0, &genome);
    srs.review(edge_id, Grade::Good, day_ns, &genome);
    let after_first = srs.item(edge_id).unwrap().interval_days;

    srs.review(edge_id, Grade::Good, 2 * day_ns, &genome);
    let after_second = srs.item(edge_id).unwrap().interval_days;
    assert!(after_second > after_first);

    srs.review(edge_id, Grade::Good, 3 * day_ns, &genome);
    let after_third = srs.item(edge_id).unwrap().interval_days;
    assert!(after_third > after_second);

    let pre_fail_interval = after_third;
    srs.review(edge_id, Grade::Fail, 4 * day_ns, &genome);
    let item = srs.item(edge_id).unwrap();
    assert!(item.interval_days < pre_fail_interval);
    assert_eq!(item.lapses, 1);

    let min_interval = genome.get("srs.min_interval_days");
    let max_interval = genome.get("srs.max_interval_days");
    assert!(item.interval_days >= min_interval && item.interval_days <= max_interval);
}
