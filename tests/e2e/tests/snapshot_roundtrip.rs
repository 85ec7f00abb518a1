//! Snapshot round-trip: after writing a
//! snapshot and loading it back into a fresh store, answers and
//! confidences for the same queries must match exactly.

use melvin_core::{answer_query, ingest, parse, GateState, GraphStore, IngestOptions, ParameterGenome};

#[test]
fn snapshot_then_load_reproduces_prior_answers() {
    let genome = ParameterGenome::default_genome();
    let mut store = GraphStore::new();
    let doc = parse("#FACT\ncats are mammals\nmammals drink water\n");
    ingest(&mut store, &doc, IngestOptions::default(), 0);

    let questions = ["what are cats", "what do cats drink"];
    let before: Vec<(String, f32)> = questions
        .iter()
        .map(|q| {
            let mut gate_state = GateState::default();
            let result = answer_query(&store, &genome, q, None, 10, None, &[], &mut gate_state);
            (result.text, result.confidence)
        })
        .collect();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundtrip.snapshot");
    store.snapshot(&path).unwrap();

    let reloaded = GraphStore::load(&path).unwrap();
    assert_eq!(reloaded.node_count(), store.node_count());
    assert_eq!(reloaded.edge_count(), store.edge_count());

    let after: Vec<(String, f32)> = questions
        .iter()
        .map(|q| {
            let mut gate_state = GateState::default();
            let result = answer_query(&reloaded, &genome, q, None, 10, None, &[], &mut gate_state);
            (result.text, result.confidence)
        })
        .collect();

    for ((before_text, before_conf), (after_text, after_conf)) in before.iter().zip(after.iter()) {
        assert_eq!(before_text, after_text);
        assert!((before_conf - after_conf).abs() < 1e-6);
    }
}

#[test]
fn snapshot_bytes_round_trip_without_touching_disk() {
    let mut store = GraphStore::new();
    let doc = parse("#FACT\ndogs are mammals\n");
    ingest(&mut store, &doc, IngestOptions::default(), 0);

    let bytes = store.snapshot_bytes();
    let reloaded = GraphStore::load_bytes(&bytes).unwrap();
    assert_eq!(reloaded.node_count(), store.node_count());
    assert_eq!(reloaded.edge_count(), store.edge_count());
}
