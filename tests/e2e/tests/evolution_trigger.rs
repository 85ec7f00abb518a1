//! Evolution trigger: a sustained run of failing
//! reasoning steps should stagnate the metrics and, once the rate
//! limiter opens, swap in exactly one new genome generation.

use melvin_core::{GraphStore, InputConcept, ParameterGenome, Scheduler};

#[test]
fn sustained_failure_triggers_exactly_one_evolution() {
    let store = GraphStore::new(); // empty: every query misses and stays Listen
    let genome = ParameterGenome::default_genome();
    let rate_limit_ticks = genome.get("evolution.rate_limit_ticks") as u64;
    let mut scheduler = Scheduler::new(store, genome);

    let starting_generation = scheduler.genome.load().generation;
    let mut evolutions = 0u32;

    // Run exactly one rate-limiter window's worth of ticks plus a
    // handful more, so only a single swap has a chance to fire.
    for tick in 0..(rate_limit_ticks + 5) {
        let input = InputConcept::text("an unanswerable question nobody taught me", tick * 1_000_000_000);
        let outcome = scheduler.tick(input, None);
        if outcome.evolved {
            evolutions += 1;
        }
    }

    assert_eq!(evolutions, 1, "expected exactly one genome swap within a single rate-limit window");
    let ending_generation = scheduler.genome.load().generation;
    assert_eq!(ending_generation, starting_generation + 1);
}

#[test]
fn healthy_reasoning_never_evolves() {
    let mut store = GraphStore::new();
    let genome = ParameterGenome::default_genome();
    let doc = melvin_core::parse("#FACT\ncats are mammals\n");
    melvin_core::ingest(&mut store, &doc, melvin_core::IngestOptions::default(), 0);

    let rate_limit_ticks = genome.get("evolution.rate_limit_ticks") as u64;
    let mut scheduler = Scheduler::new(store, genome);

    for tick in 0..(rate_limit_ticks + 5) {
        let input = InputConcept::text("what are cats", (tick + 1) * 1_000_000_000);
        let outcome = scheduler.tick(input, Some(1.0));
        assert!(!outcome.evolved);
    }
}
