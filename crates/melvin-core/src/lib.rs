//! # Melvin Core
//!
//! The continuously-learning graph reasoning engine: a directed labeled
//! property graph, a beam/bidirectional reasoning search with a
//! three-mode emission gate, need-cost-driven emergent graph dynamics,
//! a teaching-file ingestion and spaced-repetition learning pipeline, a
//! metrics-driven evolutionary meta-controller for runtime
//! hyperparameters, a ticked scheduler tying it all together, and a
//! cross-modal embedding/binding layer for grounding concepts across
//! modalities.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use melvin_core::{GraphStore, ParameterGenome, Scheduler, InputConcept};
//!
//! let store = GraphStore::new();
//! let genome = ParameterGenome::default_genome();
//! let mut scheduler = Scheduler::new(store, genome);
//! let outcome = scheduler.tick(InputConcept::text("cats are mammals", 0), None);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod crossmodal;
pub mod emergent;
pub mod error;
pub mod evolution;
pub mod genome;
pub mod graph;
pub mod learning;
pub mod reasoning;
pub mod scheduler;
pub mod scoring;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Error handling
pub use error::{MelvinError, Result as MelvinResult};

// Emergent-graph dynamics (need/cost driven growth and pruning)
pub use emergent::{EdgeStateMap, EmergentDynamics, EmergentEdgeState, EnergyBudget};

// Continuous-learning pipeline (teach -> ingest -> verify -> SRS -> consolidate)
pub use learning::{
    cluster_near_duplicates, decay_edges, generate_rehearsal_document, ingest, parse,
    replay_thoughts, verify, Association, Block, ConsolidationReport, Fact, Grade, IngestOptions,
    IngestReport, Meta, Query, ReplayStats, Rule, SrsItem, SrsScheduler, SrsStats,
    TeachingDocument, TestCase, VerifyReport,
};

// Metrics-driven evolutionary meta-controller (rolling EMAs, stagnation
// triggers, UCB-guided micro-evolution, parameter life-cycle)
pub use evolution::{
    check_stagnation, micro_evolve, retire_stale_parameters, spawn_parameter, update_contrib_ema,
    Metrics, RateLimiter, StagnationReport, UcbStats,
};

// Ticked orchestrator tying reasoning, emergent dynamics, learning and
// evolution together
pub use scheduler::{ConsolidationOutcome, Feedback, InputConcept, Scheduler, TickOutcome};

// Cross-modal binding: shared embedding space, per-modality indices,
// bindings table, context/temporal gating
pub use crossmodal::{
    cosine_similarity, decay_temporal, ground, top_k_cosine, Binding, BindingTable,
    CrossModalEmbedder, Modality, ModalityIndex, EMBEDDING_DIM,
};

// Graph store
pub use graph::{Edge, GraphStore, NodeKind, RelType};
pub use graph::node::Node as GraphNode;

// Genome (hot-swappable runtime hyperparameters)
pub use genome::{GenomeHandle, GenomeParam, ParamKind, ParameterGenome};

// Scoring kernel
pub use scoring::{confidence, edge_score, path_score, ExtraMetrics, PathScoreInput};

// Reasoning engine
pub use reasoning::{
    answer_query, BeamOptions, Gate, GateState, Intent, OutputType, PathCandidate,
    ReasoningPath, ReasoningResult,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{
        answer_query, ingest, parse, verify, GateState, GraphStore, InputConcept, NodeKind,
        ParameterGenome, RelType, Scheduler, TickOutcome,
    };
}
