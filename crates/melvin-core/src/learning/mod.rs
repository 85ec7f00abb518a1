//! Continuous-learning pipeline: teaching-file ingestion,
//! verification, SM-2 spaced repetition, rehearsal generation, and
//! decay/consolidation.

mod consolidation;
mod ingest;
mod rehearsal;
mod srs;
mod teaching;
mod verify;

pub use consolidation::{cluster_near_duplicates, decay_edges, replay_thoughts, ConsolidationReport, ReplayStats};
pub use ingest::{ingest, IngestOptions, IngestReport};
pub use rehearsal::generate_rehearsal_document;
pub use srs::{Grade, SrsItem, SrsScheduler, SrsStats};
pub use teaching::{parse, Association, Block, Fact, Meta, Query, Rule, TeachingDocument, TestCase};
pub use verify::{verify, VerifyReport};
