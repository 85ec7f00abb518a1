//! Runtime hyperparameter genome.
//!
//! Every tunable coefficient used by the scoring kernel and reasoning
//! engine is read from a [`ParameterGenome`] rather than hard-coded, so
//! that the evolutionary controller can mutate and hot-swap the whole
//! set without a recompile. The active genome is published behind an
//! [`arc_swap::ArcSwap`]: readers dereference once per call and work off
//! a local `Arc` clone, writers construct a brand new genome and publish
//! it atomically.

mod params;
mod swap;

pub use params::{GenomeParam, ParamKind, ParameterGenome};
pub use swap::GenomeHandle;
