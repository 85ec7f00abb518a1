use crate::evolution::StagnationReport;
use crate::reasoning::{Gate, OutputType};

/// What a consolidation pass (run on cadence) did this tick.
#[derive(Debug, Clone, Default)]
pub struct ConsolidationOutcome {
    pub edges_decayed: u32,
    pub replay_success_rate: f32,
    pub nodes_merged: u32,
    pub rehearsal_nodes_added: u32,
    pub rehearsal_edges_added: u32,
}

/// Summary of one full scheduler tick.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub gate: Gate,
    pub output_type: OutputType,
    pub text: String,
    pub confidence: f32,
    pub reward: f32,
    pub edges_reinforced: u32,
    pub stagnation: Option<StagnationReport>,
    pub evolved: bool,
    pub consolidation: Option<ConsolidationOutcome>,
}
