use super::gate::Gate;
use super::path::ReasoningPath;
use crate::scoring::ExtraMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputType {
    #[default]
    None,
    Text,
    Action,
    Audio,
}

/// The outcome of one reasoning call.
#[derive(Debug, Clone)]
pub struct ReasoningResult {
    pub output_type: OutputType,
    pub text: String,
    pub used_paths: Vec<ReasoningPath>,
    pub confidence: f32,
    pub gate: Gate,
    /// Set when the wall-clock deadline was hit before search finished
    ///: the caller should treat this as reduced certainty.
    pub timed_out: bool,
    pub extra: ExtraMetrics,
}

impl Default for ReasoningResult {
    fn default() -> Self {
        Self {
            output_type: OutputType::None,
            text: String::new(),
            used_paths: Vec::new(),
            confidence: 0.0,
            gate: Gate::Listen,
            timed_out: false,
            extra: ExtraMetrics::default(),
        }
    }
}
