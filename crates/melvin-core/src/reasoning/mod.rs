//! Multi-hop reasoning engine: beam/bidirectional search,
//! path selection, and the three-mode emission gate.

mod beam;
mod bidirectional;
mod engine;
mod gate;
mod lookup;
mod path;
mod result;

pub use beam::{beam_search, BeamOptions};
pub use bidirectional::bidirectional_search;
pub use engine::answer_query;
pub use gate::{
    decide_gate, detect_intent, dynamic_threshold, hysteresis_gate, safety_check,
    threshold_for_intent, Gate, GateState, Intent,
};
pub use lookup::{start_nodes, tokenize};
pub use path::{PathCandidate, ReasoningPath};
pub use result::{OutputType, ReasoningResult};
