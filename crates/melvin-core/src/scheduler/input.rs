/// One perceived input concept for a tick.
#[derive(Debug, Clone)]
pub struct InputConcept {
    pub modality: String,
    pub raw: String,
    pub t_ns: u64,
    /// A previously-bound target node, when the caller already knows which
    /// concept this input should resolve to (drives bidirectional search).
    pub target: Option<u64>,
}

impl InputConcept {
    pub fn text(raw: impl Into<String>, t_ns: u64) -> Self {
        Self {
            modality: "text".to_string(),
            raw: raw.into(),
            t_ns,
            target: None,
        }
    }
}
