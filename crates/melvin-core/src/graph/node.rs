//! Node and relation types for the knowledge graph.

use serde::{Deserialize, Serialize};

/// Kind of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Symbol,
    Concept,
    /// Encodes a reasoning path; acts as an address for replay.
    Thought,
    Sensor,
}

impl NodeKind {
    pub fn as_u8(&self) -> u8 {
        match self {
            NodeKind::Symbol => 0,
            NodeKind::Concept => 1,
            NodeKind::Thought => 2,
            NodeKind::Sensor => 3,
        }
    }

    pub fn from_u8(b: u8) -> Self {
        match b {
            1 => NodeKind::Concept,
            2 => NodeKind::Thought,
            3 => NodeKind::Sensor,
            _ => NodeKind::Symbol,
        }
    }
}

/// A node in the knowledge graph.
///
/// Owned exclusively by [`crate::graph::GraphStore`]; every other component
/// holds the stable `u64` id and borrows data through the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: u64,
    pub text: String,
    pub kind: NodeKind,
    pub embedding: Vec<f32>,
    pub freq: u32,
    pub pinned: bool,
    pub last_accessed_ns: u64,
    pub activation: f32,
}

impl Node {
    pub fn new(id: u64, text: String, kind: NodeKind, now_ns: u64) -> Self {
        Self {
            id,
            text,
            kind,
            embedding: Vec::new(),
            freq: 1,
            pinned: false,
            last_accessed_ns: now_ns,
            activation: 0.0,
        }
    }

    /// Normalize text for matching: lowercase, trim, strip punctuation
    /// except intra-token marks (hyphen, apostrophe, underscore).
    pub fn normalize(text: &str) -> String {
        text.trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '\'' | '_' | ' '))
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Closed set of edge relation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelType {
    Exact,
    Temporal,
    Leap,
    Generalization,
    Isa,
    Consumes,
    Has,
    Can,
    Assoc,
}

impl RelType {
    pub fn as_u8(&self) -> u8 {
        match self {
            RelType::Exact => 0,
            RelType::Temporal => 1,
            RelType::Leap => 2,
            RelType::Generalization => 3,
            RelType::Isa => 4,
            RelType::Consumes => 5,
            RelType::Has => 6,
            RelType::Can => 7,
            RelType::Assoc => 8,
        }
    }

    pub fn from_u8(b: u8) -> Option<Self> {
        Some(match b {
            0 => RelType::Exact,
            1 => RelType::Temporal,
            2 => RelType::Leap,
            3 => RelType::Generalization,
            4 => RelType::Isa,
            5 => RelType::Consumes,
            6 => RelType::Has,
            7 => RelType::Can,
            8 => RelType::Assoc,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelType::Exact => "exact",
            RelType::Temporal => "temporal",
            RelType::Leap => "leap",
            RelType::Generalization => "generalization",
            RelType::Isa => "isa",
            RelType::Consumes => "consumes",
            RelType::Has => "has",
            RelType::Can => "can",
            RelType::Assoc => "assoc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation_but_keeps_hyphen() {
        assert_eq!(Node::normalize("  Cats, ARE mammals!  "), "cats are mammals");
        assert_eq!(Node::normalize("well-known"), "well-known");
    }

    #[test]
    fn rel_type_roundtrips_through_u8() {
        for rel in [
            RelType::Exact,
            RelType::Temporal,
            RelType::Leap,
            RelType::Generalization,
            RelType::Isa,
            RelType::Consumes,
            RelType::Has,
            RelType::Can,
            RelType::Assoc,
        ] {
            assert_eq!(RelType::from_u8(rel.as_u8()), Some(rel));
        }
    }
}
