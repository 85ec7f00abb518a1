//! Directed, typed edges.

use super::node::RelType;
use serde::{Deserialize, Serialize};

/// A directed edge `src -rel-> dst`.
///
/// At most one edge exists per `(src, dst, rel)` triple (invariant P2); a
/// second insertion reinforces the existing edge via
/// [`crate::graph::GraphStore::upsert_edge`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: u64,
    pub src: u64,
    pub dst: u64,
    pub rel: RelType,
    pub w_core: f32,
    pub w_ctx: f32,
    pub count: u32,
    pub last_access_ns: u64,
    pub contradiction: f32,
}

impl Edge {
    pub fn new(id: u64, src: u64, dst: u64, rel: RelType, weight: f32, now_ns: u64) -> Self {
        Self {
            id,
            src,
            dst,
            rel,
            w_core: weight.clamp(0.0, 1.0),
            w_ctx: weight.clamp(0.0, 1.0),
            count: 1,
            last_access_ns: now_ns,
            contradiction: 0.0,
        }
    }

    /// Mixed weight used by the scoring kernel: a convex
    /// combination of contextual and core weight.
    pub fn w_mix(&self, lambda: f32) -> f32 {
        (lambda * self.w_ctx + (1.0 - lambda) * self.w_core).max(1e-4)
    }
}
