//! Graph store & indices.
//!
//! The store is the single arena that owns every [`Node`] and [`Edge`].
//! All other components address nodes/edges through stable `u64` ids;
//! arena growth never invalidates an id.

pub mod edge;
pub mod node;
pub mod snapshot;

pub use edge::Edge;
pub use node::{NodeKind, RelType};

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::Path;

use crate::error::{MelvinError, Result};
use node::Node;

const TOKEN_RING_CAPACITY: usize = 1024;

/// Default learning rate for `w_core` reinforcement.
pub const DEFAULT_LEARNING_RATE: f32 = 0.1;
/// EMA smoothing factor for `w_ctx` reinforcement.
pub const DEFAULT_CTX_EMA_ALPHA: f32 = 0.3;

#[derive(Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    text_index: HashMap<String, u64>,
    /// `thought` node id -> decoded path of node ids.
    thought_paths: HashMap<u64, Vec<u64>>,

    edges: Vec<Edge>,
    /// `(src, dst, rel)` -> edge id, enforcing invariant P2.
    edge_index: HashMap<(u64, u64, u8), u64>,
    out_adj: HashMap<u64, Vec<u64>>,
    in_adj: HashMap<u64, Vec<u64>>,

    token_rings: HashMap<String, VecDeque<u64>>,

    learning_rate: f32,
    ctx_ema_alpha: f32,
}

impl GraphStore {
    pub fn new() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            ctx_ema_alpha: DEFAULT_CTX_EMA_ALPHA,
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Normalize `text`, return the existing node id on an exact match,
    /// otherwise create a new node and index it.
    pub fn get_or_create_node(&mut self, text: &str, kind: NodeKind, now_ns: u64) -> u64 {
        let normalized = Node::normalize(text);
        if let Some(&id) = self.text_index.get(&normalized) {
            let node = &mut self.nodes[id as usize];
            node.freq += 1;
            node.last_accessed_ns = now_ns;
            self.push_token_ring(&normalized, id);
            return id;
        }
        let id = self.nodes.len() as u64;
        let node = Node::new(id, normalized.clone(), kind, now_ns);
        self.nodes.push(node);
        self.text_index.insert(normalized.clone(), id);
        self.push_token_ring(&normalized, id);
        id
    }

    /// Register a `Thought` node whose text encodes `path`.
    pub fn create_thought_node(&mut self, label: &str, path: Vec<u64>, now_ns: u64) -> Result<u64> {
        for &n in &path {
            self.require_live(n)?;
        }
        let id = self.get_or_create_node(label, NodeKind::Thought, now_ns);
        self.nodes[id as usize].kind = NodeKind::Thought;
        self.thought_paths.insert(id, path);
        Ok(id)
    }

    pub fn thought_path(&self, id: u64) -> Option<&[u64]> {
        self.thought_paths.get(&id).map(|v| v.as_slice())
    }

    pub fn node(&self, id: u64) -> Option<&Node> {
        self.nodes.get(id as usize)
    }

    pub fn node_mut(&mut self, id: u64) -> Option<&mut Node> {
        self.nodes.get_mut(id as usize)
    }

    pub fn is_live(&self, id: u64) -> bool {
        self.nodes.get(id as usize).is_some()
    }

    fn require_live(&self, id: u64) -> Result<()> {
        if self.is_live(id) {
            Ok(())
        } else {
            Err(MelvinError::UnknownNode(id))
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes_iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Total incident-edge degree, used by the scoring kernel's
    /// degree-normalization factor.
    pub fn degree(&self, id: u64) -> usize {
        self.out_adj.get(&id).map(|v| v.len()).unwrap_or(0)
            + self.in_adj.get(&id).map(|v| v.len()).unwrap_or(0)
    }

    fn push_token_ring(&mut self, normalized_text: &str, id: u64) {
        for token in normalized_text.split_whitespace() {
            let ring = self
                .token_rings
                .entry(token.to_string())
                .or_insert_with(VecDeque::new);
            ring.push_back(id);
            if ring.len() > TOKEN_RING_CAPACITY {
                ring.pop_front();
            }
        }
    }

    /// Recent node ids mentioning `token` (fixed-size FIFO ring).
    pub fn token_ring(&self, token: &str) -> Vec<u64> {
        let normalized = Node::normalize(token);
        self.token_rings
            .get(normalized.as_str())
            .map(|r| r.iter().copied().collect())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Create or reinforce the edge `src -rel-> dst`.
    pub fn upsert_edge(
        &mut self,
        src: u64,
        dst: u64,
        rel: RelType,
        weight: f32,
        ts: u64,
    ) -> Result<u64> {
        self.require_live(src)?;
        self.require_live(dst)?;
        let key = (src, dst, rel.as_u8());

        let edge_id = if let Some(&id) = self.edge_index.get(&key) {
            let edge = &mut self.edges[id as usize];
            edge.count += 1;
            let delta = self.learning_rate * weight;
            edge.w_core = (edge.w_core + delta).clamp(0.0, 1.0);
            edge.w_ctx = (self.ctx_ema_alpha * weight + (1.0 - self.ctx_ema_alpha) * edge.w_ctx)
                .clamp(0.0, 1.0);
            edge.last_access_ns = ts;
            id
        } else {
            let id = self.edges.len() as u64;
            let edge = Edge::new(id, src, dst, rel, weight, ts);
            self.edges.push(edge);
            self.edge_index.insert(key, id);
            self.out_adj.entry(src).or_default().push(id);
            self.in_adj.entry(dst).or_default().push(id);
            id
        };

        // Invariant: freq of a node >= max count of its incident edges.
        let count = self.edges[edge_id as usize].count;
        for n in [src, dst] {
            let node = &mut self.nodes[n as usize];
            if node.freq < count {
                node.freq = count;
            }
        }
        Ok(edge_id)
    }

    pub fn edge(&self, id: u64) -> Option<&Edge> {
        self.edges.get(id as usize)
    }

    pub fn edge_mut(&mut self, id: u64) -> Option<&mut Edge> {
        self.edges.get_mut(id as usize)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn find_edge(&self, src: u64, dst: u64, rel: RelType) -> Option<&Edge> {
        self.edge_index
            .get(&(src, dst, rel.as_u8()))
            .and_then(|&id| self.edges.get(id as usize))
    }

    /// Outgoing `(edge_id, dst, rel)` triples for `id`, in canonical order
    /// (ascending `(dst, rel)`).
    pub fn adjacency_out(&self, id: u64) -> Vec<(u64, u64, RelType)> {
        let mut out: Vec<(u64, u64, RelType)> = self
            .out_adj
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .map(|&eid| {
                        let e = &self.edges[eid as usize];
                        (eid, e.dst, e.rel)
                    })
                    .collect()
            })
            .unwrap_or_default();
        out.sort_by_key(|(_, dst, rel)| (*dst, rel.as_u8()));
        out
    }

    pub fn adjacency_in(&self, id: u64) -> Vec<u64> {
        self.in_adj.get(&id).cloned().unwrap_or_default()
    }

    /// Drop an edge from the live adjacency and lookup index. The arena slot is kept so the id is never reused, but the
    /// edge becomes unreachable from traversal.
    pub fn remove_edge(&mut self, edge_id: u64) {
        let Some(edge) = self.edges.get(edge_id as usize) else {
            return;
        };
        let key = (edge.src, edge.dst, edge.rel.as_u8());
        self.edge_index.remove(&key);
        if let Some(v) = self.out_adj.get_mut(&edge.src) {
            v.retain(|&e| e != edge_id);
        }
        if let Some(v) = self.in_adj.get_mut(&edge.dst) {
            v.retain(|&e| e != edge_id);
        }
    }

    /// All currently live edge ids (present in the adjacency index).
    pub fn live_edge_ids(&self) -> Vec<u64> {
        self.edge_index.values().copied().collect()
    }

    /// Redirect all incoming edges of `from` onto `into` (used by
    /// consolidation's near-duplicate merge), then drop `from`'s
    /// outgoing adjacency. `from` itself is left as an unreferenced husk;
    /// ids are never reused.
    pub fn redirect_incoming(&mut self, from: u64, into: u64, now_ns: u64) -> Result<()> {
        self.require_live(from)?;
        self.require_live(into)?;
        let incoming = self.in_adj.remove(&from).unwrap_or_default();
        for eid in incoming {
            let (src, rel, w_core, w_ctx) = {
                let e = &self.edges[eid as usize];
                (e.src, e.rel, e.w_core, e.w_ctx)
            };
            if src == into {
                continue; // would become a self-loop; drop silently
            }
            self.upsert_edge(src, into, rel, w_core.max(w_ctx), now_ns)?;
        }
        self.out_adj.remove(&from);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Snapshot I/O
    // ------------------------------------------------------------------

    pub fn snapshot_bytes(&self) -> Vec<u8> {
        let taught: Vec<_> = self
            .nodes
            .iter()
            .filter(|n| n.kind != NodeKind::Thought)
            .map(|n| snapshot::TaughtNodeRecord {
                id: n.id,
                kind: n.kind,
                text: n.text.clone(),
                embedding: n.embedding.clone(),
            })
            .collect();

        let mut thought_ids: Vec<u64> = self.thought_paths.keys().copied().collect();
        thought_ids.sort_unstable();
        let thoughts: Vec<_> = thought_ids
            .iter()
            .map(|&id| snapshot::ThoughtNodeRecord {
                id,
                path: self.thought_paths[&id].clone(),
            })
            .collect();

        let mut connections = Vec::with_capacity(self.edges.len());
        let mut node_ids: Vec<u64> = self.nodes.iter().map(|n| n.id).collect();
        node_ids.sort_unstable();
        for id in node_ids {
            for (_, dst, rel) in self.adjacency_out(id) {
                let e = self.find_edge(id, dst, rel).unwrap();
                connections.push(snapshot::ConnectionRecord {
                    src: id,
                    rel,
                    dst,
                    w_core: e.w_core,
                    w_ctx: e.w_ctx,
                    count: e.count,
                    last_access_ns: e.last_access_ns,
                    contradiction: e.contradiction,
                });
            }
        }

        let mut buf = Vec::new();
        snapshot::write_snapshot(&mut buf, &taught, &thoughts, &connections)
            .expect("writing to an in-memory Vec cannot fail");
        buf
    }

    pub fn snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.snapshot_bytes();
        let mut f = std::fs::File::create(path)?;
        f.write_all(&bytes)?;
        Ok(())
    }

    pub fn load_bytes(bytes: &[u8]) -> Result<Self> {
        let records = snapshot::read_all(bytes)?;
        let mut store = GraphStore::new();
        // Pre-size the arena: taught/thought records carry explicit ids,
        // which may arrive out of order, so insert by growing the vec.
        let mut max_id = 0u64;
        for r in &records {
            let id = match r {
                snapshot::Record::Taught(t) => t.id,
                snapshot::Record::Thought(t) => t.id,
                snapshot::Record::Connection(_) => continue,
            };
            max_id = max_id.max(id);
        }
        store.nodes = (0..=max_id)
            .map(|id| Node::new(id, String::new(), NodeKind::Symbol, 0))
            .collect();

        for r in &records {
            match r {
                snapshot::Record::Taught(t) => {
                    let node = &mut store.nodes[t.id as usize];
                    node.text = t.text.clone();
                    node.kind = t.kind;
                    node.embedding = t.embedding.clone();
                    store.text_index.insert(t.text.clone(), t.id);
                }
                snapshot::Record::Thought(t) => {
                    store.thought_paths.insert(t.id, t.path.clone());
                    store.nodes[t.id as usize].kind = NodeKind::Thought;
                }
                snapshot::Record::Connection(_) => {}
            }
        }
        for r in &records {
            if let snapshot::Record::Connection(c) = r {
                store.upsert_edge(c.src, c.dst, c.rel, 0.0, c.last_access_ns)?;
                let edge = store.edge_mut(
                    *store
                        .edge_index
                        .get(&(c.src, c.dst, c.rel.as_u8()))
                        .expect("just inserted"),
                )
                .unwrap();
                edge.w_core = c.w_core;
                edge.w_ctx = c.w_ctx;
                edge.count = c.count;
                edge.contradiction = c.contradiction;
            }
        }
        Ok(store)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::load_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_node_is_idempotent_on_normalized_text() {
        let mut store = GraphStore::new();
        let a = store.get_or_create_node("Cats", NodeKind::Concept, 0);
        let b = store.get_or_create_node("  cats ", NodeKind::Concept, 1);
        assert_eq!(a, b);
        assert_eq!(store.node(a).unwrap().freq, 2);
    }

    #[test]
    fn upsert_edge_reinforces_rather_than_duplicating() {
        let mut store = GraphStore::new();
        let a = store.get_or_create_node("cats", NodeKind::Concept, 0);
        let b = store.get_or_create_node("mammals", NodeKind::Concept, 0);
        let e1 = store.upsert_edge(a, b, RelType::Generalization, 0.5, 0).unwrap();
        let e2 = store.upsert_edge(a, b, RelType::Generalization, 0.5, 1).unwrap();
        assert_eq!(e1, e2);
        assert_eq!(store.edge(e1).unwrap().count, 2);
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn upsert_edge_rejects_dangling_nodes() {
        let mut store = GraphStore::new();
        assert!(store.upsert_edge(0, 1, RelType::Assoc, 0.5, 0).is_err());
    }

    #[test]
    fn snapshot_roundtrip_preserves_graph() {
        let mut store = GraphStore::new();
        let a = store.get_or_create_node("cats", NodeKind::Concept, 0);
        let b = store.get_or_create_node("mammals", NodeKind::Concept, 0);
        store
            .upsert_edge(a, b, RelType::Generalization, 0.7, 10)
            .unwrap();

        let bytes = store.snapshot_bytes();
        let loaded = GraphStore::load_bytes(&bytes).unwrap();
        assert_eq!(loaded.node_count(), store.node_count());
        assert_eq!(loaded.edge_count(), store.edge_count());
        let e = loaded.find_edge(a, b, RelType::Generalization).unwrap();
        assert!((e.w_core - 0.07).abs() < 1e-5); // DEFAULT_LEARNING_RATE * 0.7
    }

    #[test]
    fn token_ring_tracks_recent_mentions_fifo() {
        let mut store = GraphStore::new();
        for i in 0..3 {
            store.get_or_create_node(&format!("cats like {i}"), NodeKind::Concept, i as u64);
        }
        let ring = store.token_ring("cats");
        assert_eq!(ring.len(), 3);
    }
}
