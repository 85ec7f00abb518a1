//! Turns a parsed [`TeachingDocument`] into graph mutations,
//! grounded on `teaching_ingest.cpp`'s `TeachingIngestor`.

use super::teaching::{Block, TeachingDocument};
use crate::graph::{GraphStore, NodeKind, RelType};

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    pub strict: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self { strict: false }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub nodes_added: u32,
    pub edges_added: u32,
    pub edges_updated: u32,
    pub rules_added: u32,
    pub errors: Vec<String>,
}

/// Map a free-text relation token from a teaching file onto the closed
/// [`RelType`] set. Unrecognized tokens fall back to `Exact`, matching a
/// plain subject-predicate-object assertion.
fn rel_from_token(token: &str) -> RelType {
    let t = token.to_lowercase();
    match t.as_str() {
        "is" | "are" | "isa" | "is a" | "is an" => RelType::Isa,
        "has" | "have" | "has a" | "contains" => RelType::Has,
        "can" | "can do" | "does" => RelType::Can,
        "eats" | "consumes" | "uses" | "needs" | "drink" | "drinks" => RelType::Consumes,
        "before" | "after" | "then" | "next" | "followed by" => RelType::Temporal,
        "leads to" | "implies" | "causes" | "suggests" => RelType::Leap,
        "kind of" | "type of" | "subtype of" | "generalizes" => RelType::Generalization,
        _ => RelType::Exact,
    }
}

/// Ingest every block of `doc` into `store`. `Rule` blocks are
/// not used by the reasoning engine directly; they're counted but not
/// turned into edges (kept as ingestion-time metadata only).
pub fn ingest(
    store: &mut GraphStore,
    doc: &TeachingDocument,
    opts: IngestOptions,
    now_ns: u64,
) -> IngestReport {
    let mut report = IngestReport::default();
    let nodes_before = store.node_count();

    for block in &doc.blocks {
        match block {
            Block::Fact(fact) => {
                let subj = store.get_or_create_node(&fact.subj, NodeKind::Concept, now_ns);
                let obj = store.get_or_create_node(&fact.obj, NodeKind::Concept, now_ns);
                let rel = rel_from_token(&fact.rel);
                match store.upsert_edge(subj, obj, rel, fact.meta.confidence, now_ns) {
                    Ok(edge_id) => {
                        if store.edge(edge_id).map(|e| e.count).unwrap_or(1) > 1 {
                            report.edges_updated += 1;
                        } else {
                            report.edges_added += 1;
                        }
                    }
                    Err(e) => {
                        report.errors.push(e.to_string());
                        if opts.strict {
                            break;
                        }
                    }
                }
            }
            Block::Association(assoc) => {
                let left = store.get_or_create_node(&assoc.left, NodeKind::Concept, now_ns);
                let right = store.get_or_create_node(&assoc.right, NodeKind::Concept, now_ns);
                let rel = if assoc.rel.is_empty() {
                    RelType::Assoc
                } else {
                    rel_from_token(&assoc.rel)
                };
                let mut ingest_one = |src: u64, dst: u64| match store.upsert_edge(
                    src,
                    dst,
                    rel,
                    assoc.meta.confidence,
                    now_ns,
                ) {
                    Ok(edge_id) => {
                        if store.edge(edge_id).map(|e| e.count).unwrap_or(1) > 1 {
                            report.edges_updated += 1;
                        } else {
                            report.edges_added += 1;
                        }
                    }
                    Err(e) => report.errors.push(e.to_string()),
                };
                ingest_one(left, right);
                if assoc.bidirectional {
                    ingest_one(right, left);
                }
            }
            Block::Rule(_) => {
                report.rules_added += 1;
            }
            Block::Query(_) | Block::Test(_) | Block::Explain(_) | Block::Source(_) => {}
        }
    }

    report.nodes_added = (store.node_count() - nodes_before) as u32;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::teaching::parse;

    #[test]
    fn fact_block_creates_nodes_and_edge() {
        let mut store = GraphStore::new();
        let doc = parse("#FACT\ncats are mammals\n");
        let report = ingest(&mut store, &doc, IngestOptions::default(), 0);
        assert_eq!(report.nodes_added, 2);
        assert_eq!(report.edges_added, 1);
        assert!(store.find_edge(
            store.get_or_create_node("cats", NodeKind::Concept, 0),
            store.get_or_create_node("mammals", NodeKind::Concept, 0),
            RelType::Isa,
        )
        .is_some());
    }

    #[test]
    fn bidirectional_association_creates_both_edges() {
        let mut store = GraphStore::new();
        let doc = parse("#ASSOC\ncats <-> pets\n");
        let report = ingest(&mut store, &doc, IngestOptions::default(), 0);
        assert_eq!(report.edges_added, 2);
    }

    #[test]
    fn repeated_fact_reinforces_rather_than_duplicates() {
        let mut store = GraphStore::new();
        let doc = parse("#FACT\ncats are mammals\n");
        ingest(&mut store, &doc, IngestOptions::default(), 0);
        let report = ingest(&mut store, &doc, IngestOptions::default(), 1);
        assert_eq!(report.edges_added, 0);
        assert_eq!(report.edges_updated, 1);
    }
}
