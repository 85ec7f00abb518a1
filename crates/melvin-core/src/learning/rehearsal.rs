//! Rehearsal-document generation: periodically re-teach the
//! system the facts it is closest to forgetting. Grounded on
//! `srs_scheduler.cpp`'s `generate_rehearsal_lesson`.

use crate::graph::GraphStore;

/// Emit a teaching document covering the edges named
/// by `edge_ids`, fed back into [`super::ingest`] by the caller.
pub fn generate_rehearsal_document(store: &GraphStore, edge_ids: &[u64]) -> String {
    let mut out = String::new();
    out.push_str("# auto-generated rehearsal\n");
    out.push_str(&format!("# items: {}\n\n", edge_ids.len()));

    for &edge_id in edge_ids {
        let Some(edge) = store.edge(edge_id) else {
            continue;
        };
        let (Some(src), Some(dst)) = (store.node(edge.src), store.node(edge.dst)) else {
            continue;
        };
        out.push_str("#FACT\n");
        out.push_str(&format!("{} {:?} {}\n\n", src.text, edge.rel, dst.text));
    }

    for (i, &edge_id) in edge_ids.iter().enumerate() {
        let Some(edge) = store.edge(edge_id) else {
            continue;
        };
        let (Some(src), Some(dst)) = (store.node(edge.src), store.node(edge.dst)) else {
            continue;
        };
        out.push_str(&format!("#TEST rehearsal{i}\n"));
        out.push_str(&format!("#QUERY\nwhat does {} {:?}\n", src.text, edge.rel));
        out.push_str(&format!("#EXPECT\n{}\n\n", dst.text));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeKind, RelType};
    use crate::learning::teaching::parse;

    #[test]
    fn generated_document_round_trips_through_the_parser() {
        let mut store = GraphStore::new();
        let a = store.get_or_create_node("cats", NodeKind::Concept, 0);
        let b = store.get_or_create_node("mammals", NodeKind::Concept, 0);
        let edge_id = store.upsert_edge(a, b, RelType::Isa, 1.0, 0).unwrap();

        let doc_text = generate_rehearsal_document(&store, &[edge_id]);
        let parsed = parse(&doc_text);
        assert!(!parsed.blocks.is_empty());
        assert!(parsed.errors.is_empty());
    }
}
