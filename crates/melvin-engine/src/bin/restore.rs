//! `melvin-restore`: validate a Melvin snapshot file by loading it and
//! reporting its contents, without wiring up the full CLI or daemon.
//! Useful after copying a snapshot between machines or recovering one
//! from backup, before pointing `melvind` at it.

use std::path::PathBuf;

use melvin_core::GraphStore;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: melvin-restore <snapshot-path>");
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    println!("Loading snapshot from: {}", path.display());

    let store = GraphStore::load(&path)?;
    println!("nodes={} edges={}", store.node_count(), store.edge_count());

    let mut kind_counts: std::collections::HashMap<&'static str, usize> = std::collections::HashMap::new();
    for node in store.nodes_iter() {
        let label = match node.kind {
            melvin_core::NodeKind::Symbol => "symbol",
            melvin_core::NodeKind::Concept => "concept",
            melvin_core::NodeKind::Thought => "thought",
            melvin_core::NodeKind::Sensor => "sensor",
        };
        *kind_counts.entry(label).or_insert(0) += 1;
    }
    for (kind, count) in kind_counts {
        println!("  {kind}: {count}");
    }

    println!("snapshot is valid");
    Ok(())
}
