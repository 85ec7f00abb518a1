//! Inbox watcher: polls `inbox_dir` on a fixed cadence,
//! parses and ingests each teaching file, and files it under
//! `processed_dir` or `failed_dir` depending on the outcome.

use std::path::{Path, PathBuf};

use melvin_core::{ingest, parse, GraphStore, IngestOptions, IngestReport};
use tracing::{info, warn};

use crate::config::EngineConfig;

/// One inbox sweep: ingest up to `max_files_per_tick` pending files in
/// lexical order, oldest-looking-name first, and move each aside.
pub fn sweep_inbox(store: &mut GraphStore, config: &EngineConfig, now_ns: u64) -> anyhow::Result<u32> {
    let mut entries = pending_files(&config.inbox_dir)?;
    entries.sort();
    entries.truncate(config.max_files_per_tick as usize);

    let mut processed = 0u32;
    for path in entries {
        match ingest_file(store, &path, now_ns) {
            Ok(report) => {
                info!(
                    file = %path.display(),
                    nodes_added = report.nodes_added,
                    edges_added = report.edges_added,
                    "ingested teaching file"
                );
                move_to(&path, &config.processed_dir)?;
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "failed to ingest teaching file");
                move_to(&path, &config.failed_dir)?;
            }
        }
        processed += 1;
    }
    Ok(processed)
}

fn pending_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() {
            out.push(path);
        }
    }
    Ok(out)
}

fn ingest_file(store: &mut GraphStore, path: &Path, now_ns: u64) -> anyhow::Result<IngestReport> {
    let content = std::fs::read_to_string(path)?;
    let doc = parse(&content);
    let report = ingest(store, &doc, IngestOptions::default(), now_ns);
    if !report.errors.is_empty() {
        anyhow::bail!("{} block error(s): {}", report.errors.len(), report.errors.join("; "));
    }
    Ok(report)
}

fn move_to(path: &Path, dest_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dest_dir)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("inbox entry has no file name: {}", path.display()))?;
    std::fs::rename(path, dest_dir.join(file_name))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use melvin_core::ParameterGenome;

    #[test]
    fn sweep_moves_a_valid_file_to_processed() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            inbox_dir: dir.path().join("inbox"),
            processed_dir: dir.path().join("processed"),
            failed_dir: dir.path().join("failed"),
            max_files_per_tick: 10,
            ..EngineConfig::default()
        };
        config.ensure_directories().unwrap();
        std::fs::write(config.inbox_dir.join("a.teach"), "#FACT\ncat is mammal\n").unwrap();

        let mut store = GraphStore::new();
        let _ = ParameterGenome::default_genome();
        let processed = sweep_inbox(&mut store, &config, 1).unwrap();
        assert_eq!(processed, 1);
        assert!(config.processed_dir.join("a.teach").exists());
        assert!(!config.inbox_dir.join("a.teach").exists());
    }

    #[test]
    fn sweep_respects_max_files_per_tick() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            inbox_dir: dir.path().join("inbox"),
            processed_dir: dir.path().join("processed"),
            failed_dir: dir.path().join("failed"),
            max_files_per_tick: 1,
            ..EngineConfig::default()
        };
        config.ensure_directories().unwrap();
        std::fs::write(config.inbox_dir.join("a.teach"), "#FACT\ncat is mammal\n").unwrap();
        std::fs::write(config.inbox_dir.join("b.teach"), "#FACT\ndog is mammal\n").unwrap();

        let mut store = GraphStore::new();
        let processed = sweep_inbox(&mut store, &config, 1).unwrap();
        assert_eq!(processed, 1);
    }
}
