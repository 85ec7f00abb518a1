//! Per-tick metrics CSV log: a fixed-header, append-only
//! file written once per `metrics_every_seconds` cadence.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use melvin_core::TickOutcome;

const HEADER: &str = "ts_ns,tick,gate,confidence,reward,edges_reinforced,evolved,stagnating,edge_count,node_count\n";

pub struct MetricsLog {
    path: PathBuf,
}

impl MetricsLog {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            let mut f = OpenOptions::new().create(true).write(true).open(&path)?;
            f.write_all(HEADER.as_bytes())?;
        }
        Ok(Self { path })
    }

    pub fn append(
        &self,
        ts_ns: u64,
        tick: u64,
        outcome: &TickOutcome,
        node_count: u64,
        edge_count: u64,
    ) -> anyhow::Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(
            f,
            "{ts_ns},{tick},{:?},{:.4},{:.4},{},{},{},{edge_count},{node_count}",
            outcome.gate,
            outcome.confidence,
            outcome.reward,
            outcome.edges_reinforced,
            outcome.evolved,
            outcome.stagnation.is_some(),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use melvin_core::{Gate, OutputType};

    fn sample_outcome() -> TickOutcome {
        TickOutcome {
            gate: Gate::Emit,
            output_type: OutputType::Answer,
            text: "x".to_string(),
            confidence: 0.8,
            reward: 0.5,
            edges_reinforced: 2,
            stagnation: None,
            evolved: false,
            consolidation: None,
        }
    }

    #[test]
    fn writes_header_once_and_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        let log = MetricsLog::open(&path).unwrap();
        log.append(1, 1, &sample_outcome(), 10, 5).unwrap();
        log.append(2, 2, &sample_outcome(), 10, 5).unwrap();

        let log2 = MetricsLog::open(&path).unwrap();
        log2.append(3, 3, &sample_outcome(), 10, 5).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], HEADER.trim_end());
        assert_eq!(lines.len(), 4);
    }
}
