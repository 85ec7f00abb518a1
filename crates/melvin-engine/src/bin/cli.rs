//! `melvin`: command-line front-end for inspecting and driving a Melvin
//! graph store directly, without the daemon's tick loop.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use melvin_core::{answer_query, parse, verify, GateState, GraphStore, ParameterGenome};

#[derive(Parser)]
#[command(name = "melvin")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Melvin continuously-learning graph reasoning engine")]
struct Cli {
    /// Path to the graph snapshot to operate on.
    #[arg(long, default_value = "melvin.snapshot")]
    snapshot: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a teaching file into the snapshot.
    Ingest {
        /// Path to a teaching-grammar (`#FACT`/`#ASSOC`/...) file.
        file: PathBuf,
    },

    /// Ask a question against the snapshot without mutating it.
    Query {
        /// The natural-language question.
        question: String,
    },

    /// Re-run every `#QUERY`/`#TEST` block in a teaching file and report
    /// the pass rate.
    Verify {
        file: PathBuf,
    },

    /// Print node/edge counts and the active genome's generation.
    Stats,

    /// Write the current in-memory graph back to the snapshot path.
    Snapshot,
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

fn load_store(path: &PathBuf) -> anyhow::Result<GraphStore> {
    if path.exists() {
        Ok(GraphStore::load(path)?)
    } else {
        Ok(GraphStore::new())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let genome = ParameterGenome::default_genome();

    match cli.command {
        Commands::Ingest { file } => {
            let mut store = load_store(&cli.snapshot)?;
            let content = std::fs::read_to_string(&file)?;
            let doc = parse(&content);
            let report = melvin_core::ingest(&mut store, &doc, melvin_core::IngestOptions::default(), now_ns());
            store.snapshot(&cli.snapshot)?;
            println!(
                "nodes_added={} edges_added={} edges_updated={} rules_added={} errors={}",
                report.nodes_added,
                report.edges_added,
                report.edges_updated,
                report.rules_added,
                report.errors.len()
            );
            for err in &report.errors {
                eprintln!("error: {err}");
            }
        }

        Commands::Query { question } => {
            let store = load_store(&cli.snapshot)?;
            let mut gate_state = GateState::default();
            let result = answer_query(&store, &genome, &question, None, now_ns(), None, &[], &mut gate_state);
            println!("gate={:?} confidence={:.4}", result.gate, result.confidence);
            println!("{}", result.text);
        }

        Commands::Verify { file } => {
            let store = load_store(&cli.snapshot)?;
            let content = std::fs::read_to_string(&file)?;
            let doc = parse(&content);
            let report = verify(&store, &genome, &doc, now_ns());
            println!(
                "passed={}/{} pass_rate={:.2}%",
                report.passed,
                report.total,
                report.pass_rate * 100.0
            );
        }

        Commands::Stats => {
            let store = load_store(&cli.snapshot)?;
            println!("nodes={} edges={}", store.node_count(), store.edge_count());
            println!("genome_generation={}", genome.generation);
        }

        Commands::Snapshot => {
            let store = load_store(&cli.snapshot)?;
            store.snapshot(&cli.snapshot)?;
            println!("wrote snapshot to {}", cli.snapshot.display());
        }
    }

    Ok(())
}
