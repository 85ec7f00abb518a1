//! `melvind`: the Melvin daemon. Loads (or creates) a graph snapshot,
//! wires it into a [`Scheduler`], and runs the poll loop: sweep the
//! inbox, tick the scheduler on whatever it finds (or an idle
//! heartbeat), log metrics on cadence, snapshot on cadence, and
//! optionally serve the `/batch` HTTP endpoint alongside it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::Parser;
use melvin_core::{GraphStore, InputConcept, ParameterGenome, Scheduler};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use melvin_engine::config::EngineConfig;
use melvin_engine::metrics_log::MetricsLog;
use melvin_engine::{watcher, AppState};

#[derive(Parser, Debug)]
#[command(name = "melvind", about = "Melvin continuously-learning graph reasoning daemon")]
struct Args {
    /// Path to the runtime config YAML. Missing file = defaults.
    #[arg(long, default_value = "melvin.yaml")]
    config: PathBuf,
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = EngineConfig::load(&args.config)?;
    config.ensure_directories()?;
    info!(config = ?args.config, "loaded runtime configuration");

    let store = match GraphStore::load(&config.snapshot_path) {
        Ok(store) => {
            info!(path = %config.snapshot_path.display(), "restored graph from snapshot");
            store
        }
        Err(err) => {
            warn!(error = %err, "no usable snapshot, starting from an empty graph");
            GraphStore::new()
        }
    };

    let genome = ParameterGenome::default_genome();
    let scheduler = Scheduler::new(store, genome);
    let metrics_log = MetricsLog::open(&config.metrics_log_path)?;

    let start_ns = now_ns();
    let state = Arc::new(Mutex::new(AppState::new(scheduler, config.clone(), start_ns)));

    #[cfg(feature = "http")]
    let http_handle = spawn_http_server(state.clone());

    let mut last_snapshot = tokio::time::Instant::now();
    let mut last_metrics = tokio::time::Instant::now();
    let poll = Duration::from_secs(config.poll_seconds.max(1));

    loop {
        tokio::time::sleep(poll).await;

        let (tick_outcome, processed, node_count, edge_count) = {
            let mut guard = state.lock();
            let tick_ns = guard.now_ns();
            let sweep_config = guard.config.clone();
            let processed =
                watcher::sweep_inbox(&mut guard.scheduler.store, &sweep_config, tick_ns).unwrap_or_else(|err| {
                    error!(error = %err, "inbox sweep failed");
                    0
                });
            let input = InputConcept::text(String::new(), tick_ns);
            let outcome = guard.scheduler.tick(input, None);
            let node_count = guard.scheduler.store.node_count();
            let edge_count = guard.scheduler.store.edge_count();
            (outcome, processed, node_count, edge_count)
        };

        if processed > 0 {
            info!(processed, "inbox sweep ingested files");
        }

        if last_metrics.elapsed() >= Duration::from_secs(config.metrics_every_seconds.max(1)) {
            if let Err(err) = metrics_log.append(
                now_ns(),
                node_count as u64 + edge_count as u64,
                &tick_outcome,
                node_count as u64,
                edge_count as u64,
            ) {
                error!(error = %err, "failed to append metrics row");
            }
            last_metrics = tokio::time::Instant::now();
        }

        if last_snapshot.elapsed() >= Duration::from_secs(config.snapshot_every_seconds.max(1)) {
            let guard = state.lock();
            if let Err(err) = guard.scheduler.store.snapshot(&guard.config.snapshot_path) {
                error!(error = %err, "failed to write snapshot");
            } else {
                info!(path = %guard.config.snapshot_path.display(), "wrote snapshot");
            }
            drop(guard);
            last_snapshot = tokio::time::Instant::now();
        }
    }

    #[cfg(feature = "http")]
    {
        let _ = http_handle.await;
    }

    #[allow(unreachable_code)]
    Ok(())
}

#[cfg(feature = "http")]
fn spawn_http_server(state: Arc<Mutex<AppState>>) -> tokio::task::JoinHandle<()> {
    let addr = state.lock().config.http_addr.clone();
    tokio::spawn(async move {
        let Some(addr) = addr else {
            return;
        };
        let router = melvin_engine::http::router(state);
        match tokio::net::TcpListener::bind(&addr).await {
            Ok(listener) => {
                info!(%addr, "HTTP ingest endpoint listening");
                if let Err(err) = axum::serve(listener, router).await {
                    error!(error = %err, "HTTP server exited");
                }
            }
            Err(err) => {
                error!(%addr, error = %err, "failed to bind HTTP ingest endpoint");
            }
        }
    })
}
