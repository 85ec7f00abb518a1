//! Optional HTTP ingest endpoint: `POST /batch` accepts a batch of
//! structured facts, renders them into teaching-file text, and ingests
//! them through the same `parse`/`ingest` path the file watcher uses, so
//! callers that already have structured facts don't need to hand-write
//! teaching-file syntax.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use melvin_core::{ingest, parse, IngestOptions};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FactInput {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub facts: Vec<FactInput>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub nodes_added: u32,
    pub edges_added: u32,
    pub duration_ms: f64,
}

fn render_teaching_doc(facts: &[FactInput]) -> String {
    let mut doc = String::from("#FACT\n");
    for fact in facts {
        doc.push_str(&format!(
            "{} {} {} [confidence={}]\n",
            fact.subject, fact.predicate, fact.object, fact.confidence
        ));
    }
    doc
}

async fn batch_handler(
    State(state): State<Arc<Mutex<AppState>>>,
    Json(req): Json<BatchRequest>,
) -> Json<BatchResponse> {
    let started = Instant::now();
    let doc_text = render_teaching_doc(&req.facts);
    let doc = parse(&doc_text);

    let mut guard = state.lock();
    let now_ns = guard.now_ns();
    let report = ingest(&mut guard.scheduler.store, &doc, IngestOptions::default(), now_ns);

    Json(BatchResponse {
        nodes_added: report.nodes_added,
        edges_added: report.edges_added,
        duration_ms: started.elapsed().as_secs_f64() * 1000.0,
    })
}

pub fn router(state: Arc<Mutex<AppState>>) -> Router {
    Router::new().route("/batch", post(batch_handler)).with_state(state)
}
