//! Health check handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub corpus: CorpusCheck,
    pub generation: GenerationCheck,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CorpusCheck {
    pub status: String,
    pub documents: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationCheck {
    pub model: String,
    pub endpoint: String,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Readiness probe - ready once at least one document is loaded.
///
/// The backend is not contacted; it is only reached per question.
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let documents = state.corpus.len();
    let corpus_up = documents > 0;

    Json(ReadyResponse {
        status: if corpus_up { "ready" } else { "not_ready" }.to_string(),
        checks: HealthChecks {
            corpus: CorpusCheck {
                status: if corpus_up { "up" } else { "empty" }.to_string(),
                documents,
            },
            generation: GenerationCheck {
                model: state.generator.model_name().to_string(),
                endpoint: state.config.generation.endpoint(),
            },
        },
    })
}
