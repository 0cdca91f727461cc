//! API routes for the HTTP server

pub mod index;
pub mod process;
pub mod query;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Processing - with larger body limit for file uploads
        .route(
            "/process",
            post(process::process_documents).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/query", post(query::ask_question))
        .route("/index", get(index::index_status))
        .route("/info", get(info))
}

/// GET /api/info
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    let providers = state.providers();
    Json(serde_json::json!({
        "name": "docosphere",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Ask questions about your PDF and Word documents",
        "backend": config.backend,
        "embedding": {
            "provider": providers.embedder.name(),
            "model": providers.embedder.model(),
        },
        "generation": {
            "provider": providers.llm.name(),
            "model": providers.llm.model(),
        },
        "retrieval": {
            "top_k": config.retrieval.top_k,
            "structured_assessment": config.router.structured_assessment,
        },
        "chunking": config.chunking,
        "endpoints": {
            "POST /api/process": "Upload PDF/Word files and rebuild the index",
            "POST /api/query": "Ask a question",
            "GET /api/index": "Describe the current index",
            "GET /api/info": "Service information"
        }
    }))
}
