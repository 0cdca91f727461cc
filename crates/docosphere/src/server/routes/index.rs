//! Index status endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::retrieval::IndexManifest;
use crate::server::state::AppState;

/// GET /api/index - Manifest of the current index
pub async fn index_status(State(state): State<AppState>) -> Result<Json<IndexManifest>> {
    Ok(Json(state.store().manifest().await?))
}
