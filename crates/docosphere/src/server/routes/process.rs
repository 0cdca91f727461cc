//! Document processing endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{ProcessResponse, UploadedDocument};

/// POST /api/process - Upload files and rebuild the index from them
pub async fn process_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>> {
    let mut documents = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("upload_{}", Uuid::new_v4()));

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read {}: {}", filename, e)))?;

        tracing::info!("Received file: {} ({} bytes)", filename, data.len());
        documents.push(UploadedDocument::new(filename, data.to_vec()));
    }

    if documents.is_empty() {
        return Err(Error::InvalidRequest(
            "Please upload at least one file first.".to_string(),
        ));
    }

    let _guard = state.process_lock().lock().await;
    let response = state.pipeline().process(documents).await?;

    Ok(Json(response))
}
