//! Save file API routes

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use super::save_error;
use crate::application::dto::{AdventureResponseDto, SaveDocument, SaveStatusDto};
use crate::application::services::SaveError;
use crate::infrastructure::state::AppState;

/// Export the current adventure as a save document
pub async fn export_save(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SaveDocument>, (StatusCode, String)> {
    let document = state.save_service.export().await.map_err(save_error)?;
    Ok(Json(document))
}

/// Replace the current adventure with an uploaded save document
pub async fn import_save(
    State(state): State<Arc<AppState>>,
    Json(document): Json<serde_json::Value>,
) -> Result<Json<AdventureResponseDto>, (StatusCode, String)> {
    let _guard = state.turn_lock.try_lock().map_err(|_| {
        (
            StatusCode::CONFLICT,
            "Cannot import while a turn is in progress".to_string(),
        )
    })?;

    let session = state
        .save_service
        .import(document)
        .await
        .map_err(|e| match e {
            SaveError::PersistenceCorruption(reason) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Invalid save file: {}", reason),
            ),
            other => save_error(other),
        })?;

    Ok(Json(AdventureResponseDto::from(session)))
}

/// When the adventure was last saved
pub async fn save_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SaveStatusDto>, (StatusCode, String)> {
    let last_saved = state.save_service.last_saved().await.map_err(save_error)?;
    Ok(Json(SaveStatusDto { last_saved }))
}
