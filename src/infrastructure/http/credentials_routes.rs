//! API credential routes

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use super::save_error;
use crate::application::dto::{CredentialsStatusDto, UpdateCredentialsRequestDto};
use crate::application::ports::outbound::{ApiCredentials, ProviderKind, UnsupportedProviderError};
use crate::infrastructure::state::AppState;

/// Which provider is configured; the key itself is never returned
pub async fn get_credentials(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CredentialsStatusDto>, (StatusCode, String)> {
    let credentials = state.active_credentials().await.map_err(save_error)?;

    Ok(Json(CredentialsStatusDto {
        configured: credentials.is_some(),
        provider: credentials.map(|c| c.provider),
    }))
}

/// Store the provider and key used for every following turn
pub async fn update_credentials(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateCredentialsRequestDto>,
) -> Result<Json<CredentialsStatusDto>, (StatusCode, String)> {
    let kind: ProviderKind = req
        .provider
        .parse()
        .map_err(|e: UnsupportedProviderError| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let api_key = req.api_key.trim();
    if api_key.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "API key must not be empty".to_string()));
    }

    let credentials = ApiCredentials::new(kind, api_key);
    state
        .save_service
        .save_credentials(&credentials)
        .await
        .map_err(save_error)?;

    Ok(Json(CredentialsStatusDto {
        provider: Some(credentials.provider),
        configured: true,
    }))
}
