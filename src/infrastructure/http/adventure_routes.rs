//! Adventure API routes

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tokio::sync::MutexGuard;
use tracing::info;

use super::save_error;
use crate::application::dto::{
    AdventureResponseDto, CharacterSourceDto, QuickRollRequestDto, StartAdventureRequestDto,
    SubmitActionRequestDto, TurnResponseDto,
};
use crate::application::ports::outbound::LlmProviderPort;
use crate::application::services::{ConversationError, TurnOutcome};
use crate::domain::services::{build_character, quick_roll, RollResult};
use crate::infrastructure::state::AppState;

/// Get the current adventure
pub async fn get_adventure(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AdventureResponseDto>, (StatusCode, String)> {
    let session = state
        .save_service
        .require_session()
        .await
        .map_err(save_error)?;

    Ok(Json(AdventureResponseDto::from(session)))
}

/// Start a new adventure, replacing any stored one
pub async fn start_adventure(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartAdventureRequestDto>,
) -> Result<(StatusCode, Json<AdventureResponseDto>), (StatusCode, String)> {
    let _guard = acquire_turn(&state)?;

    let character = match req.source {
        CharacterSourceDto::Sheet { character } => *character,
        CharacterSourceDto::Creation { creation } => build_character(creation.into()),
    };

    let session = state
        .save_service
        .start_adventure(character, req.preferences)
        .await
        .map_err(save_error)?;

    Ok((StatusCode::CREATED, Json(AdventureResponseDto::from(session))))
}

/// Start over: forget the stored adventure
pub async fn delete_adventure(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, (StatusCode, String)> {
    let _guard = acquire_turn(&state)?;

    state.save_service.clear().await.map_err(save_error)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Generate the opening scene of a fresh adventure
pub async fn generate_opening(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TurnResponseDto>, (StatusCode, String)> {
    let _guard = acquire_turn(&state)?;

    let session = state
        .save_service
        .require_session()
        .await
        .map_err(save_error)?;
    if !session.needs_opening() {
        return Err(conversation_error(ConversationError::OpeningAlreadyGenerated));
    }

    let provider = provider_for_turn(&state).await?;
    let outcome = state
        .conversation_service
        .generate_opening(provider.as_ref(), session)
        .await
        .map_err(conversation_error)?;

    persist_outcome(&state, outcome).await
}

/// Submit a player action and run one turn
pub async fn submit_turn(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitActionRequestDto>,
) -> Result<Json<TurnResponseDto>, (StatusCode, String)> {
    let action = req.action.trim();
    if action.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Action must not be empty".to_string()));
    }

    let _guard = acquire_turn(&state)?;

    let session = state
        .save_service
        .require_session()
        .await
        .map_err(save_error)?;
    let provider = provider_for_turn(&state).await?;
    let outcome = state
        .conversation_service
        .submit_action(provider.as_ref(), session, action)
        .await
        .map_err(conversation_error)?;

    persist_outcome(&state, outcome).await
}

/// Roll one of the quick dice for the current character
pub async fn quick_roll_dice(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QuickRollRequestDto>,
) -> Result<Json<RollResult>, (StatusCode, String)> {
    let session = state
        .save_service
        .require_session()
        .await
        .map_err(save_error)?;

    let result = quick_roll(&mut rand::thread_rng(), req.kind, &session.character);
    info!("{}", result.label);

    Ok(Json(result))
}

fn acquire_turn(state: &AppState) -> Result<MutexGuard<'_, ()>, (StatusCode, String)> {
    state.turn_lock.try_lock().map_err(|_| {
        (
            StatusCode::CONFLICT,
            "Another turn is already in progress".to_string(),
        )
    })
}

async fn provider_for_turn(
    state: &AppState,
) -> Result<Arc<dyn LlmProviderPort>, (StatusCode, String)> {
    let credentials = state
        .active_credentials()
        .await
        .map_err(save_error)?
        .ok_or_else(|| {
            (
                StatusCode::PRECONDITION_FAILED,
                "No API credentials configured".to_string(),
            )
        })?;

    state
        .providers
        .create(&credentials)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

fn conversation_error(e: ConversationError) -> (StatusCode, String) {
    let status = match e {
        ConversationError::MalformedToolArguments(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ConversationError::OpeningAlreadyGenerated => StatusCode::CONFLICT,
    };
    (status, e.to_string())
}

async fn persist_outcome(
    state: &AppState,
    outcome: TurnOutcome,
) -> Result<Json<TurnResponseDto>, (StatusCode, String)> {
    state
        .save_service
        .save_session(&outcome.session)
        .await
        .map_err(save_error)?;

    Ok(Json(TurnResponseDto::from(outcome)))
}
