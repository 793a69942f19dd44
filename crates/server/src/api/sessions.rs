//! Session API handlers.
//!
//! Each playthrough is a `SessionEngine` registered under a UUID. Handlers
//! translate requests into engine operations and `SessionError` into HTTP
//! statuses.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use geoquiz_core::{
    DifficultyTier, RoundOutcome, SessionEngine, SessionError, SessionSnapshot, VisitAnswer,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for starting a session
#[derive(Debug, Deserialize)]
pub struct StartSessionBody {
    pub tier: DifficultyTier,
}

/// Request body for submitting a guess
#[derive(Debug, Deserialize)]
pub struct GuessBody {
    pub guess: String,
}

/// Request body for recording a visit preference
#[derive(Debug, Deserialize)]
pub struct PreferenceBody {
    pub answer: VisitAnswer,
}

/// Response carrying the session state
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub session: SessionSnapshot,
}

/// Response for a resolved round
#[derive(Debug, Serialize)]
pub struct RoundResolvedResponse {
    pub id: Uuid,
    pub outcome: RoundOutcome,
    pub session: SessionSnapshot,
}

/// Response for a revealed clue
#[derive(Debug, Serialize)]
pub struct ClueResponse {
    pub id: Uuid,
    pub clue: String,
    pub session: SessionSnapshot,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct SessionErrorResponse {
    pub error: String,
    /// Stable machine-readable error kind.
    pub code: &'static str,
}

type ApiError = (StatusCode, Json<SessionErrorResponse>);

fn error_response(status: StatusCode, code: &'static str, error: String) -> ApiError {
    (status, Json(SessionErrorResponse { error, code }))
}

fn session_error(err: SessionError) -> ApiError {
    let (status, code) = match &err {
        SessionError::ProviderUnavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "provider_unavailable")
        }
        SessionError::CandidateExhausted { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "candidate_exhausted")
        }
        SessionError::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
        SessionError::Busy => (StatusCode::CONFLICT, "busy"),
        SessionError::StaleResult => (StatusCode::CONFLICT, "stale_result"),
        SessionError::History(_) => (StatusCode::INTERNAL_SERVER_ERROR, "history_error"),
    };

    if status.is_server_error() {
        warn!("Session operation failed: {}", err);
    }

    error_response(status, code, err.to_string())
}

fn not_found(id: &str) -> ApiError {
    error_response(
        StatusCode::NOT_FOUND,
        "session_not_found",
        format!("Session not found: {}", id),
    )
}

async fn lookup(state: &AppState, id: &str) -> Result<(Uuid, Arc<SessionEngine>), ApiError> {
    let uuid = Uuid::parse_str(id).map_err(|_| not_found(id))?;
    match state.session(&uuid).await {
        Some(engine) => Ok((uuid, engine)),
        None => Err(not_found(id)),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new session in the `not_started` phase
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SessionResponse>) {
    let (id, engine) = state.create_session().await;
    let session = engine.snapshot().await;
    (StatusCode::CREATED, Json(SessionResponse { id, session }))
}

/// Get a session's current state
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (id, engine) = lookup(&state, &id).await?;
    let session = engine.snapshot().await;
    Ok(Json(SessionResponse { id, session }))
}

/// Discard a session
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (uuid, engine) = lookup(&state, &id).await?;
    // invalidate anything still in flight before dropping our handle
    engine.reset().await;
    if state.remove_session(&uuid).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&id))
    }
}

/// Start the session at a difficulty tier
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StartSessionBody>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (id, engine) = lookup(&state, &id).await?;
    let session = engine
        .start_session(body.tier)
        .await
        .map_err(session_error)?;
    Ok(Json(SessionResponse { id, session }))
}

/// Submit a guess for the current round
pub async fn submit_guess(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<GuessBody>,
) -> Result<Json<RoundResolvedResponse>, ApiError> {
    let (id, engine) = lookup(&state, &id).await?;

    if body.guess.trim().is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "empty_guess",
            "Guess must not be empty".to_string(),
        ));
    }

    let outcome = engine
        .submit_guess(&body.guess)
        .await
        .map_err(session_error)?;
    let session = engine.snapshot().await;
    Ok(Json(RoundResolvedResponse {
        id,
        outcome,
        session,
    }))
}

/// Skip the current round
pub async fn skip_round(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RoundResolvedResponse>, ApiError> {
    let (id, engine) = lookup(&state, &id).await?;
    let outcome = engine.skip().await.map_err(session_error)?;
    let session = engine.snapshot().await;
    Ok(Json(RoundResolvedResponse {
        id,
        outcome,
        session,
    }))
}

/// Reveal the clue for the current round
pub async fn reveal_clue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ClueResponse>, ApiError> {
    let (id, engine) = lookup(&state, &id).await?;
    let clue = engine.reveal_clue().await.map_err(session_error)?;
    let session = engine.snapshot().await;
    Ok(Json(ClueResponse { id, clue, session }))
}

/// Move on from a resolved round
pub async fn advance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (id, engine) = lookup(&state, &id).await?;
    let session = engine.advance().await.map_err(session_error)?;
    Ok(Json(SessionResponse { id, session }))
}

/// Record whether the player would visit the last location
pub async fn record_preference(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<PreferenceBody>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (id, engine) = lookup(&state, &id).await?;
    let session = engine
        .record_visit_preference(body.answer)
        .await
        .map_err(session_error)?;
    Ok(Json(SessionResponse { id, session }))
}

/// Reset the session to `not_started`
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (id, engine) = lookup(&state, &id).await?;
    let session = engine.reset().await;
    Ok(Json(SessionResponse { id, session }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoquiz_core::SessionPhase;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                SessionError::ProviderUnavailable("timeout".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                SessionError::CandidateExhausted { attempts: 10 },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                SessionError::InvalidTransition {
                    operation: "skip",
                    phase: SessionPhase::NotStarted,
                },
                StatusCode::CONFLICT,
            ),
            (SessionError::Busy, StatusCode::CONFLICT),
            (SessionError::StaleResult, StatusCode::CONFLICT),
        ];

        for (err, expected) in cases {
            let (status, _) = session_error(err);
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_error_body_carries_code() {
        let (_, Json(body)) = session_error(SessionError::Busy);
        assert_eq!(body.code, "busy");
        assert_eq!(body.error, "a round is already being acquired");
    }
}
