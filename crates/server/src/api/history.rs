//! Score history API handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use geoquiz_core::ScoreHistory;

use super::sessions::SessionErrorResponse;
use crate::state::AppState;

/// Last final score per tier; tiers never completed are omitted.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub scores: ScoreHistory,
}

/// Get the persisted score history
pub async fn get_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HistoryResponse>, (StatusCode, Json<SessionErrorResponse>)> {
    match state.history().history() {
        Ok(scores) => Ok(Json(HistoryResponse { scores })),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SessionErrorResponse {
                error: e.to_string(),
                code: "history_error",
            }),
        )),
    }
}
