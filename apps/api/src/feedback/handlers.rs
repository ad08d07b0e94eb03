use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::feedback::{feedback_form, submit_feedback, FeedbackForm};
use crate::models::feedback::FeedbackRecord;
use crate::session::Generation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitFeedbackRequest {
    pub session_id: Uuid,
    /// One rating per question, in question order.
    #[serde(default)]
    pub ratings: Vec<i64>,
    #[serde(default)]
    pub overall_rating: Option<i64>,
}

async fn current_generation(state: &AppState, session_id: Uuid) -> Result<Generation, AppError> {
    state
        .sessions
        .get(session_id)
        .await?
        .generation
        .ok_or_else(|| {
            AppError::Precondition(
                "Veuillez d'abord générer des questions dans l'onglet 'Générer les questions'."
                    .to_string(),
            )
        })
}

/// GET /api/v1/sessions/:id/feedback
pub async fn handle_feedback_form(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<FeedbackForm>, AppError> {
    let generation = current_generation(&state, session_id).await?;
    Ok(Json(feedback_form(&generation, &state.feedback_policy)))
}

/// POST /api/v1/feedback
pub async fn handle_submit_feedback(
    State(state): State<AppState>,
    Json(request): Json<SubmitFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackRecord>), AppError> {
    let generation = current_generation(&state, request.session_id).await?;
    let record = submit_feedback(
        &state.feedback,
        &state.feedback_policy,
        &generation,
        &request.ratings,
        request.overall_rating,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/feedback
pub async fn handle_feedback_history(
    State(state): State<AppState>,
) -> Json<Vec<FeedbackRecord>> {
    Json(state.feedback.load().await)
}
