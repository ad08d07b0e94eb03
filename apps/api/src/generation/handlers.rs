use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::feedback::split_questions;
use crate::generation::generate_for_session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub session_id: Uuid,
    /// The user's edited prompt; the session's default prompt when absent.
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub session_id: Uuid,
    pub generated_text: String,
    pub questions: Vec<String>,
    pub courses_used: Vec<String>,
}

/// POST /api/v1/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let generation = generate_for_session(
        state.generator.as_ref(),
        &state.sessions,
        request.session_id,
        request.prompt,
    )
    .await?;

    Ok(Json(GenerateResponse {
        session_id: request.session_id,
        questions: split_questions(&generation.text),
        generated_text: generation.text,
        courses_used: generation.courses_used,
    }))
}
