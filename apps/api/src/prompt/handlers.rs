use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::record::RecordKind;
use crate::prompt::{build_prompt, select, BuiltPrompt, PromptOptions, YearRange};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BuildPromptRequest {
    /// Reuse an existing session; a new one is opened when absent or unknown.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// Positions in the course collection.
    #[serde(default)]
    pub courses: Vec<usize>,
    /// Positions in the exam collection.
    #[serde(default)]
    pub exams: Vec<usize>,
    #[serde(default)]
    pub years: YearRange,
    #[serde(flatten)]
    pub options: PromptOptions,
}

#[derive(Debug, Serialize)]
pub struct BuildPromptResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub prompt: BuiltPrompt,
}

/// POST /api/v1/prompt
///
/// Builds the default prompt from the selected courses and exam subjects and
/// stores it in the session. The client shows it for editing before calling
/// /api/v1/generate.
pub async fn handle_build_prompt(
    State(state): State<AppState>,
    Json(request): Json<BuildPromptRequest>,
) -> Result<Json<BuildPromptResponse>, AppError> {
    let courses = state.courses.load().await;
    let exams = state.exams.load().await;

    let selected_courses = select(
        &courses,
        &request.courses,
        &request.years,
        RecordKind::Course,
    )?;
    let selected_exams = select(&exams, &request.exams, &request.years, RecordKind::Exam)?;

    let prompt = build_prompt(&selected_courses, &selected_exams, &request.options)?;
    let session_id = state.sessions.put_draft(request.session_id, prompt.clone()).await;

    Ok(Json(BuildPromptResponse { session_id, prompt }))
}
