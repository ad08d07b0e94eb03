pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::feedback::handlers as feedback;
use crate::generation::handlers as generation;
use crate::prompt::handlers as prompt;
use crate::records::handlers as records;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Deposit
        .route(
            "/api/v1/courses",
            get(records::handle_list_courses).post(records::handle_create_course),
        )
        .route("/api/v1/courses/upload", post(records::handle_upload_courses))
        .route(
            "/api/v1/exams",
            get(records::handle_list_exams).post(records::handle_create_exam),
        )
        .route("/api/v1/exams/upload", post(records::handle_upload_exams))
        // Generate
        .route("/api/v1/prompt", post(prompt::handle_build_prompt))
        .route("/api/v1/generate", post(generation::handle_generate))
        // Rate
        .route(
            "/api/v1/sessions/:id/feedback",
            get(feedback::handle_feedback_form),
        )
        .route(
            "/api/v1/feedback",
            get(feedback::handle_feedback_history).post(feedback::handle_submit_feedback),
        )
        .with_state(state)
}
