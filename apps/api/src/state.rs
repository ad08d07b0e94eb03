use std::sync::Arc;

use crate::config::Config;
use crate::extract::ExtractOptions;
use crate::feedback::FeedbackPolicy;
use crate::generation::TextGenerator;
use crate::models::feedback::FeedbackRecord;
use crate::models::record::{RecordKind, StudyRecord};
use crate::session::{SessionLimits, SessionStore};
use crate::store::JsonStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub courses: JsonStore<StudyRecord>,
    pub exams: JsonStore<StudyRecord>,
    pub feedback: JsonStore<FeedbackRecord>,
    /// Pluggable generation backend. Default: HttpTextGenerator.
    pub generator: Arc<dyn TextGenerator>,
    pub sessions: SessionStore,
    pub extract_options: ExtractOptions,
    pub feedback_policy: FeedbackPolicy,
}

impl AppState {
    pub fn new(config: &Config, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            courses: JsonStore::new(config.courses_path()),
            exams: JsonStore::new(config.exams_path()),
            feedback: JsonStore::new(config.feedback_path()),
            generator,
            sessions: SessionStore::with_limits(SessionLimits {
                idle_ttl: chrono::Duration::minutes(config.session_idle_minutes),
                capacity: config.max_sessions,
            }),
            extract_options: ExtractOptions {
                annotate_pdf_pages: config.annotate_pdf_pages,
            },
            feedback_policy: FeedbackPolicy {
                require_single_course: config.feedback_require_single_course,
            },
        }
    }

    pub fn records(&self, kind: RecordKind) -> &JsonStore<StudyRecord> {
        match kind {
            RecordKind::Course => &self.courses,
            RecordKind::Exam => &self.exams,
        }
    }
}
