//! Generation invoker: hands the (possibly user-edited) prompt to the external
//! text-generation model once and records the completion in the session.
//!
//! `AppState` holds an `Arc<dyn TextGenerator>`; `HttpTextGenerator` is the
//! production backend, tests plug in their own.

pub mod client;
pub mod handlers;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::{Generation, SessionStore};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model is not loaded: {message}")]
    ModelNotLoaded {
        message: String,
        estimated_time: Option<f64>,
    },

    #[error("could not read model response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model returned no completion")]
    EmptyCompletion,
}

/// One blocking prompt-in, text-out call. Implementations must not retry.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_output_length: u32)
        -> Result<String, GenerationError>;
}

/// Generates from the session's draft (or `prompt_override` when given) and
/// stores the result as the session's current generation.
///
/// On failure the session keeps whatever generation it had before.
pub async fn generate_for_session(
    generator: &dyn TextGenerator,
    sessions: &SessionStore,
    session_id: Uuid,
    prompt_override: Option<String>,
) -> Result<Generation, AppError> {
    let session = sessions.get(session_id).await?;
    let draft = session.draft.ok_or_else(|| {
        AppError::Precondition(
            "Construisez d'abord un prompt à partir d'un cours et d'un sujet d'annale.".to_string(),
        )
    })?;

    let prompt = prompt_override
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(draft.prompt);

    info!(
        "Generating for session {session_id} (mode={:?}, max_length={}, prompt_chars={})",
        draft.mode,
        draft.max_output_length,
        prompt.chars().count()
    );

    let text = generator.generate(&prompt, draft.max_output_length).await?;

    let generation = Generation {
        text,
        prompt,
        courses_used: draft.courses_used,
        generated_at: Utc::now(),
    };
    sessions.set_generation(session_id, generation.clone()).await?;

    info!(
        "Session {session_id}: generated {} characters",
        generation.text.chars().count()
    );
    Ok(generation)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records every call and answers with a canned completion.
    #[derive(Default)]
    pub struct ScriptedGenerator {
        pub reply: Option<String>,
        pub calls: Mutex<Vec<(String, u32)>>,
    }

    impl ScriptedGenerator {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Some(text.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self::default()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            prompt: &str,
            max_output_length: u32,
        ) -> Result<String, GenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), max_output_length));
            self.reply.clone().ok_or(GenerationError::ModelNotLoaded {
                message: "Model t5-base is currently loading".to_string(),
                estimated_time: Some(20.0),
            })
        }
    }
}
