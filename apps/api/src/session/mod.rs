//! Per-user working state between requests: the default prompt last built and
//! the last successful generation. Held in memory; idle sessions are dropped
//! when new ones are created.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::prompt::BuiltPrompt;

/// Result of one successful model call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub prompt: String,
    pub courses_used: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub draft: Option<BuiltPrompt>,
    pub generation: Option<Generation>,
    pub touched_at: DateTime<Utc>,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            draft: None,
            generation: None,
            touched_at: now,
        }
    }
}

/// Bounds on the in-memory session map.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Sessions untouched for this long are dropped.
    pub idle_ttl: Duration,
    /// At most this many sessions are kept; the least recently touched go first.
    pub capacity: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::minutes(120),
            capacity: 1000,
        }
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
    limits: SessionLimits,
}

impl SessionStore {
    pub fn with_limits(limits: SessionLimits) -> Self {
        Self {
            inner: Arc::default(),
            limits,
        }
    }

    /// Stores a freshly built prompt, creating the session when `id` is
    /// absent or unknown. Returns the session id to use from now on.
    pub async fn put_draft(&self, id: Option<Uuid>, draft: BuiltPrompt) -> Uuid {
        let now = Utc::now();
        let mut sessions = self.inner.write().await;

        let id = match id.filter(|id| sessions.contains_key(id)) {
            Some(id) => id,
            None => {
                self.evict(&mut sessions, now);
                let id = Uuid::new_v4();
                sessions.insert(id, Session::new(now));
                id
            }
        };

        if let Some(session) = sessions.get_mut(&id) {
            session.draft = Some(draft);
            session.touched_at = now;
        }
        id
    }

    pub async fn set_generation(&self, id: Uuid, generation: Generation) -> Result<(), AppError> {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;
        session.touched_at = Utc::now();
        session.generation = Some(generation);
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Session, AppError> {
        self.inner
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| unknown_session(id))
    }

    /// Drops idle sessions, then the oldest ones until there is room for one more.
    fn evict(&self, sessions: &mut HashMap<Uuid, Session>, now: DateTime<Utc>) {
        let before = sessions.len();
        sessions.retain(|_, session| now - session.touched_at < self.limits.idle_ttl);

        while !sessions.is_empty() && sessions.len() >= self.limits.capacity {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, session)| session.touched_at)
                .map(|(id, _)| *id);
            if let Some(id) = oldest {
                sessions.remove(&id);
            }
        }

        let dropped = before - sessions.len();
        if dropped > 0 {
            debug!("Dropped {dropped} idle session(s), {} remain", sessions.len());
        }
    }
}

fn unknown_session(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::GenerationMode;

    fn draft(prompt: &str) -> BuiltPrompt {
        BuiltPrompt {
            prompt: prompt.to_string(),
            mode: GenerationMode::SingleQuestion,
            max_output_length: 256,
            courses_used: vec!["Optique".to_string()],
        }
    }

    #[tokio::test]
    async fn test_put_draft_creates_then_reuses_session() {
        let store = SessionStore::default();
        let id = store.put_draft(None, draft("premier")).await;
        let same = store.put_draft(Some(id), draft("second")).await;
        assert_eq!(id, same);
        assert_eq!(store.get(id).await.unwrap().draft.unwrap().prompt, "second");
    }

    #[tokio::test]
    async fn test_unknown_session_id_gets_a_new_session() {
        let store = SessionStore::default();
        let stale = Uuid::new_v4();
        let id = store.put_draft(Some(stale), draft("p")).await;
        assert_ne!(id, stale);
        assert!(store.get(stale).await.is_err());
    }

    #[tokio::test]
    async fn test_idle_sessions_are_dropped_on_insert() {
        let store = SessionStore::with_limits(SessionLimits {
            idle_ttl: Duration::zero(),
            capacity: 10,
        });
        let first = store.put_draft(None, draft("a")).await;
        let second = store.put_draft(None, draft("b")).await;

        assert!(store.get(first).await.is_err());
        assert!(store.get(second).await.is_ok());
    }

    #[tokio::test]
    async fn test_capacity_drops_least_recently_touched() {
        let store = SessionStore::with_limits(SessionLimits {
            idle_ttl: Duration::minutes(60),
            capacity: 2,
        });
        let first = store.put_draft(None, draft("a")).await;
        let second = store.put_draft(None, draft("b")).await;
        // Touching the first session makes the second the oldest.
        store.put_draft(Some(first), draft("a2")).await;
        let third = store.put_draft(None, draft("c")).await;

        assert!(store.get(first).await.is_ok());
        assert!(store.get(second).await.is_err());
        assert!(store.get(third).await.is_ok());
    }

    #[tokio::test]
    async fn test_generation_requires_existing_session() {
        let store = SessionStore::default();
        let generation = Generation {
            text: "Q1".to_string(),
            prompt: "p".to_string(),
            courses_used: vec![],
            generated_at: Utc::now(),
        };
        assert!(matches!(
            store.set_generation(Uuid::new_v4(), generation).await,
            Err(AppError::NotFound(_))
        ));
    }
}
