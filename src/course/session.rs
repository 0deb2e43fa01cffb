use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::course::exam::ExamSession;

/// How long a finished session stays readable for result polling and review.
const REVIEW_GRACE_MINUTES: i64 = 60;
/// Hard cap on any session's lifetime, recorded or not.
const MAX_SESSION_AGE_HOURS: i64 = 24;
/// How often the background sweep runs.
const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(15 * 60);

/// Live exam sessions, keyed by session id. The session itself is created
/// once at exam start and then only passed around by handle, which is what
/// makes "shuffle once" structural rather than accidental.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<ExamSession>>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: ExamSession) -> Uuid {
        let id = session.id();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub async fn get(&self, session_id: Uuid) -> Option<Arc<Mutex<ExamSession>>> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// Evicts finished sessions: anything whose attempt is recorded and whose
    /// review grace has passed, plus anything older than `max_age` outright.
    /// Sessions locked by an in-flight request are skipped until the next
    /// sweep. Returns how many were dropped.
    pub async fn sweep(&self, now: DateTime<Utc>, grace: Duration, max_age: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, handle| {
            let Ok(session) = handle.try_lock() else {
                return true;
            };
            if now - session.started_at() >= max_age {
                return false;
            }
            match session.outcome() {
                Some(outcome) if session.recorded_attempt().is_some() => {
                    now - outcome.completed_at() < grace
                }
                _ => true,
            }
        });

        before - sessions.len()
    }

    /// Spawns the recurring sweep so the registry cannot grow without bound.
    pub fn spawn_sweeper(&self) {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(SWEEP_INTERVAL);
            tick.tick().await; // the first tick fires immediately
            loop {
                tick.tick().await;
                let evicted = registry
                    .sweep(
                        Utc::now(),
                        Duration::minutes(REVIEW_GRACE_MINUTES),
                        Duration::hours(MAX_SESSION_AGE_HOURS),
                    )
                    .await;
                if evicted > 0 {
                    tracing::debug!("evicted {evicted} finished exam sessions");
                }
            }
        });
    }
}
