use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issued-once proof of completion, tied to exactly one passing attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    id: Uuid,
    learner_id: Uuid,
    course_id: Uuid,
    attempt_id: Uuid,
    certificate_number: String,
    issued_at: DateTime<Utc>,
}

impl Certificate {
    pub fn new(
        id: Uuid,
        learner_id: Uuid,
        course_id: Uuid,
        attempt_id: Uuid,
        certificate_number: String,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            learner_id,
            course_id,
            attempt_id,
            certificate_number,
            issued_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn learner_id(&self) -> Uuid {
        self.learner_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn certificate_number(&self) -> &str {
        &self.certificate_number
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}
