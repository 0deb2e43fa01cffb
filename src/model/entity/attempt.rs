use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One graded answer inside an attempt. `selected_option_index` is `None`
/// when the question was never answered (time-out auto-submit).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AttemptAnswer {
    pub question_id: Uuid,
    pub selected_option_index: Option<i32>,
    pub was_correct: bool,
}

/// Immutable record of a single exam session's outcome. A retake produces a
/// new attempt, never an edit of a prior one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamAttempt {
    id: Uuid,
    exam_id: Uuid,
    course_id: Uuid,
    learner_id: Uuid,
    score_percent: i32,
    passed: bool,
    answers: Vec<AttemptAnswer>,
    auto_submitted: bool,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl ExamAttempt {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        exam_id: Uuid,
        course_id: Uuid,
        learner_id: Uuid,
        score_percent: i32,
        passed: bool,
        answers: Vec<AttemptAnswer>,
        auto_submitted: bool,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            exam_id,
            course_id,
            learner_id,
            score_percent,
            passed,
            answers,
            auto_submitted,
            started_at,
            completed_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn exam_id(&self) -> Uuid {
        self.exam_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn learner_id(&self) -> Uuid {
        self.learner_id
    }

    pub fn score_percent(&self) -> i32 {
        self.score_percent
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn answers(&self) -> &[AttemptAnswer] {
        &self.answers
    }

    pub fn auto_submitted(&self) -> bool {
        self.auto_submitted
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}
