use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PASSING_SCORE_PERCENT: i32 = 80;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamConfig {
    exam_id: Uuid,
    passing_score_percent: i32,
    time_limit_minutes: Option<i64>,
    randomize_question_order: bool,
    randomize_option_order: bool,
}

impl ExamConfig {
    pub fn new(
        exam_id: Uuid,
        passing_score_percent: Option<i32>,
        time_limit_minutes: Option<i64>,
        randomize_question_order: bool,
        randomize_option_order: bool,
    ) -> Self {
        Self {
            exam_id,
            passing_score_percent: passing_score_percent
                .unwrap_or(DEFAULT_PASSING_SCORE_PERCENT),
            time_limit_minutes,
            randomize_question_order,
            randomize_option_order,
        }
    }

    pub fn exam_id(&self) -> Uuid {
        self.exam_id
    }

    pub fn passing_score_percent(&self) -> i32 {
        self.passing_score_percent
    }

    /// `None` means the exam is untimed.
    pub fn time_limit_minutes(&self) -> Option<i64> {
        self.time_limit_minutes
    }

    pub fn randomize_question_order(&self) -> bool {
        self.randomize_question_order
    }

    pub fn randomize_option_order(&self) -> bool {
        self.randomize_option_order
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExamOption {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamQuestion {
    id: Uuid,
    exam_id: Uuid,
    position: i32,
    prompt: String,
    options: Vec<ExamOption>,
}

impl ExamQuestion {
    pub fn new(
        id: Uuid,
        exam_id: Uuid,
        position: i32,
        prompt: String,
        options: Vec<ExamOption>,
    ) -> Self {
        Self {
            id,
            exam_id,
            position,
            prompt,
            options,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn exam_id(&self) -> Uuid {
        self.exam_id
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[ExamOption] {
        &self.options
    }
}
