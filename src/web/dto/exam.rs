use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::course::{ExamSession, format_remaining};

/// Prompt and option texts for the question currently on screen. The
/// correct index stays server-side.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct QuestionView {
    prompt: String,
    options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ExamResultView {
    pub score_percent: i32,
    pub passed: bool,
    pub auto_submitted: bool,
    pub attempt_id: Option<Uuid>,
    pub recorded: bool,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SessionStateResponse {
    session_id: Uuid,
    completed: bool,
    question_index: usize,
    total_questions: usize,
    question: Option<QuestionView>,
    remaining_seconds: Option<i64>,
    remaining_display: Option<String>,
    result: Option<ExamResultView>,
}

impl SessionStateResponse {
    pub fn new(
        session_id: Uuid,
        session: &ExamSession,
        now: chrono::DateTime<chrono::Utc>,
        result: Option<ExamResultView>,
    ) -> Self {
        let remaining = if session.is_completed() {
            None
        } else {
            session.remaining_seconds(now)
        };

        Self {
            session_id,
            completed: session.is_completed(),
            question_index: session.cursor(),
            total_questions: session.questions().len(),
            question: session.current_question().map(|q| QuestionView {
                prompt: q.prompt().to_string(),
                options: q.options().to_vec(),
            }),
            remaining_seconds: remaining,
            remaining_display: remaining.map(format_remaining),
            result,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AnswerRequest {
    pub selected_option_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ReviewEntryView {
    pub prompt: String,
    pub options: Vec<String>,
    pub selected_option_index: Option<usize>,
    pub correct_option_index: usize,
    pub was_correct: bool,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ReviewResponse {
    pub score_percent: i32,
    pub passed: bool,
    pub entries: Vec<ReviewEntryView>,
}
