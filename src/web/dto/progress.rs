use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::entity::ProgressRecord;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AnswerEntry {
    slide_order: i32,
    selected_option_index: i32,
    was_correct: bool,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ProgressResponse {
    completed_orders: Vec<i32>,
    answers: Vec<AnswerEntry>,
    progress_percent: i32,
    updated_at: DateTime<Utc>,
}

impl From<&ProgressRecord> for ProgressResponse {
    fn from(record: &ProgressRecord) -> Self {
        Self {
            completed_orders: record.completed_orders().iter().copied().collect(),
            answers: record
                .answers()
                .iter()
                .map(|(order, answer)| AnswerEntry {
                    slide_order: *order,
                    selected_option_index: answer.selected_option_index,
                    was_correct: answer.was_correct,
                })
                .collect(),
            progress_percent: record.progress_percent(),
            updated_at: record.updated_at(),
        }
    }
}
