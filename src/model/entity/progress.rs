use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the learner picked on an exercise slide and whether it was right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StoredAnswer {
    pub selected_option_index: i32,
    pub was_correct: bool,
}

/// Undo token produced by `ProgressRecord::apply`.
#[derive(Debug, Clone, Copy)]
pub struct AppliedCompletion {
    slide_order: i32,
    newly_added: bool,
    wrote_answer: bool,
    prior_answer: Option<StoredAnswer>,
}

/// Completion/answer state for one (learner, course) pair.
///
/// `completed_orders` is the source of truth; `progress_percent` is persisted
/// redundantly as a cache and always recomputable from the set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    learner_id: Uuid,
    course_id: Uuid,
    completed_orders: BTreeSet<i32>,
    answers: BTreeMap<i32, StoredAnswer>,
    progress_percent: i32,
    updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn new(
        learner_id: Uuid,
        course_id: Uuid,
        completed_orders: BTreeSet<i32>,
        answers: BTreeMap<i32, StoredAnswer>,
        progress_percent: i32,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            learner_id,
            course_id,
            completed_orders,
            answers,
            progress_percent,
            updated_at,
        }
    }

    /// Fresh record for a learner who has completed nothing yet.
    pub fn empty(learner_id: Uuid, course_id: Uuid) -> Self {
        Self::new(
            learner_id,
            course_id,
            BTreeSet::new(),
            BTreeMap::new(),
            0,
            Utc::now(),
        )
    }

    pub fn learner_id(&self) -> Uuid {
        self.learner_id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn completed_orders(&self) -> &BTreeSet<i32> {
        &self.completed_orders
    }

    pub fn answers(&self) -> &BTreeMap<i32, StoredAnswer> {
        &self.answers
    }

    pub fn answer(&self, slide_order: i32) -> Option<&StoredAnswer> {
        self.answers.get(&slide_order)
    }

    pub fn progress_percent(&self) -> i32 {
        self.progress_percent
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_completed(&self, slide_order: i32) -> bool {
        self.completed_orders.contains(&slide_order)
    }

    /// Inserts the order (no-op on repeats) and overwrites the stored answer
    /// if one is given. Returns an undo token for `revert`.
    pub fn apply(&mut self, slide_order: i32, answer: Option<StoredAnswer>) -> AppliedCompletion {
        let newly_added = self.completed_orders.insert(slide_order);
        let wrote_answer = answer.is_some();
        let prior_answer = self.answers.get(&slide_order).copied();
        if let Some(answer) = answer {
            self.answers.insert(slide_order, answer);
        }
        self.updated_at = Utc::now();

        AppliedCompletion {
            slide_order,
            newly_added,
            wrote_answer,
            prior_answer,
        }
    }

    /// Undoes a previous `apply`, restoring the exact pre-call state of both
    /// the completion set and the stored answer.
    pub fn revert(&mut self, undo: AppliedCompletion) {
        if undo.newly_added {
            self.completed_orders.remove(&undo.slide_order);
        }
        if undo.wrote_answer {
            match undo.prior_answer {
                Some(prev) => {
                    self.answers.insert(undo.slide_order, prev);
                }
                None => {
                    self.answers.remove(&undo.slide_order);
                }
            }
        }
    }

    pub fn set_progress_percent(&mut self, percent: i32) {
        self.progress_percent = percent;
    }

    /// `round(completed / total * 100)`, clamped to sane input.
    pub fn percent_of(completed_orders: &BTreeSet<i32>, total_content_slides: u32) -> i32 {
        if total_content_slides == 0 {
            return 0;
        }
        let completed = completed_orders
            .iter()
            .filter(|o| **o >= 1 && **o <= total_content_slides as i32)
            .count();
        (completed as f64 / total_content_slides as f64 * 100.0).round() as i32
    }
}
