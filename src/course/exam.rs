use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;
use uuid::Uuid;

use crate::model::entity::{AttemptAnswer, ExamAttempt, ExamConfig, ExamQuestion};

pub type ExamResult<T> = std::result::Result<T, ExamError>;

#[derive(Debug, Error)]
pub enum ExamError {
    #[error("no questions available")]
    NoQuestions,
    #[error("select an answer before continuing")]
    NoSelection,
    #[error("selected option {0} does not exist")]
    InvalidOption(usize),
    #[error("exam session is already completed")]
    AlreadyCompleted,
    #[error("exam time expired, the session was auto-submitted")]
    TimeExpired,
    #[error("exam session is still in progress")]
    NotCompleted,
}

/// A question as fixed for one session: order and option order are final here,
/// whatever the authored order was.
#[derive(Debug, Clone)]
pub struct SessionQuestion {
    question_id: Uuid,
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
}

impl SessionQuestion {
    pub fn question_id(&self) -> Uuid {
        self.question_id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_index(&self) -> usize {
        self.correct_index
    }
}

/// Scoring result, computed exactly once per session.
#[derive(Debug, Clone)]
pub struct ExamOutcome {
    score_percent: i32,
    passed: bool,
    answers: Vec<AttemptAnswer>,
    auto_submitted: bool,
    completed_at: DateTime<Utc>,
}

impl ExamOutcome {
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

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

#[derive(Debug, Clone)]
pub struct ReviewEntry {
    pub prompt: String,
    pub options: Vec<String>,
    pub selected_option_index: Option<usize>,
    pub correct_option_index: usize,
}

/// One exam run from question load to scoring.
///
/// Built once at exam start; the shuffle happens in `start` and never again,
/// so answer indexes stay aligned with what the learner saw no matter how
/// often the session is re-read.
#[derive(Debug)]
pub struct ExamSession {
    id: Uuid,
    exam_id: Uuid,
    course_id: Uuid,
    learner_id: Uuid,
    config: ExamConfig,
    questions: Vec<SessionQuestion>,
    committed: Vec<Option<usize>>,
    cursor: usize,
    started_at: DateTime<Utc>,
    deadline: Option<DateTime<Utc>>,
    outcome: Option<ExamOutcome>,
    recorded_attempt: Option<Uuid>,
}

impl ExamSession {
    pub fn start<R: Rng + ?Sized>(
        course_id: Uuid,
        learner_id: Uuid,
        config: ExamConfig,
        questions: Vec<ExamQuestion>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> ExamResult<Self> {
        let mut session_questions: Vec<SessionQuestion> = questions
            .iter()
            .filter_map(|q| {
                let correct = q.options().iter().position(|o| o.is_correct);
                let Some(correct_index) = correct else {
                    // authored without a correct option, unanswerable
                    tracing::warn!("exam question {} has no correct option, skipping", q.id());
                    return None;
                };
                Some(SessionQuestion {
                    question_id: q.id(),
                    prompt: q.prompt().to_string(),
                    options: q.options().iter().map(|o| o.text.clone()).collect(),
                    correct_index,
                })
            })
            .collect();

        if session_questions.is_empty() {
            return Err(ExamError::NoQuestions);
        }

        if config.randomize_question_order() {
            session_questions.shuffle(rng);
        }
        if config.randomize_option_order() {
            for question in &mut session_questions {
                // shuffle an index permutation so the correct marker follows
                let mut order: Vec<usize> = (0..question.options.len()).collect();
                order.shuffle(rng);
                question.options = order.iter().map(|i| question.options[*i].clone()).collect();
                question.correct_index = order
                    .iter()
                    .position(|i| *i == question.correct_index)
                    .unwrap_or(0);
            }
        }

        let deadline = config
            .time_limit_minutes()
            .map(|minutes| now + Duration::minutes(minutes));
        let committed = vec![None; session_questions.len()];

        Ok(Self {
            id: Uuid::new_v4(),
            exam_id: config.exam_id(),
            course_id,
            learner_id,
            config,
            questions: session_questions,
            committed,
            cursor: 0,
            started_at: now,
            deadline,
            outcome: None,
            recorded_attempt: None,
        })
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

    pub fn config(&self) -> &ExamConfig {
        &self.config
    }

    pub fn questions(&self) -> &[SessionQuestion] {
        &self.questions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_completed(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&ExamOutcome> {
        self.outcome.as_ref()
    }

    /// Id of the persisted attempt row, once a caller stored one. Persisting
    /// is the caller's job; tracking it here keeps retries from writing the
    /// same session twice.
    pub fn recorded_attempt(&self) -> Option<Uuid> {
        self.recorded_attempt
    }

    pub fn mark_recorded(&mut self, attempt_id: Uuid) {
        self.recorded_attempt = Some(attempt_id);
    }

    pub fn current_question(&self) -> Option<&SessionQuestion> {
        if self.is_completed() {
            return None;
        }
        self.questions.get(self.cursor)
    }

    /// Commits the selection for the current question and moves the pointer
    /// forward. Completing the last question scores the session.
    pub fn commit_answer(
        &mut self,
        selected: Option<usize>,
        now: DateTime<Utc>,
    ) -> ExamResult<Option<&ExamOutcome>> {
        if self.is_completed() {
            return Err(ExamError::AlreadyCompleted);
        }
        if self.poll_expiry(now) {
            return Err(ExamError::TimeExpired);
        }

        let selected = selected.ok_or(ExamError::NoSelection)?;
        let question = &self.questions[self.cursor];
        if selected >= question.options.len() {
            return Err(ExamError::InvalidOption(selected));
        }

        self.committed[self.cursor] = Some(selected);
        self.cursor += 1;

        if self.cursor == self.questions.len() {
            self.complete(now, false);
            return Ok(self.outcome.as_ref());
        }
        Ok(None)
    }

    /// Force-submits if the deadline has passed. Fires at most once: a session
    /// that is already completed (manually or by a previous poll) is left
    /// untouched, so a racing timer tick and manual finish cannot both score.
    pub fn poll_expiry(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_completed() {
            return false;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.complete(now, true);
                true
            }
            _ => false,
        }
    }

    fn complete(&mut self, now: DateTime<Utc>, auto_submitted: bool) {
        debug_assert!(self.outcome.is_none());

        let total = self.questions.len();
        let answers: Vec<AttemptAnswer> = self
            .questions
            .iter()
            .zip(self.committed.iter())
            .map(|(question, selected)| AttemptAnswer {
                question_id: question.question_id,
                selected_option_index: selected.map(|s| s as i32),
                was_correct: *selected == Some(question.correct_index),
            })
            .collect();
        let correct = answers.iter().filter(|a| a.was_correct).count();
        let score = score_percent(correct, total);

        self.outcome = Some(ExamOutcome {
            score_percent: score,
            passed: score >= self.config.passing_score_percent(),
            answers,
            auto_submitted,
            completed_at: now,
        });
    }

    /// Seconds left on the clock, clamped at zero. `None` for untimed exams.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        self.deadline
            .map(|deadline| (deadline - now).num_seconds().max(0))
    }

    /// Side-by-side review, only reachable once completed. Read-only: it never
    /// touches scoring or persisted state.
    pub fn review(&self) -> ExamResult<Vec<ReviewEntry>> {
        if !self.is_completed() {
            return Err(ExamError::NotCompleted);
        }

        Ok(self
            .questions
            .iter()
            .zip(self.committed.iter())
            .map(|(question, selected)| ReviewEntry {
                prompt: question.prompt.clone(),
                options: question.options.clone(),
                selected_option_index: *selected,
                correct_option_index: question.correct_index,
            })
            .collect())
    }

    /// Builds the immutable attempt record from a completed session.
    pub fn to_attempt(&self) -> ExamResult<ExamAttempt> {
        let outcome = self.outcome.as_ref().ok_or(ExamError::NotCompleted)?;
        Ok(ExamAttempt::new(
            Uuid::new_v4(),
            self.exam_id,
            self.course_id,
            self.learner_id,
            outcome.score_percent,
            outcome.passed,
            outcome.answers.to_vec(),
            outcome.auto_submitted,
            self.started_at,
            outcome.completed_at,
        ))
    }
}

/// `round(correct / total * 100)`, half-up on the percentage itself.
pub fn score_percent(correct: usize, total: usize) -> i32 {
    if total == 0 {
        return 0;
    }
    (correct as f64 / total as f64 * 100.0).round() as i32
}

/// Countdown display, `minutes:seconds` zero-padded.
pub fn format_remaining(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
