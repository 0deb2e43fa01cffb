use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::model::entity::{
    Certificate, Course, CourseSlide, ExamAttempt, ExamConfig, ExamQuestion, ExerciseQuestion,
    ProgressRecord, StoredAnswer,
};
use crate::model::error::DatabaseResult;

/// Persistence collaborator for the progression/exam core.
///
/// The contract is storage-agnostic: `write_progress` must behave as a
/// set-union merge on the completion set and a key-wise overwrite on the
/// answer map, so two concurrent writers cannot lose each other's updates.
/// `create_certificate` must reject duplicates (per attempt and per number)
/// with `DatabaseError::Conflict`.
#[async_trait::async_trait]
pub trait CourseGateway: Send + Sync {
    async fn read_course(&self, course_id: Uuid) -> DatabaseResult<Option<Course>>;

    async fn read_slides(&self, course_id: Uuid) -> DatabaseResult<Vec<CourseSlide>>;

    async fn read_exercise_question(
        &self,
        course_id: Uuid,
        slide_order: i32,
    ) -> DatabaseResult<Option<ExerciseQuestion>>;

    async fn read_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<ProgressRecord>>;

    async fn write_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        completed_orders: &BTreeSet<i32>,
        answers: &BTreeMap<i32, StoredAnswer>,
        progress_percent: i32,
    ) -> DatabaseResult<()>;

    async fn read_exam_config(&self, exam_id: Uuid) -> DatabaseResult<Option<ExamConfig>>;

    async fn read_exam_questions(&self, exam_id: Uuid) -> DatabaseResult<Vec<ExamQuestion>>;

    async fn create_exam_attempt(&self, attempt: &ExamAttempt) -> DatabaseResult<Uuid>;

    async fn read_exam_attempt(&self, attempt_id: Uuid) -> DatabaseResult<Option<ExamAttempt>>;

    async fn certificate_exists_for_attempt(&self, attempt_id: Uuid) -> DatabaseResult<bool>;

    async fn count_certificates(&self, course_id: Uuid, year: i32) -> DatabaseResult<i64>;

    async fn create_certificate(&self, certificate: &Certificate) -> DatabaseResult<Certificate>;

    async fn read_certificate(&self, certificate_id: Uuid) -> DatabaseResult<Option<Certificate>>;
}
