use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::prelude::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::model::entity::{
    AttemptAnswer, Certificate, Course, CourseSlide, ExamAttempt, ExamConfig, ExamOption,
    ExamQuestion, ExerciseOption, ExerciseQuestion, ProgressRecord, SlideKind, StoredAnswer,
};
use crate::model::error::{DatabaseError, DatabaseResult};
use crate::model::{CourseGateway, DbConnection};

/// Postgres-backed gateway. Row structs stay private; everything that leaves
/// this module is a domain record.
#[derive(Debug, Clone)]
pub struct PgGateway {
    db: DbConnection,
}

impl PgGateway {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn executor(&self) -> &PgPool {
        self.db.pool()
    }
}

#[derive(Debug, FromRow)]
struct CourseRow {
    id: Uuid,
    code: String,
    name: String,
}

#[derive(Debug, FromRow)]
struct SlideRow {
    id: Uuid,
    course_id: Uuid,
    slide_order: i32,
    kind: String,
    title: String,
    body: Option<String>,
    video_ref: Option<String>,
    image_ref: Option<String>,
    linked_exam_id: Option<Uuid>,
}

impl From<SlideRow> for CourseSlide {
    fn from(row: SlideRow) -> Self {
        CourseSlide::new(
            row.id,
            row.course_id,
            row.slide_order,
            SlideKind::from(row.kind.as_str()),
            row.title,
            row.body,
            row.video_ref,
            row.image_ref,
            row.linked_exam_id,
        )
    }
}

#[derive(Debug, FromRow)]
struct ExerciseQuestionRow {
    id: Uuid,
    slide_id: Uuid,
    prompt: String,
    options: Json<Vec<ExerciseOption>>,
    explanation: Option<String>,
}

#[derive(Debug, FromRow)]
struct ExamConfigRow {
    exam_id: Uuid,
    passing_score_percent: Option<i32>,
    time_limit_minutes: Option<i64>,
    randomize_question_order: bool,
    randomize_option_order: bool,
}

#[derive(Debug, FromRow)]
struct ExamQuestionRow {
    id: Uuid,
    exam_id: Uuid,
    position: i32,
    prompt: String,
    options: Json<Vec<ExamOption>>,
}

#[derive(Debug, FromRow)]
struct ProgressRow {
    learner_id: Uuid,
    course_id: Uuid,
    completed_orders: Vec<i32>,
    answers: Json<BTreeMap<i32, StoredAnswer>>,
    progress_percent: i32,
    updated_at: DateTime<Utc>,
}

impl From<ProgressRow> for ProgressRecord {
    fn from(row: ProgressRow) -> Self {
        ProgressRecord::new(
            row.learner_id,
            row.course_id,
            row.completed_orders.into_iter().collect(),
            row.answers.0,
            row.progress_percent,
            row.updated_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct AttemptRow {
    id: Uuid,
    exam_id: Uuid,
    course_id: Uuid,
    learner_id: Uuid,
    score_percent: i32,
    passed: bool,
    answers: Json<Vec<AttemptAnswer>>,
    auto_submitted: bool,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl From<AttemptRow> for ExamAttempt {
    fn from(row: AttemptRow) -> Self {
        ExamAttempt::new(
            row.id,
            row.exam_id,
            row.course_id,
            row.learner_id,
            row.score_percent,
            row.passed,
            row.answers.0,
            row.auto_submitted,
            row.started_at,
            row.completed_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct CertificateRow {
    id: Uuid,
    learner_id: Uuid,
    course_id: Uuid,
    attempt_id: Uuid,
    certificate_number: String,
    issued_at: DateTime<Utc>,
}

impl From<CertificateRow> for Certificate {
    fn from(row: CertificateRow) -> Self {
        Certificate::new(
            row.id,
            row.learner_id,
            row.course_id,
            row.attempt_id,
            row.certificate_number,
            row.issued_at,
        )
    }
}

fn map_unique_violation(e: sqlx::Error, what: &str) -> DatabaseError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DatabaseError::Conflict(what.to_string())
        }
        _ => e.into(),
    }
}

#[async_trait::async_trait]
impl CourseGateway for PgGateway {
    async fn read_course(&self, course_id: Uuid) -> DatabaseResult<Option<Course>> {
        let row: Option<CourseRow> = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(self.executor())
            .await?;
        Ok(row.map(|r| Course::new(r.id, r.code, r.name)))
    }

    async fn read_slides(&self, course_id: Uuid) -> DatabaseResult<Vec<CourseSlide>> {
        let rows: Vec<SlideRow> = sqlx::query_as(
            "SELECT * FROM course_slides WHERE course_id = $1 ORDER BY slide_order ASC",
        )
        .bind(course_id)
        .fetch_all(self.executor())
        .await?;
        Ok(rows.into_iter().map(CourseSlide::from).collect())
    }

    async fn read_exercise_question(
        &self,
        course_id: Uuid,
        slide_order: i32,
    ) -> DatabaseResult<Option<ExerciseQuestion>> {
        let row: Option<ExerciseQuestionRow> = sqlx::query_as(
            r#"
            SELECT q.*
            FROM exercise_questions q
            JOIN course_slides s ON s.id = q.slide_id
            WHERE s.course_id = $1 AND s.slide_order = $2
            "#,
        )
        .bind(course_id)
        .bind(slide_order)
        .fetch_optional(self.executor())
        .await?;

        Ok(row.map(|r| {
            ExerciseQuestion::new(r.id, r.slide_id, r.prompt, r.options.0, r.explanation)
        }))
    }

    async fn read_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<ProgressRecord>> {
        let row: Option<ProgressRow> =
            sqlx::query_as("SELECT * FROM progress WHERE learner_id = $1 AND course_id = $2")
                .bind(learner_id)
                .bind(course_id)
                .fetch_optional(self.executor())
                .await?;
        Ok(row.map(ProgressRecord::from))
    }

    async fn write_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        completed_orders: &BTreeSet<i32>,
        answers: &BTreeMap<i32, StoredAnswer>,
        progress_percent: i32,
    ) -> DatabaseResult<()> {
        let orders: Vec<i32> = completed_orders.iter().copied().collect();

        // Union-merge on conflict. The server does the merge so two racing
        // writers both land their orders; GREATEST keeps the cached percent
        // monotone.
        sqlx::query(
            r#"
            INSERT INTO progress (learner_id, course_id, completed_orders, answers, progress_percent, updated_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (learner_id, course_id) DO UPDATE SET
                completed_orders = ARRAY(
                    SELECT DISTINCT o
                    FROM unnest(progress.completed_orders || EXCLUDED.completed_orders) AS o
                    ORDER BY o
                ),
                answers = progress.answers || EXCLUDED.answers,
                progress_percent = GREATEST(progress.progress_percent, EXCLUDED.progress_percent),
                updated_at = now()
            "#,
        )
        .bind(learner_id)
        .bind(course_id)
        .bind(&orders)
        .bind(Json(answers))
        .bind(progress_percent)
        .execute(self.executor())
        .await?;

        Ok(())
    }

    async fn read_exam_config(&self, exam_id: Uuid) -> DatabaseResult<Option<ExamConfig>> {
        let row: Option<ExamConfigRow> =
            sqlx::query_as("SELECT * FROM exam_configs WHERE exam_id = $1")
                .bind(exam_id)
                .fetch_optional(self.executor())
                .await?;

        Ok(row.map(|r| {
            ExamConfig::new(
                r.exam_id,
                r.passing_score_percent,
                r.time_limit_minutes,
                r.randomize_question_order,
                r.randomize_option_order,
            )
        }))
    }

    async fn read_exam_questions(&self, exam_id: Uuid) -> DatabaseResult<Vec<ExamQuestion>> {
        let rows: Vec<ExamQuestionRow> =
            sqlx::query_as("SELECT * FROM exam_questions WHERE exam_id = $1 ORDER BY position ASC")
                .bind(exam_id)
                .fetch_all(self.executor())
                .await?;

        Ok(rows
            .into_iter()
            .map(|r| ExamQuestion::new(r.id, r.exam_id, r.position, r.prompt, r.options.0))
            .collect())
    }

    async fn create_exam_attempt(&self, attempt: &ExamAttempt) -> DatabaseResult<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO exam_attempts
                (id, exam_id, course_id, learner_id, score_percent, passed, answers, auto_submitted, started_at, completed_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            "#,
        )
        .bind(attempt.id())
        .bind(attempt.exam_id())
        .bind(attempt.course_id())
        .bind(attempt.learner_id())
        .bind(attempt.score_percent())
        .bind(attempt.passed())
        .bind(Json(attempt.answers()))
        .bind(attempt.auto_submitted())
        .bind(attempt.started_at())
        .bind(attempt.completed_at())
        .execute(self.executor())
        .await?;

        Ok(attempt.id())
    }

    async fn read_exam_attempt(&self, attempt_id: Uuid) -> DatabaseResult<Option<ExamAttempt>> {
        let row: Option<AttemptRow> = sqlx::query_as("SELECT * FROM exam_attempts WHERE id = $1")
            .bind(attempt_id)
            .fetch_optional(self.executor())
            .await?;
        Ok(row.map(ExamAttempt::from))
    }

    async fn certificate_exists_for_attempt(&self, attempt_id: Uuid) -> DatabaseResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM certificates WHERE attempt_id = $1")
                .bind(attempt_id)
                .fetch_one(self.executor())
                .await?;
        Ok(count > 0)
    }

    async fn count_certificates(&self, course_id: Uuid, year: i32) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM certificates WHERE course_id = $1 AND date_part('year', issued_at)::int = $2",
        )
        .bind(course_id)
        .bind(year)
        .fetch_one(self.executor())
        .await?;
        Ok(count)
    }

    async fn create_certificate(&self, certificate: &Certificate) -> DatabaseResult<Certificate> {
        let result = sqlx::query(
            r#"
            INSERT INTO certificates (id, learner_id, course_id, attempt_id, certificate_number, issued_at)
            VALUES ($1,$2,$3,$4,$5,$6)
            "#,
        )
        .bind(certificate.id())
        .bind(certificate.learner_id())
        .bind(certificate.course_id())
        .bind(certificate.attempt_id())
        .bind(certificate.certificate_number())
        .bind(certificate.issued_at())
        .execute(self.executor())
        .await;

        // Unique indexes on attempt_id and certificate_number back the
        // issued-once guarantee.
        result.map_err(|e| map_unique_violation(e, "certificate already issued"))?;
        Ok(certificate.clone())
    }

    async fn read_certificate(&self, certificate_id: Uuid) -> DatabaseResult<Option<Certificate>> {
        let row: Option<CertificateRow> =
            sqlx::query_as("SELECT * FROM certificates WHERE id = $1")
                .bind(certificate_id)
                .fetch_optional(self.executor())
                .await?;
        Ok(row.map(Certificate::from))
    }
}
