use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::entity::{
    Certificate, Course, CourseSlide, ExamAttempt, ExamConfig, ExamQuestion, ExerciseQuestion,
    ProgressRecord, StoredAnswer,
};
use crate::model::error::{DatabaseError, DatabaseResult};
use crate::model::CourseGateway;

#[derive(Debug, Default)]
struct Inner {
    courses: HashMap<Uuid, Course>,
    slides: HashMap<Uuid, Vec<CourseSlide>>,
    exercise_questions: HashMap<Uuid, ExerciseQuestion>,
    exam_configs: HashMap<Uuid, ExamConfig>,
    exam_questions: HashMap<Uuid, Vec<ExamQuestion>>,
    progress: HashMap<(Uuid, Uuid), ProgressRecord>,
    attempts: HashMap<Uuid, ExamAttempt>,
    certificates: HashMap<Uuid, Certificate>,
}

/// In-memory gateway. Backs the integration tests and the DB-less demo mode;
/// the whole map sits behind one RwLock so every write is atomic by
/// construction.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    inner: RwLock<Inner>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_course(&self, course: Course) {
        let mut inner = self.inner.write().await;
        inner.slides.entry(course.id()).or_default();
        inner.courses.insert(course.id(), course);
    }

    pub async fn insert_slide(&self, slide: CourseSlide) {
        let mut inner = self.inner.write().await;
        let slides = inner.slides.entry(slide.course_id()).or_default();
        slides.push(slide);
        slides.sort_by_key(|s| s.order());
    }

    pub async fn insert_exercise_question(&self, question: ExerciseQuestion) {
        let mut inner = self.inner.write().await;
        inner.exercise_questions.insert(question.slide_id(), question);
    }

    pub async fn insert_exam(&self, config: ExamConfig, questions: Vec<ExamQuestion>) {
        let mut inner = self.inner.write().await;
        inner.exam_questions.insert(config.exam_id(), questions);
        inner.exam_configs.insert(config.exam_id(), config);
    }
}

#[async_trait::async_trait]
impl CourseGateway for MemoryGateway {
    async fn read_course(&self, course_id: Uuid) -> DatabaseResult<Option<Course>> {
        Ok(self.inner.read().await.courses.get(&course_id).cloned())
    }

    async fn read_slides(&self, course_id: Uuid) -> DatabaseResult<Vec<CourseSlide>> {
        Ok(self
            .inner
            .read()
            .await
            .slides
            .get(&course_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn read_exercise_question(
        &self,
        course_id: Uuid,
        slide_order: i32,
    ) -> DatabaseResult<Option<ExerciseQuestion>> {
        let inner = self.inner.read().await;
        let slide = inner
            .slides
            .get(&course_id)
            .and_then(|slides| slides.iter().find(|s| s.order() == slide_order));

        Ok(slide.and_then(|s| inner.exercise_questions.get(&s.id()).cloned()))
    }

    async fn read_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<ProgressRecord>> {
        Ok(self
            .inner
            .read()
            .await
            .progress
            .get(&(learner_id, course_id))
            .cloned())
    }

    async fn write_progress(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        completed_orders: &BTreeSet<i32>,
        answers: &BTreeMap<i32, StoredAnswer>,
        progress_percent: i32,
    ) -> DatabaseResult<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .progress
            .entry((learner_id, course_id))
            .or_insert_with(|| ProgressRecord::empty(learner_id, course_id));

        let mut merged_orders = record.completed_orders().clone();
        merged_orders.extend(completed_orders.iter().copied());
        let mut merged_answers = record.answers().clone();
        for (order, answer) in answers {
            merged_answers.insert(*order, *answer);
        }
        let percent = record.progress_percent().max(progress_percent);

        *record = ProgressRecord::new(
            learner_id,
            course_id,
            merged_orders,
            merged_answers,
            percent,
            Utc::now(),
        );
        Ok(())
    }

    async fn read_exam_config(&self, exam_id: Uuid) -> DatabaseResult<Option<ExamConfig>> {
        Ok(self.inner.read().await.exam_configs.get(&exam_id).cloned())
    }

    async fn read_exam_questions(&self, exam_id: Uuid) -> DatabaseResult<Vec<ExamQuestion>> {
        Ok(self
            .inner
            .read()
            .await
            .exam_questions
            .get(&exam_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_exam_attempt(&self, attempt: &ExamAttempt) -> DatabaseResult<Uuid> {
        let mut inner = self.inner.write().await;
        inner.attempts.insert(attempt.id(), attempt.clone());
        Ok(attempt.id())
    }

    async fn read_exam_attempt(&self, attempt_id: Uuid) -> DatabaseResult<Option<ExamAttempt>> {
        Ok(self.inner.read().await.attempts.get(&attempt_id).cloned())
    }

    async fn certificate_exists_for_attempt(&self, attempt_id: Uuid) -> DatabaseResult<bool> {
        Ok(self
            .inner
            .read()
            .await
            .certificates
            .values()
            .any(|c| c.attempt_id() == attempt_id))
    }

    async fn count_certificates(&self, course_id: Uuid, year: i32) -> DatabaseResult<i64> {
        use chrono::Datelike;
        Ok(self
            .inner
            .read()
            .await
            .certificates
            .values()
            .filter(|c| c.course_id() == course_id && c.issued_at().year() == year)
            .count() as i64)
    }

    async fn create_certificate(&self, certificate: &Certificate) -> DatabaseResult<Certificate> {
        let mut inner = self.inner.write().await;

        let duplicate = inner.certificates.values().any(|c| {
            c.attempt_id() == certificate.attempt_id()
                || c.certificate_number() == certificate.certificate_number()
        });
        if duplicate {
            return Err(DatabaseError::Conflict(
                "certificate already issued".to_string(),
            ));
        }

        inner
            .certificates
            .insert(certificate.id(), certificate.clone());
        Ok(certificate.clone())
    }

    async fn read_certificate(&self, certificate_id: Uuid) -> DatabaseResult<Option<Certificate>> {
        Ok(self
            .inner
            .read()
            .await
            .certificates
            .get(&certificate_id)
            .cloned())
    }
}
