use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::model::entity::{ProgressRecord, StoredAnswer};
use crate::model::{CourseGateway, DatabaseResult};

type ProgressKey = (Uuid, Uuid); // (learner_id, course_id)

/// Two-layer progress store: an in-memory authoritative cache over the
/// persistence gateway.
///
/// Writes are optimistic: the local record is updated synchronously so gating
/// unlocks immediately, then the remote record is read, merged and written
/// back. A failed remote write rolls the local record back to the exact
/// pre-call state (completion set AND answer, one consistent policy).
///
/// A per-(learner, course) mutex serializes the read-merge-write cycle, so two
/// rapid completions cannot clobber each other's append even before the
/// gateway's own union-merge semantics come into play.
pub struct ProgressStore {
    gateway: Arc<dyn CourseGateway>,
    cache: RwLock<HashMap<ProgressKey, ProgressRecord>>,
    write_locks: Mutex<HashMap<ProgressKey, Arc<Mutex<()>>>>,
}

impl ProgressStore {
    pub fn new(gateway: Arc<dyn CourseGateway>) -> Self {
        Self {
            gateway,
            cache: RwLock::new(HashMap::new()),
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn write_lock(&self, key: ProgressKey) -> Arc<Mutex<()>> {
        let mut locks = self.write_locks.lock().await;
        locks.entry(key).or_default().clone()
    }

    /// Fetches or lazily creates the record. Fails soft: a read error degrades
    /// to an empty record (content stays viewable, gating starts over from
    /// slide 1) and is not cached, so the next call retries the read.
    pub async fn load(&self, learner_id: Uuid, course_id: Uuid) -> ProgressRecord {
        let key = (learner_id, course_id);
        if let Some(record) = self.cache.read().await.get(&key) {
            return record.clone();
        }

        match self.gateway.read_progress(learner_id, course_id).await {
            Ok(Some(record)) => {
                let mut cache = self.cache.write().await;
                cache.insert(key, record.clone());
                record
            }
            Ok(None) => {
                let record = ProgressRecord::empty(learner_id, course_id);
                let mut cache = self.cache.write().await;
                cache.insert(key, record.clone());
                record
            }
            Err(e) => {
                tracing::warn!("progress read failed, degrading to empty record: {e}");
                ProgressRecord::empty(learner_id, course_id)
            }
        }
    }

    /// Pure local read, no I/O.
    pub async fn completed_set(&self, learner_id: Uuid, course_id: Uuid) -> BTreeSet<i32> {
        self.cache
            .read()
            .await
            .get(&(learner_id, course_id))
            .map(|r| r.completed_orders().clone())
            .unwrap_or_default()
    }

    /// Pure local read, no I/O.
    pub async fn answer(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        slide_order: i32,
    ) -> Option<StoredAnswer> {
        self.cache
            .read()
            .await
            .get(&(learner_id, course_id))
            .and_then(|r| r.answer(slide_order).copied())
    }

    /// The core write: optimistic local apply, then remote read-merge-write.
    /// Returns the reconciled record on success. On persistence failure the
    /// optimistic local changes are reverted and the error surfaces.
    pub async fn mark_slide_completed(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        slide_order: i32,
        answer: Option<StoredAnswer>,
        total_content_slides: u32,
    ) -> DatabaseResult<ProgressRecord> {
        let key = (learner_id, course_id);
        let lock = self.write_lock(key).await;
        let _serialized = lock.lock().await;

        // make sure a record exists locally, then apply optimistically
        self.load(learner_id, course_id).await;
        let undo = {
            let mut cache = self.cache.write().await;
            let record = cache
                .entry(key)
                .or_insert_with(|| ProgressRecord::empty(learner_id, course_id));
            record.apply(slide_order, answer)
        };

        // re-fetch the remote record so the merge runs against the latest
        // persisted state, not a stale cached copy
        let merge_result = self
            .merge_and_persist(learner_id, course_id, slide_order, answer, total_content_slides)
            .await;

        let mut cache = self.cache.write().await;
        let record = cache
            .entry(key)
            .or_insert_with(|| ProgressRecord::empty(learner_id, course_id));

        match merge_result {
            Ok(merged) => {
                *record = merged.clone();
                Ok(merged)
            }
            Err(e) => {
                record.revert(undo);
                tracing::warn!("progress write failed, optimistic state reverted: {e}");
                Err(e)
            }
        }
    }

    async fn merge_and_persist(
        &self,
        learner_id: Uuid,
        course_id: Uuid,
        slide_order: i32,
        answer: Option<StoredAnswer>,
        total_content_slides: u32,
    ) -> DatabaseResult<ProgressRecord> {
        let mut merged = self
            .gateway
            .read_progress(learner_id, course_id)
            .await?
            .unwrap_or_else(|| ProgressRecord::empty(learner_id, course_id));

        merged.apply(slide_order, answer);
        let percent = ProgressRecord::percent_of(merged.completed_orders(), total_content_slides);
        merged.set_progress_percent(percent);

        self.gateway
            .write_progress(
                learner_id,
                course_id,
                merged.completed_orders(),
                merged.answers(),
                percent,
            )
            .await?;

        Ok(merged)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::MemoryGateway;
    use crate::model::entity::{
        Certificate, Course, CourseSlide, ExamAttempt, ExamConfig, ExamQuestion, ExerciseQuestion,
    };
    use crate::model::{DatabaseError, DatabaseResult};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Gateway that can be told to fail writes, for the revert path.
    #[derive(Default)]
    struct FlakyGateway {
        inner: MemoryGateway,
        fail_writes: AtomicBool,
    }

    #[async_trait::async_trait]
    impl CourseGateway for FlakyGateway {
        async fn read_course(&self, id: Uuid) -> DatabaseResult<Option<Course>> {
            self.inner.read_course(id).await
        }
        async fn read_slides(&self, id: Uuid) -> DatabaseResult<Vec<CourseSlide>> {
            self.inner.read_slides(id).await
        }
        async fn read_exercise_question(
            &self,
            course_id: Uuid,
            slide_order: i32,
        ) -> DatabaseResult<Option<ExerciseQuestion>> {
            self.inner.read_exercise_question(course_id, slide_order).await
        }
        async fn read_progress(
            &self,
            learner_id: Uuid,
            course_id: Uuid,
        ) -> DatabaseResult<Option<ProgressRecord>> {
            self.inner.read_progress(learner_id, course_id).await
        }
        async fn write_progress(
            &self,
            learner_id: Uuid,
            course_id: Uuid,
            completed_orders: &BTreeSet<i32>,
            answers: &BTreeMap<i32, StoredAnswer>,
            progress_percent: i32,
        ) -> DatabaseResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(DatabaseError::Conflict("injected write failure".into()));
            }
            self.inner
                .write_progress(learner_id, course_id, completed_orders, answers, progress_percent)
                .await
        }
        async fn read_exam_config(&self, id: Uuid) -> DatabaseResult<Option<ExamConfig>> {
            self.inner.read_exam_config(id).await
        }
        async fn read_exam_questions(&self, id: Uuid) -> DatabaseResult<Vec<ExamQuestion>> {
            self.inner.read_exam_questions(id).await
        }
        async fn create_exam_attempt(&self, attempt: &ExamAttempt) -> DatabaseResult<Uuid> {
            self.inner.create_exam_attempt(attempt).await
        }
        async fn read_exam_attempt(&self, id: Uuid) -> DatabaseResult<Option<ExamAttempt>> {
            self.inner.read_exam_attempt(id).await
        }
        async fn certificate_exists_for_attempt(&self, id: Uuid) -> DatabaseResult<bool> {
            self.inner.certificate_exists_for_attempt(id).await
        }
        async fn count_certificates(&self, course_id: Uuid, year: i32) -> DatabaseResult<i64> {
            self.inner.count_certificates(course_id, year).await
        }
        async fn create_certificate(&self, c: &Certificate) -> DatabaseResult<Certificate> {
            self.inner.create_certificate(c).await
        }
        async fn read_certificate(&self, id: Uuid) -> DatabaseResult<Option<Certificate>> {
            self.inner.read_certificate(id).await
        }
    }

    fn store() -> (Arc<FlakyGateway>, ProgressStore) {
        let gateway = Arc::new(FlakyGateway::default());
        let store = ProgressStore::new(gateway.clone());
        (gateway, store)
    }

    #[tokio::test]
    async fn completion_is_monotonic_across_writes() {
        let (_, store) = store();
        let (learner, course) = (Uuid::new_v4(), Uuid::new_v4());

        let mut seen = BTreeSet::new();
        for order in [3, 1, 2, 7, 5] {
            let before = store.completed_set(learner, course).await;
            let record = store
                .mark_slide_completed(learner, course, order, None, 10)
                .await
                .unwrap();
            assert!(record.completed_orders().is_superset(&before));
            seen.insert(order);
            assert_eq!(record.completed_orders(), &seen);
        }
    }

    #[tokio::test]
    async fn marking_twice_is_idempotent() {
        let (_, store) = store();
        let (learner, course) = (Uuid::new_v4(), Uuid::new_v4());

        let first = store
            .mark_slide_completed(learner, course, 5, None, 10)
            .await
            .unwrap();
        let second = store
            .mark_slide_completed(learner, course, 5, None, 10)
            .await
            .unwrap();

        assert_eq!(first.completed_orders(), second.completed_orders());
        assert_eq!(first.progress_percent(), second.progress_percent());
        assert_eq!(second.progress_percent(), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_completions_never_lose_an_order() {
        let (gateway, store) = store();
        let store = Arc::new(store);
        let (learner, course) = (Uuid::new_v4(), Uuid::new_v4());

        // racing writers for distinct slides: the per-key lock plus the
        // read-merge-write cycle must union them all, not last-write-win
        let mut handles = Vec::new();
        for order in 1..=8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .mark_slide_completed(learner, course, order, None, 8)
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let expected: BTreeSet<i32> = (1..=8).collect();
        let cached = store.load(learner, course).await;
        assert_eq!(cached.completed_orders(), &expected);

        // and the persisted record agrees, none of the appends was clobbered
        let persisted = gateway
            .read_progress(learner, course)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(persisted.completed_orders(), &expected);
        assert_eq!(persisted.progress_percent(), 100);
    }

    #[tokio::test]
    async fn percent_is_recomputed_from_the_set() {
        let (_, store) = store();
        let (learner, course) = (Uuid::new_v4(), Uuid::new_v4());

        for order in 1..=3 {
            store
                .mark_slide_completed(learner, course, order, None, 7)
                .await
                .unwrap();
        }
        let record = store.load(learner, course).await;
        assert_eq!(record.progress_percent(), 43); // 3/7 -> 42.86 -> 43
    }

    #[tokio::test]
    async fn failed_write_reverts_set_and_answer() {
        let (gateway, store) = store();
        let (learner, course) = (Uuid::new_v4(), Uuid::new_v4());

        let first_answer = StoredAnswer {
            selected_option_index: 2,
            was_correct: true,
        };
        store
            .mark_slide_completed(learner, course, 4, Some(first_answer), 10)
            .await
            .unwrap();
        let before = store.load(learner, course).await;

        gateway.fail_writes.store(true, Ordering::SeqCst);
        let result = store
            .mark_slide_completed(
                learner,
                course,
                5,
                Some(StoredAnswer {
                    selected_option_index: 0,
                    was_correct: false,
                }),
                10,
            )
            .await;
        assert!(result.is_err());

        let after = store.load(learner, course).await;
        assert_eq!(after.completed_orders(), before.completed_orders());
        assert_eq!(after.answer(5), None);
        assert_eq!(after.answer(4), Some(&first_answer));
    }

    #[tokio::test]
    async fn failed_overwrite_restores_the_prior_answer() {
        let (gateway, store) = store();
        let (learner, course) = (Uuid::new_v4(), Uuid::new_v4());

        let original = StoredAnswer {
            selected_option_index: 1,
            was_correct: false,
        };
        store
            .mark_slide_completed(learner, course, 2, Some(original), 10)
            .await
            .unwrap();

        gateway.fail_writes.store(true, Ordering::SeqCst);
        let _ = store
            .mark_slide_completed(
                learner,
                course,
                2,
                Some(StoredAnswer {
                    selected_option_index: 3,
                    was_correct: true,
                }),
                10,
            )
            .await;

        // the resubmission failed, so the stored answer must be the original
        assert_eq!(store.answer(learner, course, 2).await, Some(original));
        assert!(store.completed_set(learner, course).await.contains(&2));
    }

    #[tokio::test]
    async fn read_failure_degrades_to_empty() {
        struct BrokenReads;

        #[async_trait::async_trait]
        impl CourseGateway for BrokenReads {
            async fn read_course(&self, _: Uuid) -> DatabaseResult<Option<Course>> {
                Err(DatabaseError::Conflict("down".into()))
            }
            async fn read_slides(&self, _: Uuid) -> DatabaseResult<Vec<CourseSlide>> {
                Err(DatabaseError::Conflict("down".into()))
            }
            async fn read_exercise_question(
                &self,
                _: Uuid,
                _: i32,
            ) -> DatabaseResult<Option<ExerciseQuestion>> {
                Err(DatabaseError::Conflict("down".into()))
            }
            async fn read_progress(
                &self,
                _: Uuid,
                _: Uuid,
            ) -> DatabaseResult<Option<ProgressRecord>> {
                Err(DatabaseError::Conflict("down".into()))
            }
            async fn write_progress(
                &self,
                _: Uuid,
                _: Uuid,
                _: &BTreeSet<i32>,
                _: &BTreeMap<i32, StoredAnswer>,
                _: i32,
            ) -> DatabaseResult<()> {
                Err(DatabaseError::Conflict("down".into()))
            }
            async fn read_exam_config(&self, _: Uuid) -> DatabaseResult<Option<ExamConfig>> {
                Err(DatabaseError::Conflict("down".into()))
            }
            async fn read_exam_questions(&self, _: Uuid) -> DatabaseResult<Vec<ExamQuestion>> {
                Err(DatabaseError::Conflict("down".into()))
            }
            async fn create_exam_attempt(&self, _: &ExamAttempt) -> DatabaseResult<Uuid> {
                Err(DatabaseError::Conflict("down".into()))
            }
            async fn read_exam_attempt(&self, _: Uuid) -> DatabaseResult<Option<ExamAttempt>> {
                Err(DatabaseError::Conflict("down".into()))
            }
            async fn certificate_exists_for_attempt(&self, _: Uuid) -> DatabaseResult<bool> {
                Err(DatabaseError::Conflict("down".into()))
            }
            async fn count_certificates(&self, _: Uuid, _: i32) -> DatabaseResult<i64> {
                Err(DatabaseError::Conflict("down".into()))
            }
            async fn create_certificate(&self, _: &Certificate) -> DatabaseResult<Certificate> {
                Err(DatabaseError::Conflict("down".into()))
            }
            async fn read_certificate(&self, _: Uuid) -> DatabaseResult<Option<Certificate>> {
                Err(DatabaseError::Conflict("down".into()))
            }
        }

        let store = ProgressStore::new(Arc::new(BrokenReads));
        let record = store.load(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(record.completed_orders().is_empty());
        assert_eq!(record.progress_percent(), 0);
    }
}
