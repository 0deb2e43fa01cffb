use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::model::entity::Certificate;
use crate::model::{CourseGateway, DatabaseError};

pub type CertificateResult<T> = std::result::Result<T, CertificateError>;

#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("exam attempt not found")]
    AttemptNotFound,
    #[error("attempt did not pass the exam")]
    NotPassing,
    #[error("certificate already issued for this attempt")]
    AlreadyIssued,
    #[error("course not found")]
    CourseNotFound,
    #[error("could not allocate a unique certificate number")]
    NumberExhausted,
    #[error("storage error: {0}")]
    Storage(#[from] DatabaseError),
    #[error("document rendering failed: {0}")]
    RenderFailed(String),
}

/// Seam to the external document-generation collaborator. The core validates
/// eligibility and hands this struct over; it never lays out a document.
#[derive(Debug, Clone)]
pub struct CertificateDocumentRequest {
    pub learner_name: String,
    pub learner_email: String,
    pub course_name: String,
    pub score_percent: i32,
    pub issued_at: DateTime<Utc>,
    pub certificate_number: String,
}

#[async_trait::async_trait]
pub trait CertificateRenderer: Send + Sync {
    async fn render(&self, request: &CertificateDocumentRequest)
    -> CertificateResult<Vec<u8>>;
}

const NUMBER_RETRIES: usize = 3;

/// Gates certificate creation behind the eligibility checks: passing attempt,
/// one certificate per attempt, unique number.
pub struct CertificateIssuer {
    gateway: Arc<dyn CourseGateway>,
}

impl CertificateIssuer {
    pub fn new(gateway: Arc<dyn CourseGateway>) -> Self {
        Self { gateway }
    }

    /// Issues a certificate for a passing attempt, or fails with an explicit
    /// integrity error. Never retried by callers; duplicates are terminal.
    pub async fn issue(
        &self,
        attempt_id: Uuid,
        now: DateTime<Utc>,
    ) -> CertificateResult<Certificate> {
        let attempt = self
            .gateway
            .read_exam_attempt(attempt_id)
            .await?
            .ok_or(CertificateError::AttemptNotFound)?;

        if !attempt.passed() {
            return Err(CertificateError::NotPassing);
        }
        if self.gateway.certificate_exists_for_attempt(attempt_id).await? {
            return Err(CertificateError::AlreadyIssued);
        }

        let course = self
            .gateway
            .read_course(attempt.course_id())
            .await?
            .ok_or(CertificateError::CourseNotFound)?;
        let year = now.year();

        // count+1 numbering is only advisory; the unique index is the real
        // guarantee, so recount and retry when a concurrent issuance wins
        for _ in 0..NUMBER_RETRIES {
            let sequence = self
                .gateway
                .count_certificates(attempt.course_id(), year)
                .await?
                + 1;
            let number = format!("CERT-{}-{}-{:04}", course.code(), year, sequence);
            let certificate = Certificate::new(
                Uuid::new_v4(),
                attempt.learner_id(),
                attempt.course_id(),
                attempt_id,
                number,
                now,
            );

            match self.gateway.create_certificate(&certificate).await {
                Ok(created) => return Ok(created),
                Err(e) if e.is_conflict() => {
                    // either this attempt raced itself, or the number collided
                    if self.gateway.certificate_exists_for_attempt(attempt_id).await? {
                        return Err(CertificateError::AlreadyIssued);
                    }
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CertificateError::NumberExhausted)
    }
}
