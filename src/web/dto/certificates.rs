use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::Certificate;

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct IssueCertificateRequest {
    pub attempt_id: Uuid,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CertificateResponse {
    id: Uuid,
    certificate_number: String,
    course_id: Uuid,
    attempt_id: Uuid,
    issued_at: DateTime<Utc>,
}

impl From<&Certificate> for CertificateResponse {
    fn from(cert: &Certificate) -> Self {
        Self {
            id: cert.id(),
            certificate_number: cert.certificate_number().to_string(),
            course_id: cert.course_id(),
            attempt_id: cert.attempt_id(),
            issued_at: cert.issued_at(),
        }
    }
}
