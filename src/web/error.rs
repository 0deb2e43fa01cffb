use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    course::{CertificateError, ExamError},
    error::log_error,
    model::{DatabaseError, ResourceType},
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum AuthenticationError {
    // a missing cookie is not an error: the middleware builds an anonymous
    // context and the handlers answer AuthenticationRequired
    #[error("AuthenticationCookieInvalid, cookie: {cookie}. Error: {error}")]
    AuthenticationCookieInvalid {
        cookie: String,
        error: jsonwebtoken::errors::Error,
    },

    #[error("AuthenticationRequired")]
    AuthenticationRequired,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceForbidden: {resource_type:?}")]
    ResourceForbidden { resource_type: ResourceType },

    #[error("ResourceFetchError: {resource_type:?}. Error: {error}")]
    ResourceFetchError {
        resource_type: ResourceType,
        error: DatabaseError,
    },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("ValidationRejected: {message}")]
    Rejected { message: String },
}

impl AuthenticationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::AuthenticationCookieInvalid { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::AuthenticationCookieInvalid { .. } => {
                String::from("Authentication error, cookie invalid.")
            }
            Self::AuthenticationRequired => String::from("Authentication required."),
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceForbidden { .. } => StatusCode::FORBIDDEN,
            Self::ResourceFetchError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { .. } => String::from("Resource error, resource not found."),
            Self::ResourceForbidden { .. } => String::from("Resource error, resource forbidden."),
            Self::ResourceFetchError { .. } => {
                String::from("Resource error, unable to fetch resource.")
            }
        }
    }
}

impl ValidationError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::Rejected { message } => message.clone(),
        }
    }
}

fn exam_status_code(e: &ExamError) -> StatusCode {
    match e {
        ExamError::NoQuestions => StatusCode::NOT_FOUND,
        ExamError::NoSelection | ExamError::InvalidOption(_) | ExamError::NotCompleted => {
            StatusCode::BAD_REQUEST
        }
        ExamError::AlreadyCompleted | ExamError::TimeExpired => StatusCode::CONFLICT,
    }
}

fn exam_client_display(e: &ExamError) -> String {
    match e {
        ExamError::NoQuestions => String::from("No questions available for this exam."),
        ExamError::NoSelection => String::from("Select an answer before continuing."),
        ExamError::InvalidOption(_) => String::from("The selected option does not exist."),
        ExamError::AlreadyCompleted => String::from("This exam session is already completed."),
        ExamError::TimeExpired => {
            String::from("Time is up, the exam was submitted automatically.")
        }
        ExamError::NotCompleted => String::from("The exam session is not completed yet."),
    }
}

fn certificate_status_code(e: &CertificateError) -> StatusCode {
    match e {
        CertificateError::AttemptNotFound | CertificateError::CourseNotFound => {
            StatusCode::NOT_FOUND
        }
        CertificateError::NotPassing | CertificateError::AlreadyIssued => StatusCode::CONFLICT,
        CertificateError::NumberExhausted
        | CertificateError::Storage(_)
        | CertificateError::RenderFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn certificate_client_display(e: &CertificateError) -> String {
    match e {
        CertificateError::AttemptNotFound => String::from("Exam attempt not found."),
        CertificateError::CourseNotFound => String::from("Course not found."),
        CertificateError::NotPassing => {
            String::from("A certificate requires a passing exam attempt.")
        }
        CertificateError::AlreadyIssued => {
            String::from("A certificate was already issued for this attempt.")
        }
        CertificateError::NumberExhausted | CertificateError::Storage(_) => {
            String::from("Unable to issue the certificate right now.")
        }
        CertificateError::RenderFailed(_) => {
            String::from("Unable to render the certificate document.")
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("AuthenticationError - {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("ValidationError - {0}")]
    ValidationError(#[from] ValidationError),
    #[error("ExamError - {0}")]
    ExamError(#[from] ExamError),
    #[error("CertificateError - {0}")]
    CertificateError(#[from] CertificateError),
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_forbidden(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceForbidden {
            resource_type: r#type,
        })
    }

    pub fn resource_fetch_error(r#type: ResourceType, error: DatabaseError) -> Self {
        Self::ResourceError(ResourceError::ResourceFetchError {
            resource_type: r#type,
            error,
        })
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::ValidationError(ValidationError::Rejected {
            message: message.into(),
        })
    }

    pub fn auth_cookie_invalid<S: Into<String>>(
        cookie: S,
        error: jsonwebtoken::errors::Error,
    ) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationCookieInvalid {
            cookie: cookie.into(),
            error,
        })
    }

    pub fn auth_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRequired)
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::AuthenticationError(e) => e.status_code(),
            Self::ValidationError(e) => e.status_code(),
            Self::ExamError(e) => exam_status_code(e),
            Self::CertificateError(e) => certificate_status_code(e),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::AuthenticationError(e) => e.client_display(),
            Self::ValidationError(e) => e.client_display(),
            Self::ExamError(e) => exam_client_display(e),
            Self::CertificateError(e) => certificate_client_display(e),
        }
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message for the client
    pub message: String,
    /// HTTP status code (stringified)
    pub status_code: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        log_error(&self);

        let status_code = self.status_code();
        let display = self.client_display();

        let body = ErrorResponse {
            message: display,
            status_code: status_code.as_str().to_string(),
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        };

        (status_code, Json(body)).into_response()
    }
}
