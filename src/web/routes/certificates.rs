use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    course::{CertificateDocumentRequest, CertificateError},
    model::{ResourceType, entity::Certificate},
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::certificates::{CertificateResponse, IssueCertificateRequest},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(certificate_issue_handler))
        .route("/{certificate_id}", get(certificate_get_handler))
        .route(
            "/{certificate_id}/document",
            get(certificate_document_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn owned_certificate(
    state: &AppState,
    user: &AuthenticatedUser,
    certificate_id: Uuid,
) -> WebResult<Certificate> {
    let certificate = state
        .gateway()
        .read_certificate(certificate_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Certificate, e))?
        .ok_or(WebError::resource_not_found(ResourceType::Certificate))?;

    if certificate.learner_id() != user.user_id() && !user.has_override_access() {
        return Err(WebError::resource_forbidden(ResourceType::Certificate));
    }
    Ok(certificate)
}

#[utoipa::path(
    post,
    path = "/api/v1/certificates/",
    description = "Issue a certificate for a passing exam attempt",
    request_body = IssueCertificateRequest,
    responses(
        (status = 201, description = "Certificate issued", body = CertificateResponse),
        (status = 404, description = "Attempt not found", body = ErrorResponse),
        (status = 409, description = "Attempt did not pass, or a certificate already exists", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "certificates"
)]
pub(crate) async fn certificate_issue_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(req): Json<IssueCertificateRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let attempt = state
        .gateway()
        .read_exam_attempt(req.attempt_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::ExamAttempt, e))?
        .ok_or(WebError::resource_not_found(ResourceType::ExamAttempt))?;

    if attempt.learner_id() != user.user_id() && !user.has_override_access() {
        return Err(WebError::resource_forbidden(ResourceType::Certificate));
    }

    let certificate = state.issuer().issue(req.attempt_id, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(CertificateResponse::from(&certificate)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates/{certificate_id}",
    description = "Certificate metadata",
    params(
        ("certificate_id" = Uuid, Path),
    ),
    responses(
        (status = 200, description = "Certificate", body = CertificateResponse),
        (status = 403, description = "Not your certificate", body = ErrorResponse),
        (status = 404, description = "Certificate not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "certificates"
)]
pub(crate) async fn certificate_get_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(certificate_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let certificate = owned_certificate(&state, user, certificate_id).await?;

    Ok((StatusCode::OK, Json(CertificateResponse::from(&certificate))))
}

#[utoipa::path(
    get,
    path = "/api/v1/certificates/{certificate_id}/document",
    description = "Rendered certificate document",
    params(
        ("certificate_id" = Uuid, Path),
    ),
    responses(
        (status = 200, description = "Certificate document", body = Vec<u8>, content_type = "application/pdf"),
        (status = 403, description = "Not your certificate", body = ErrorResponse),
        (status = 404, description = "Certificate not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Rendering unavailable", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "certificates"
)]
pub(crate) async fn certificate_document_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(certificate_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let certificate = owned_certificate(&state, user, certificate_id).await?;

    let Some(renderer) = state.renderer() else {
        return Err(WebError::CertificateError(CertificateError::RenderFailed(
            String::from("no document renderer configured"),
        )));
    };

    let attempt = state
        .gateway()
        .read_exam_attempt(certificate.attempt_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::ExamAttempt, e))?
        .ok_or(WebError::resource_not_found(ResourceType::ExamAttempt))?;
    let course = state
        .gateway()
        .read_course(certificate.course_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Course, e))?
        .ok_or(WebError::resource_not_found(ResourceType::Course))?;

    let request = CertificateDocumentRequest {
        learner_name: user.name().to_string(),
        learner_email: user.email().to_string(),
        course_name: course.name().to_string(),
        score_percent: attempt.score_percent(),
        issued_at: certificate.issued_at(),
        certificate_number: certificate.certificate_number().to_string(),
    };
    let document = renderer.render(&request).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/pdf")],
        document,
    ))
}
