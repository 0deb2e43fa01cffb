use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    course::{ExamError, ExamSession},
    model::ResourceType,
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::exam::{
            AnswerRequest, ExamResultView, ReviewEntryView, ReviewResponse, SessionStateResponse,
        },
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/sessions/{session_id}", get(session_state_handler))
        .route("/sessions/{session_id}/answer", post(session_answer_handler))
        .route("/sessions/{session_id}/review", get(session_review_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn owned_session(
    state: &AppState,
    user: &AuthenticatedUser,
    session_id: Uuid,
) -> WebResult<Arc<Mutex<ExamSession>>> {
    let session = state
        .sessions()
        .get(session_id)
        .await
        .ok_or(WebError::resource_not_found(ResourceType::ExamSession))?;

    let owner = session.lock().await.learner_id();
    if owner != user.user_id() && !user.has_override_access() {
        return Err(WebError::resource_forbidden(ResourceType::ExamSession));
    }
    Ok(session)
}

/// Persists the attempt for a completed session, once. A persistence failure
/// is reported to the client, never thrown away: the next read of the session
/// retries the write.
async fn completed_result(
    state: &AppState,
    session: &mut ExamSession,
) -> Option<ExamResultView> {
    let (score_percent, passed, auto_submitted) = {
        let outcome = session.outcome()?;
        (
            outcome.score_percent(),
            outcome.passed(),
            outcome.auto_submitted(),
        )
    };

    if let Some(attempt_id) = session.recorded_attempt() {
        return Some(ExamResultView {
            score_percent,
            passed,
            auto_submitted,
            attempt_id: Some(attempt_id),
            recorded: true,
            warning: None,
        });
    }

    let attempt = match session.to_attempt() {
        Ok(attempt) => attempt,
        Err(_) => return None,
    };

    match state.gateway().create_exam_attempt(&attempt).await {
        Ok(attempt_id) => {
            session.mark_recorded(attempt_id);
            Some(ExamResultView {
                score_percent,
                passed,
                auto_submitted,
                attempt_id: Some(attempt_id),
                recorded: true,
                warning: None,
            })
        }
        Err(e) => {
            tracing::error!("failed to persist exam attempt: {e}");
            Some(ExamResultView {
                score_percent,
                passed,
                auto_submitted,
                attempt_id: None,
                recorded: false,
                warning: Some(String::from(
                    "Your score could not be recorded yet. Keep this page open and it will be retried.",
                )),
            })
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/exam/sessions/{session_id}",
    description = "Current question, countdown and completion state of a session",
    params(
        ("session_id" = Uuid, Path),
    ),
    responses(
        (status = 200, description = "Session state", body = SessionStateResponse),
        (status = 403, description = "Not your session", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "exam"
)]
pub(crate) async fn session_state_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(session_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let session = owned_session(&state, user, session_id).await?;
    let mut session = session.lock().await;

    let now = Utc::now();
    session.poll_expiry(now);
    let result = completed_result(&state, &mut session).await;

    Ok((
        StatusCode::OK,
        Json(SessionStateResponse::new(session_id, &session, now, result)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/exam/sessions/{session_id}/answer",
    description = "Commit the answer for the current question and advance",
    params(
        ("session_id" = Uuid, Path),
    ),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer committed", body = SessionStateResponse),
        (status = 400, description = "No selection, or the option does not exist", body = ErrorResponse),
        (status = 403, description = "Not your session", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Session already completed", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "exam"
)]
pub(crate) async fn session_answer_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(session_id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let session = owned_session(&state, user, session_id).await?;
    let mut session = session.lock().await;

    let now = Utc::now();
    if session.poll_expiry(now) {
        // the clock ran out before this answer arrived; the auto-submitted
        // result is returned instead of an error so the client can show it
        let result = completed_result(&state, &mut session).await;
        return Ok((
            StatusCode::OK,
            Json(SessionStateResponse::new(session_id, &session, now, result)),
        ));
    }

    session.commit_answer(req.selected_option_index, now)?;
    let result = completed_result(&state, &mut session).await;

    Ok((
        StatusCode::OK,
        Json(SessionStateResponse::new(session_id, &session, now, result)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/exam/sessions/{session_id}/review",
    description = "Per-question review of a completed session",
    params(
        ("session_id" = Uuid, Path),
    ),
    responses(
        (status = 200, description = "Session review", body = ReviewResponse),
        (status = 400, description = "Session not completed yet", body = ErrorResponse),
        (status = 403, description = "Not your session", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "exam"
)]
pub(crate) async fn session_review_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(session_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let session = owned_session(&state, user, session_id).await?;
    let session = session.lock().await;

    let entries = session.review()?;
    let outcome = session
        .outcome()
        .ok_or(WebError::from(ExamError::NotCompleted))?;

    Ok((
        StatusCode::OK,
        Json(ReviewResponse {
            score_percent: outcome.score_percent(),
            passed: outcome.passed(),
            entries: entries
                .into_iter()
                .map(|entry| ReviewEntryView {
                    was_correct: entry.selected_option_index == Some(entry.correct_option_index),
                    prompt: entry.prompt,
                    options: entry.options,
                    selected_option_index: entry.selected_option_index,
                    correct_option_index: entry.correct_option_index,
                })
                .collect(),
        }),
    ))
}
