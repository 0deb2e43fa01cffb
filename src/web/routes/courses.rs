use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    course::{CourseOutline, ExamSession},
    model::{ResourceType, entity::SlideKind, entity::StoredAnswer},
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::exam::SessionStateResponse,
        dto::progress::ProgressResponse,
        dto::slides::{
            CompleteSlideRequest, CompleteSlideResponse, ExerciseQuestionResponse,
            OutlineResponse, SlideResponse, SlideSummaryResponse,
        },
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{course_id}/slides", get(course_outline_handler))
        .route("/{course_id}/slides/{order}", get(slide_get_handler))
        .route(
            "/{course_id}/slides/{order}/complete",
            post(slide_complete_handler),
        )
        .route("/{course_id}/progress", get(progress_get_handler))
        .route("/{course_id}/exam/session", post(exam_start_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct OutlineQuery {
    /// Order of the slide currently on screen, if any
    current: Option<i32>,
}

async fn load_outline(state: &AppState, course_id: Uuid) -> WebResult<CourseOutline> {
    let slides = state
        .gateway()
        .read_slides(course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Slide, e))?;

    if slides.is_empty() {
        return Err(WebError::resource_not_found(ResourceType::Course));
    }
    Ok(CourseOutline::new(slides))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/slides",
    description = "Full slide outline with per-slide access states",
    params(
        ("course_id" = Uuid, Path),
        OutlineQuery,
    ),
    responses(
        (status = 200, description = "Course outline", body = OutlineResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn course_outline_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(course_id): Path<Uuid>,
    Query(query): Query<OutlineQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let outline = load_outline(&state, course_id).await?;
    let record = state.progress().load(user.user_id(), course_id).await;
    let completed = record.completed_orders();

    let slides = outline
        .slides()
        .iter()
        .map(|slide| {
            let access = outline.access(
                slide.order(),
                query.current,
                completed,
                user.has_override_access(),
            );
            SlideSummaryResponse::new(slide, access)
        })
        .collect();

    Ok((
        StatusCode::OK,
        Json(OutlineResponse {
            slides,
            progress_percent: record.progress_percent(),
            next_available: outline.next_available(completed),
            exam_order: outline.exam_order(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/slides/{order}",
    description = "Slide content; locked slides are refused",
    params(
        ("course_id" = Uuid, Path),
        ("order" = i32, Path),
        OutlineQuery,
    ),
    responses(
        (status = 200, description = "Slide content", body = SlideResponse),
        (status = 403, description = "Slide is locked", body = ErrorResponse),
        (status = 404, description = "Slide not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn slide_get_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((course_id, order)): Path<(Uuid, i32)>,
    Query(query): Query<OutlineQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let outline = load_outline(&state, course_id).await?;
    let slide = outline
        .slide(order)
        .ok_or(WebError::resource_not_found(ResourceType::Slide))?;

    let record = state.progress().load(user.user_id(), course_id).await;
    let access = outline.access(
        order,
        query.current,
        record.completed_orders(),
        user.has_override_access(),
    );
    if !access.navigable() {
        return Err(WebError::resource_forbidden(ResourceType::Slide));
    }

    let exercise = if slide.kind() == SlideKind::Exercise {
        state
            .gateway()
            .read_exercise_question(course_id, order)
            .await
            .map_err(|e| WebError::resource_fetch_error(ResourceType::ExerciseQuestion, e))?
            .map(|q| ExerciseQuestionResponse::from(&q))
    } else {
        None
    };

    Ok((
        StatusCode::OK,
        Json(SlideResponse::new(
            slide,
            record.completed_orders().contains(&order),
            exercise,
            record.answer(order).copied(),
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/slides/{order}/complete",
    description = "Mark a slide completed; exercise slides require an answer",
    params(
        ("course_id" = Uuid, Path),
        ("order" = i32, Path),
    ),
    request_body = CompleteSlideRequest,
    responses(
        (status = 200, description = "Completion recorded", body = CompleteSlideResponse),
        (status = 400, description = "An answer is required for this slide", body = ErrorResponse),
        (status = 403, description = "Slide is locked", body = ErrorResponse),
        (status = 404, description = "Slide not found", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn slide_complete_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path((course_id, order)): Path<(Uuid, i32)>,
    Json(req): Json<CompleteSlideRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let outline = load_outline(&state, course_id).await?;
    let slide = outline
        .slide(order)
        .ok_or(WebError::resource_not_found(ResourceType::Slide))?;

    if slide.kind() == SlideKind::Exam {
        return Err(WebError::validation(
            "The exam is completed through an exam session, not the slide feed.",
        ));
    }
    if order < 1 {
        return Err(WebError::validation(
            "Intro slides are not tracked for completion.",
        ));
    }

    let record = state.progress().load(user.user_id(), course_id).await;
    let access = outline.access(
        order,
        None,
        record.completed_orders(),
        user.has_override_access(),
    );
    if !access.navigable() {
        return Err(WebError::resource_forbidden(ResourceType::Slide));
    }

    let mut was_correct = None;
    let mut explanation = None;
    let mut answer: Option<StoredAnswer> = None;

    if slide.kind() == SlideKind::Exercise {
        let selected = req.selected_option_index.ok_or_else(|| {
            WebError::validation("Select an answer before continuing.")
        })?;
        let question = state
            .gateway()
            .read_exercise_question(course_id, order)
            .await
            .map_err(|e| WebError::resource_fetch_error(ResourceType::ExerciseQuestion, e))?
            .ok_or(WebError::resource_not_found(ResourceType::ExerciseQuestion))?;

        if selected < 0 || selected as usize >= question.options().len() {
            return Err(WebError::validation("The selected option does not exist."));
        }

        let correct = question.is_correct(selected as usize);
        was_correct = Some(correct);
        explanation = question.explanation().map(String::from);
        answer = Some(StoredAnswer {
            selected_option_index: selected,
            was_correct: correct,
        });
    }

    let updated = state
        .progress()
        .mark_slide_completed(
            user.user_id(),
            course_id,
            order,
            answer,
            outline.total_content_slides(),
        )
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Progress, e))?;

    Ok((
        StatusCode::OK,
        Json(CompleteSlideResponse {
            progress_percent: updated.progress_percent(),
            next_available: outline.next_available(updated.completed_orders()),
            was_correct,
            explanation,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/progress",
    description = "The caller's progress for a course",
    params(
        ("course_id" = Uuid, Path),
    ),
    responses(
        (status = 200, description = "Progress record", body = ProgressResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn progress_get_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(course_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let record = state.progress().load(user.user_id(), course_id).await;

    Ok((StatusCode::OK, Json(ProgressResponse::from(&record))))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/exam/session",
    description = "Start an exam session; requires every content slide completed",
    params(
        ("course_id" = Uuid, Path),
    ),
    responses(
        (status = 201, description = "Exam session started", body = SessionStateResponse),
        (status = 403, description = "The exam is still locked", body = ErrorResponse),
        (status = 404, description = "Course has no exam, or the exam has no questions", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
pub(crate) async fn exam_start_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(course_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let outline = load_outline(&state, course_id).await?;
    let exam_slide = outline
        .exam_slide()
        .ok_or(WebError::resource_not_found(ResourceType::Exam))?;
    let exam_id = exam_slide
        .linked_exam_id()
        .ok_or(WebError::resource_not_found(ResourceType::Exam))?;

    if !user.has_override_access() {
        let record = state.progress().load(user.user_id(), course_id).await;
        if !outline.exam_unlocked(record.completed_orders()) {
            return Err(WebError::resource_forbidden(ResourceType::Exam));
        }
    }

    let config = state
        .gateway()
        .read_exam_config(exam_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Exam, e))?
        .ok_or(WebError::resource_not_found(ResourceType::Exam))?;
    let questions = state
        .gateway()
        .read_exam_questions(exam_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Exam, e))?;

    let now = Utc::now();
    let session = ExamSession::start(
        course_id,
        user.user_id(),
        config,
        questions,
        now,
        &mut rand::rng(),
    )?;

    let response = SessionStateResponse::new(session.id(), &session, now, None);
    state.sessions().insert(session).await;

    Ok((StatusCode::CREATED, Json(response)))
}
