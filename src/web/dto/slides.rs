use serde::{Deserialize, Serialize};

use crate::course::SlideAccess;
use crate::model::entity::{CourseSlide, ExerciseQuestion, SlideKind, StoredAnswer};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SlideSummaryResponse {
    order: i32,
    kind: SlideKind,
    title: String,
    access: SlideAccess,
    navigable: bool,
}

impl SlideSummaryResponse {
    pub fn new(slide: &CourseSlide, access: SlideAccess) -> Self {
        Self {
            order: slide.order(),
            kind: slide.kind(),
            title: slide.title().to_string(),
            access,
            navigable: access.navigable(),
        }
    }
}

/// The sidebar feed: every slide with its derived lock state.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct OutlineResponse {
    pub slides: Vec<SlideSummaryResponse>,
    pub progress_percent: i32,
    pub next_available: Option<i32>,
    pub exam_order: Option<i32>,
}

/// Option texts only; correctness never leaves the server.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ExerciseQuestionResponse {
    prompt: String,
    options: Vec<String>,
}

impl From<&ExerciseQuestion> for ExerciseQuestionResponse {
    fn from(question: &ExerciseQuestion) -> Self {
        Self {
            prompt: question.prompt().to_string(),
            options: question.options().iter().map(|o| o.text.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SlideResponse {
    order: i32,
    kind: SlideKind,
    title: String,
    body: Option<String>,
    video_ref: Option<String>,
    image_ref: Option<String>,
    completed: bool,
    exercise: Option<ExerciseQuestionResponse>,
    stored_answer: Option<StoredAnswer>,
}

impl SlideResponse {
    pub fn new(
        slide: &CourseSlide,
        completed: bool,
        exercise: Option<ExerciseQuestionResponse>,
        stored_answer: Option<StoredAnswer>,
    ) -> Self {
        Self {
            order: slide.order(),
            kind: slide.kind(),
            title: slide.title().to_string(),
            body: slide.body().map(String::from),
            video_ref: slide.video_ref().map(String::from),
            image_ref: slide.image_ref().map(String::from),
            completed,
            exercise,
            stored_answer,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CompleteSlideRequest {
    pub selected_option_index: Option<i32>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CompleteSlideResponse {
    pub progress_percent: i32,
    pub next_available: Option<i32>,
    pub was_correct: Option<bool>,
    pub explanation: Option<String>,
}
