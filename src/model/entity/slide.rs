use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    Content,
    Video,
    Exercise,
    Attention,
    Exam,
    Final,
}

impl From<&str> for SlideKind {
    fn from(value: &str) -> Self {
        match value {
            "video" => Self::Video,
            "exercise" => Self::Exercise,
            "attention" => Self::Attention,
            "exam" => Self::Exam,
            "final" => Self::Final,
            _ => Self::Content,
        }
    }
}

impl std::fmt::Display for SlideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Content => write!(f, "content"),
            Self::Video => write!(f, "video"),
            Self::Exercise => write!(f, "exercise"),
            Self::Attention => write!(f, "attention"),
            Self::Exam => write!(f, "exam"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// One unit of course content. Orders below 1 are intro slides that sit in
/// front of the numbered curriculum and bypass gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSlide {
    id: Uuid,
    course_id: Uuid,
    order: i32,
    kind: SlideKind,
    title: String,
    body: Option<String>,
    video_ref: Option<String>,
    image_ref: Option<String>,
    linked_exam_id: Option<Uuid>,
}

impl CourseSlide {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        course_id: Uuid,
        order: i32,
        kind: SlideKind,
        title: String,
        body: Option<String>,
        video_ref: Option<String>,
        image_ref: Option<String>,
        linked_exam_id: Option<Uuid>,
    ) -> Self {
        Self {
            id,
            course_id,
            order,
            kind,
            title,
            body,
            video_ref,
            image_ref,
            linked_exam_id,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn kind(&self) -> SlideKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn video_ref(&self) -> Option<&str> {
        self.video_ref.as_deref()
    }

    pub fn image_ref(&self) -> Option<&str> {
        self.image_ref.as_deref()
    }

    pub fn linked_exam_id(&self) -> Option<Uuid> {
        self.linked_exam_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ExerciseOption {
    pub text: String,
    pub is_correct: bool,
}

/// Single-answer multiple-choice question attached to an `exercise` slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseQuestion {
    id: Uuid,
    slide_id: Uuid,
    prompt: String,
    options: Vec<ExerciseOption>,
    explanation: Option<String>,
}

impl ExerciseQuestion {
    pub fn new(
        id: Uuid,
        slide_id: Uuid,
        prompt: String,
        options: Vec<ExerciseOption>,
        explanation: Option<String>,
    ) -> Self {
        Self {
            id,
            slide_id,
            prompt,
            options,
            explanation,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn slide_id(&self) -> Uuid {
        self.slide_id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &[ExerciseOption] {
        &self.options
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn is_correct(&self, option_index: usize) -> bool {
        self.options
            .get(option_index)
            .map(|o| o.is_correct)
            .unwrap_or(false)
    }
}
