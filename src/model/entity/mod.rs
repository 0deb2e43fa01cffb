mod course;
pub use course::Course;

mod slide;
pub use slide::{CourseSlide, ExerciseOption, ExerciseQuestion, SlideKind};

mod exam;
pub use exam::{DEFAULT_PASSING_SCORE_PERCENT, ExamConfig, ExamOption, ExamQuestion};

mod progress;
pub use progress::{AppliedCompletion, ProgressRecord, StoredAnswer};

mod attempt;
pub use attempt::{AttemptAnswer, ExamAttempt};

mod certificate;
pub use certificate::Certificate;
