mod database;
pub use database::DbConnection;

pub mod entity;

mod error;
pub use error::{DatabaseError, DatabaseResult};

mod gateway;
pub use gateway::CourseGateway;

mod memory;
pub use memory::MemoryGateway;

mod pg;
pub use pg::PgGateway;

/// Resource tags carried inside web errors so the log line says what kind of
/// lookup fell over.
#[derive(Debug, Clone)]
pub enum ResourceType {
    Course,
    Slide,
    ExerciseQuestion,
    Progress,
    Exam,
    ExamSession,
    ExamAttempt,
    Certificate,
}
