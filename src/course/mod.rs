//! The progression core: progress store, slide gating, exam engine and the
//! certificate boundary.

pub mod progress;
pub use progress::ProgressStore;

pub mod sequencer;
pub use sequencer::{CourseOutline, SlideAccess};

pub mod exam;
pub use exam::{ExamError, ExamOutcome, ExamResult, ExamSession, format_remaining};

mod session;
pub use session::SessionRegistry;

pub mod certificate;
pub use certificate::{
    CertificateDocumentRequest, CertificateError, CertificateIssuer, CertificateRenderer,
    CertificateResult,
};
