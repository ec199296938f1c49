#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use prep_core::Clock;

pub use error::{SelectionError, SessionError};
pub use sessions::{
    ActiveSession, DomainFilter, ExamDraft, ProgressQueries, SelectionEngine, SessionWorkflow,
    StartedExam,
};
