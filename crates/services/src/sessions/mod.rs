mod queries;
mod selection;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use queries::{DomainScore, OverallStats, PassOutlook, ProgressQueries, ScorePoint};
pub use selection::{DomainFilter, ExamDraft, SelectionEngine, DOMAIN_WEIGHTS};
pub use service::ActiveSession;
pub use workflow::{SessionWorkflow, StartedExam};
