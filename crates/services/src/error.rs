//! Shared error types for the services crate.

use thiserror::Error;

use prep_core::planner::PlanError;
use storage::repository::StorageError;

/// Errors emitted by the selection engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("no questions available for the requested selection")]
    NoQuestions,
}

/// Errors emitted by session services.
///
/// "Pool too small" and "already submitted" are expected, checked outcomes;
/// the caller decides whether to abort or degrade.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,

    #[error("session was already submitted")]
    AlreadySubmitted,

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
