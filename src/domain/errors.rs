//! Error types for the test-generation engine.
//!
//! Submission and pool lifecycle failures are typed so callers can react to
//! them individually; everything coming out of external collaborators (LLM,
//! coverage runner, file I/O) is wrapped by the port-specific error enums in
//! `domain::ports`.

use thiserror::Error;

/// Errors raised by the worker pool lifecycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool was never started.
    #[error("worker pool is not running")]
    NotRunning,

    /// The pool has begun (or finished) shutting down.
    #[error("worker pool is shutting down")]
    ShuttingDown,

    /// The job queue could not accept the submission within its bounded wait.
    #[error("worker pool queue is full")]
    QueueFull,
}

impl PoolError {
    /// Returns true if a later submission could succeed without intervention.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::QueueFull)
    }
}

/// Errors raised when submitting a test-generation task to a scheduler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The submission was malformed (empty source path).
    #[error("invalid submission: {0}")]
    InvalidArgument(String),

    /// A task for the same source path is already active.
    #[error("already processing tests for {0}")]
    DuplicateTask(String),

    /// The task queue is saturated; no task record was retained.
    #[error("task queue is full")]
    QueueFull,

    /// The scheduler has been shut down and accepts no further work.
    #[error("scheduler is shutting down")]
    ShuttingDown,
}

impl SubmitError {
    /// Returns true if resubmitting later could succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::QueueFull | Self::DuplicateTask(_))
    }

    /// Returns true if the submission itself was unusable.
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}
