//! Port trait for the coverage runner.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

/// Outcome of one coverage run.
#[derive(Debug, Clone)]
pub struct CoverageReport {
    /// Measured coverage in `[0, 1]`.
    pub coverage: f64,

    /// Combined textual output of the test run and coverage tooling; fed
    /// back into the next prompt on re-iteration.
    pub report: String,
}

/// Errors from coverage-runner adapters.
#[derive(Error, Debug)]
pub enum CoverageError {
    /// The test file could not be written.
    #[error("failed to write test file {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The test command could not be launched or exited with failure.
    #[error("coverage run failed: {0}")]
    RunFailed(String),

    /// The report command failed after a successful run.
    #[error("coverage report failed: {0}")]
    ReportFailed(String),
}

/// Port trait for executing a generated test against its source and
/// measuring coverage.
///
/// The runner owns writing the test file to `test_path` before execution;
/// partial artifacts may remain on disk when a run fails.
#[async_trait]
pub trait CoverageRunner: Send + Sync {
    async fn run(
        &self,
        source_code: &str,
        test_code: &str,
        test_path: &Path,
    ) -> Result<CoverageReport, CoverageError>;
}
