//! Python reference coverage runner.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::ports::{CoverageError, CoverageReport, CoverageRunner};

/// Runs a generated Python test under `coverage`.
///
/// Writes the test file, executes `coverage run --source=. <basename>` in
/// the test file's directory, then `coverage report`, and returns the
/// combined stdout/stderr of both as the textual report.
///
/// This runner does not parse a percentage out of that report: the numeric
/// coverage it returns is always 0.0. A scheduler driven by it with a
/// positive threshold therefore iterates until its iteration bound, and
/// consumers must not rely on a non-zero figure.
pub struct PyCoverageRunner;

fn combined_output(output: &std::process::Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        text.push_str(&stderr);
    }
    text
}

#[async_trait]
impl CoverageRunner for PyCoverageRunner {
    async fn run(
        &self,
        _source_code: &str,
        test_code: &str,
        test_path: &Path,
    ) -> Result<CoverageReport, CoverageError> {
        let test_dir = match test_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let base_name = test_path
            .file_name()
            .ok_or_else(|| CoverageError::RunFailed("test path has no file name".to_string()))?;

        // The test file lands on disk before anything runs; a failing run
        // leaves it behind as a partial artifact.
        tokio::fs::write(test_path, test_code)
            .await
            .map_err(|source| CoverageError::WriteFailed {
                path: test_path.display().to_string(),
                source,
            })?;

        debug!(test_path = %test_path.display(), "running coverage");

        let run_output = Command::new("coverage")
            .arg("run")
            .arg("--source=.")
            .arg(base_name)
            .current_dir(test_dir)
            .output()
            .await
            .map_err(|err| CoverageError::RunFailed(err.to_string()))?;

        let run_report = combined_output(&run_output);
        if !run_output.status.success() {
            return Err(CoverageError::RunFailed(format!(
                "{}: {}",
                run_output.status, run_report
            )));
        }

        let report_output = Command::new("coverage")
            .arg("report")
            .current_dir(test_dir)
            .output()
            .await
            .map_err(|err| CoverageError::ReportFailed(err.to_string()))?;

        if !report_output.status.success() {
            return Err(CoverageError::ReportFailed(format!(
                "{}: {}",
                report_output.status,
                combined_output(&report_output)
            )));
        }

        let full_report = format!("{}\n{}", run_report, combined_output(&report_output));

        Ok(CoverageReport {
            coverage: 0.0,
            report: full_report,
        })
    }
}
