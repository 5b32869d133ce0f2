//! Integration tests for the iterative feedback scheduler.

mod common;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use covsmith::domain::ports::{
    ChatError, ChatMessage, ChatModel, CoverageError, CoverageReport, CoverageRunner,
};
use covsmith::domain::SubmitError;
use covsmith::services::prompt::{feedback_prompt_generator, REPORT_FEEDBACK_PREFIX};
use covsmith::services::{DeepWorker, DeepWorkerConfig};

// ========================
// Mock implementations
// ========================

/// Deterministic model: same prompt, same answer. Records every prompt.
struct ScriptedModel {
    response: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(response: &str) -> Arc<Self> {
        Arc::new(Self {
            response: response.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<ChatMessage, ChatError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(ChatMessage::new(self.response.clone()))
    }
}

/// Deterministic coverage runner with a fixed outcome.
struct FixedRunner {
    coverage: f64,
    report: String,
    calls: AtomicUsize,
}

impl FixedRunner {
    fn new(coverage: f64, report: &str) -> Arc<Self> {
        Arc::new(Self {
            coverage,
            report: report.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CoverageRunner for FixedRunner {
    async fn run(
        &self,
        _source_code: &str,
        _test_code: &str,
        _test_path: &Path,
    ) -> Result<CoverageReport, CoverageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CoverageReport {
            coverage: self.coverage,
            report: self.report.clone(),
        })
    }
}

fn worker_config(
    model: Arc<dyn ChatModel>,
    callback: Arc<dyn CoverageRunner>,
    threshold: f64,
    max_iterations: u32,
    template: &str,
) -> DeepWorkerConfig {
    DeepWorkerConfig {
        worker_count: 2,
        model,
        callback: Some(callback),
        coverage_threshold: threshold,
        max_iterations,
        source_root: PathBuf::from("."),
        test_root: PathBuf::from("."),
        prompt_generator: feedback_prompt_generator(template.to_string(), None),
    }
}

const PY_RESPONSE: &str = "```python\nprint(1)\n```";

// ========================
// Scenarios
// ========================

#[tokio::test]
async fn test_happy_path_single_iteration() {
    let model = ScriptedModel::new(PY_RESPONSE);
    let runner = FixedRunner::new(0.9, "ok");

    let worker = DeepWorker::new(worker_config(
        model.clone(),
        runner.clone(),
        0.8,
        3,
        "Generate tests for {fileName}:\n{code}",
    ));
    worker.run().await;

    worker.submit_task("print(1)", "a.py").unwrap();

    assert!(
        common::wait_for(|| worker.active_task_count() == 0, 2_000).await,
        "task should complete"
    );

    assert_eq!(model.prompts().len(), 1, "exactly one generation");
    assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    assert!(worker.get_task_status("a.py").is_none(), "task removed");

    worker.shutdown().await;
}

#[tokio::test]
async fn test_low_coverage_iterates_then_gives_up() {
    let model = ScriptedModel::new(PY_RESPONSE);
    let runner = FixedRunner::new(0.1, "bad");

    let worker = DeepWorker::new(worker_config(
        model.clone(),
        runner.clone(),
        0.9,
        2,
        "{code}",
    ));
    worker.run().await;

    worker.submit_task("print(1)", "a.py").unwrap();

    assert!(
        common::wait_for(|| worker.active_task_count() == 0, 5_000).await,
        "task should give up at the iteration bound"
    );

    // Initial generation plus two retries.
    assert_eq!(model.prompts().len(), 3);
    assert_eq!(runner.calls.load(Ordering::SeqCst), 3);

    worker.shutdown().await;
}

#[tokio::test]
async fn test_duplicate_submission_fails_while_first_is_active() {
    let model = ScriptedModel::new(PY_RESPONSE);
    let runner = FixedRunner::new(0.9, "ok");

    // Not running: the first submission sits in the queue, still active.
    let worker = DeepWorker::new(worker_config(model, runner, 0.8, 3, "{code}"));

    worker.submit_task("print(1)", "a.py").unwrap();
    assert_eq!(
        worker.submit_task("print(1)", "a.py"),
        Err(SubmitError::DuplicateTask("a.py".to_string()))
    );
}

#[tokio::test]
async fn test_mass_submission_then_immediate_shutdown() {
    let model = ScriptedModel::new(PY_RESPONSE);
    let runner = FixedRunner::new(0.9, "ok");

    let worker = DeepWorker::new(worker_config(model, runner, 0.8, 3, "{code}"));
    worker.run().await;

    let mut accepted = 0;
    for i in 0..100 {
        match worker.submit_task("print(1)", &format!("f{}.py", i)) {
            Ok(()) => accepted += 1,
            Err(SubmitError::QueueFull) => {}
            Err(other) => panic!("unexpected submit error: {other}"),
        }
    }
    assert!(accepted > 0);

    // Shutdown must return promptly and leave the scheduler usable for
    // observation; queued tasks are dropped, in-flight ones finish.
    let start = std::time::Instant::now();
    worker.shutdown().await;
    assert!(start.elapsed() < Duration::from_secs(6));

    assert_eq!(
        worker.submit_task("print(1)", "late.py"),
        Err(SubmitError::ShuttingDown)
    );
}

#[tokio::test]
async fn test_retry_prompt_carries_previous_report() {
    let model = ScriptedModel::new(PY_RESPONSE);
    let runner = FixedRunner::new(0.1, "AssertionError: expected 3, got 2");

    let worker = DeepWorker::new(worker_config(
        model.clone(),
        runner,
        0.9,
        1,
        "Test {fileName}:\n{code}",
    ));
    worker.run().await;

    worker.submit_task("def f():\n    return 2\n", "calc.py").unwrap();

    assert!(common::wait_for(|| worker.active_task_count() == 0, 2_000).await);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);

    assert!(!prompts[0].contains(REPORT_FEEDBACK_PREFIX));
    assert!(prompts[1].contains(REPORT_FEEDBACK_PREFIX));
    assert!(prompts[1].contains("AssertionError: expected 3, got 2"));
    assert!(!prompts[1].contains("{code}"), "placeholders are substituted");

    worker.shutdown().await;
}

#[tokio::test]
async fn test_identical_runs_produce_identical_histories() {
    async fn one_run() -> Vec<String> {
        let model = ScriptedModel::new(PY_RESPONSE);
        let runner = FixedRunner::new(0.2, "two failures");

        let worker = DeepWorker::new(worker_config(
            model.clone(),
            runner,
            0.9,
            2,
            "T {fileName} {code}",
        ));
        worker.run().await;
        worker.submit_task("x = 1", "same.py").unwrap();

        assert!(common::wait_for(|| worker.active_task_count() == 0, 5_000).await);
        worker.shutdown().await;
        model.prompts()
    }

    let first = one_run().await;
    let second = one_run().await;
    assert_eq!(first, second, "deterministic stubs yield identical histories");
}

#[tokio::test]
async fn test_coverage_failure_completes_the_task_without_retry() {
    struct FailingRunner;

    #[async_trait]
    impl CoverageRunner for FailingRunner {
        async fn run(
            &self,
            _source_code: &str,
            _test_code: &str,
            _test_path: &Path,
        ) -> Result<CoverageReport, CoverageError> {
            Err(CoverageError::RunFailed("no interpreter".to_string()))
        }
    }

    let model = ScriptedModel::new(PY_RESPONSE);
    let worker = DeepWorker::new(worker_config(
        model.clone(),
        Arc::new(FailingRunner),
        0.9,
        3,
        "{code}",
    ));
    worker.run().await;

    worker.submit_task("x = 1", "a.py").unwrap();

    assert!(common::wait_for(|| worker.active_task_count() == 0, 2_000).await);
    assert_eq!(model.prompts().len(), 1, "no retry after a runner failure");

    worker.shutdown().await;
}
