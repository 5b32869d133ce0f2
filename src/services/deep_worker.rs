//! Iterative test-generation scheduler.
//!
//! [`DeepWorker`] owns the task table and the feedback loop: it prompts the
//! model, runs the generated test through the coverage runner, and
//! re-enqueues the task with the failure report until the coverage
//! threshold or the iteration bound is reached.
//!
//! Lifecycle invariants:
//! - a source path identifies at most one active task;
//! - an active task is either queued, executing inside the pool, or gone
//!   from the table, never two of those at once;
//! - `best_coverage` never decreases and `iterations` never exceeds the
//!   configured bound in any observable state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::models::{test_file_path, TestTask};
use crate::domain::ports::{ChatModel, CoverageRunner};
use crate::domain::SubmitError;
use crate::services::extract::extract_code;
use crate::services::worker_pool::{Job, TokioWorkerPool, WorkerPool};

/// Builds the prompt for one feedback iteration of a task.
pub type TaskPromptGenerator = Arc<dyn Fn(&TestTask) -> String + Send + Sync>;

/// How long the dispatcher waits to put a task back on the queue after the
/// pool refused it.
const REQUEUE_WAIT: Duration = Duration::from_secs(3);

/// Queue capacity per pool executor.
const TASK_QUEUE_FACTOR: usize = 5;

/// Configuration for a [`DeepWorker`].
pub struct DeepWorkerConfig {
    /// Number of pool executors; non-positive values become 1.
    pub worker_count: usize,

    /// The model that generates test code.
    pub model: Arc<dyn ChatModel>,

    /// Coverage runner invoked after each generation. Without one, a task
    /// completes right after its first generated test is stored: there is
    /// nothing to measure, so nothing to iterate on.
    pub callback: Option<Arc<dyn CoverageRunner>>,

    /// Coverage fraction below which a task iterates again.
    pub coverage_threshold: f64,

    /// Upper bound on feedback iterations per task.
    pub max_iterations: u32,

    /// Root directory of the sources under test; opaque to the scheduler.
    pub source_root: PathBuf,

    /// Root directory for generated tests; opaque to the scheduler.
    pub test_root: PathBuf,

    /// Prompt builder applied per iteration.
    pub prompt_generator: TaskPromptGenerator,
}

/// State shared between the scheduler surface, the dispatcher, and the
/// processing jobs running inside the pool. Jobs hold this (never the
/// `DeepWorker` itself), which keeps ownership one-directional:
/// scheduler → pool → queue.
struct SchedulerCore {
    model: Arc<dyn ChatModel>,
    callback: Option<Arc<dyn CoverageRunner>>,
    coverage_threshold: f64,
    max_iterations: u32,
    prompt_generator: TaskPromptGenerator,
    active: StdMutex<HashMap<String, TestTask>>,
    task_tx: mpsc::Sender<TestTask>,
    cancel: CancellationToken,
}

impl SchedulerCore {
    /// Remove the task from the table, ending its lifecycle.
    fn complete(&self, source_path: &str) {
        self.active.lock().unwrap().remove(source_path);
    }

    /// Write intermediate progress back so observers see it.
    fn store(&self, task: &TestTask) {
        if let Some(entry) = self.active.lock().unwrap().get_mut(&task.source_path) {
            *entry = task.clone();
        }
    }

    /// One feedback iteration: prompt, generate, extract, measure, decide.
    /// Any failure completes the task; failures never propagate to other
    /// tasks. The task table lock is never held across the model call or
    /// the coverage run.
    async fn process(self: Arc<Self>, mut task: TestTask) {
        info!(
            source_path = %task.source_path,
            iteration = task.iterations,
            "processing task"
        );

        let prompt = (self.prompt_generator)(&task);

        let message = match self.model.generate(&prompt).await {
            Ok(message) => message,
            Err(err) => {
                warn!(
                    source_path = %task.source_path,
                    error = %err,
                    "generation failed, completing task"
                );
                self.complete(&task.source_path);
                return;
            }
        };

        task.generated_test = extract_code(&message.content, task.language);

        let Some(runner) = self.callback.clone() else {
            info!(
                source_path = %task.source_path,
                "no coverage runner configured, completing after generation"
            );
            self.store(&task);
            self.complete(&task.source_path);
            return;
        };

        let test_path = test_file_path(Path::new(&task.source_path), task.language);
        let outcome = match runner
            .run(&task.source_code, &task.generated_test, &test_path)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    source_path = %task.source_path,
                    error = %err,
                    "coverage run failed, completing task"
                );
                self.complete(&task.source_path);
                return;
            }
        };

        task.test_report = outcome.report;
        if outcome.coverage > task.best_coverage {
            task.best_coverage = outcome.coverage;
        }

        if outcome.coverage < self.coverage_threshold && task.iterations < self.max_iterations {
            task.iterations += 1;
            self.store(&task);

            let source_path = task.source_path.clone();
            if self.task_tx.try_send(task).is_err() {
                warn!(source_path = %source_path, "failed to re-queue task: queue full");
                self.complete(&source_path);
            }
        } else {
            info!(
                source_path = %task.source_path,
                iterations = task.iterations,
                best_coverage = task.best_coverage,
                "completed test generation"
            );
            self.complete(&task.source_path);
        }
    }
}

/// The iterative feedback-loop scheduler.
pub struct DeepWorker {
    core: Arc<SchedulerCore>,
    pool: Arc<dyn WorkerPool>,
    task_rx: StdMutex<Option<mpsc::Receiver<TestTask>>>,
    dispatcher: StdMutex<Option<JoinHandle<()>>>,
    source_root: PathBuf,
    test_root: PathBuf,
}

impl DeepWorker {
    /// Create a scheduler backed by a [`TokioWorkerPool`].
    pub fn new(config: DeepWorkerConfig) -> Self {
        let worker_count = config.worker_count.max(1);
        let pool: Arc<dyn WorkerPool> = Arc::new(TokioWorkerPool::new(worker_count));
        Self::with_pool(config, pool)
    }

    /// Create a scheduler on top of an existing pool.
    pub fn with_pool(config: DeepWorkerConfig, pool: Arc<dyn WorkerPool>) -> Self {
        let worker_count = config.worker_count.max(1);
        let (task_tx, task_rx) = mpsc::channel(worker_count * TASK_QUEUE_FACTOR);

        let core = Arc::new(SchedulerCore {
            model: config.model,
            callback: config.callback,
            coverage_threshold: config.coverage_threshold,
            max_iterations: config.max_iterations,
            prompt_generator: config.prompt_generator,
            active: StdMutex::new(HashMap::new()),
            task_tx,
            cancel: CancellationToken::new(),
        });

        Self {
            core,
            pool,
            task_rx: StdMutex::new(Some(task_rx)),
            dispatcher: StdMutex::new(None),
            source_root: config.source_root,
            test_root: config.test_root,
        }
    }

    /// Submit a new test-generation task.
    ///
    /// # Errors
    /// - [`SubmitError::InvalidArgument`] for an empty source path.
    /// - [`SubmitError::DuplicateTask`] when a task for the path is active.
    /// - [`SubmitError::QueueFull`] when the queue cannot accept the task;
    ///   no task record is retained.
    /// - [`SubmitError::ShuttingDown`] once `shutdown` has been initiated.
    pub fn submit_task(&self, source_code: &str, source_path: &str) -> Result<(), SubmitError> {
        if self.core.cancel.is_cancelled() {
            return Err(SubmitError::ShuttingDown);
        }

        if source_path.trim().is_empty() {
            return Err(SubmitError::InvalidArgument(
                "source path is empty".to_string(),
            ));
        }

        let task = TestTask::new(source_code, source_path);

        // try_send cannot block, so holding the table lock across it keeps
        // insert-and-enqueue atomic with respect to other submitters.
        let mut active = self.core.active.lock().unwrap();
        if active.contains_key(source_path) {
            return Err(SubmitError::DuplicateTask(source_path.to_string()));
        }
        active.insert(source_path.to_string(), task.clone());

        match self.core.task_tx.try_send(task) {
            Ok(()) => Ok(()),
            Err(_) => {
                active.remove(source_path);
                Err(SubmitError::QueueFull)
            }
        }
    }

    /// Start the pool and the dispatcher. Idempotent.
    pub async fn run(&self) {
        self.pool.run().await;

        let Some(mut task_rx) = self.task_rx.lock().unwrap().take() else {
            return;
        };

        let core = self.core.clone();
        let pool = self.pool.clone();

        let handle = tokio::spawn(async move {
            info!("task dispatcher started");
            loop {
                tokio::select! {
                    task = task_rx.recv() => {
                        let Some(task) = task else {
                            info!("task channel closed, dispatcher stopping");
                            break;
                        };
                        Self::dispatch(&core, &pool, task).await;
                    }
                    _ = core.cancel.cancelled() => {
                        info!("cancellation requested, dispatcher stopping");
                        break;
                    }
                }
            }
        });

        *self.dispatcher.lock().unwrap() = Some(handle);
        info!("deep worker running");
    }

    /// Hand one dequeued task to the pool; on refusal, try to put it back
    /// for a bounded time and complete it if that fails too.
    async fn dispatch(core: &Arc<SchedulerCore>, pool: &Arc<dyn WorkerPool>, task: TestTask) {
        let job_core = core.clone();
        let job_task = task.clone();
        let job: Job = Box::pin(async move {
            job_core.process(job_task).await;
        });

        if let Err(err) = pool.submit(job).await {
            warn!(
                source_path = %task.source_path,
                error = %err,
                "failed to submit task to pool"
            );

            let source_path = task.source_path.clone();
            match core.task_tx.send_timeout(task, REQUEUE_WAIT).await {
                Ok(()) => info!(source_path = %source_path, "requeued task"),
                Err(_) => {
                    warn!(
                        source_path = %source_path,
                        "failed to requeue task, marking as complete"
                    );
                    core.complete(&source_path);
                }
            }
        }
    }

    /// Cancel the dispatcher, wait for it, then shut the pool down.
    /// In-flight tasks run to completion; queued tasks are dropped.
    pub async fn shutdown(&self) {
        self.core.cancel.cancel();

        let handle = self.dispatcher.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        self.pool.shutdown().await;
    }

    /// Number of tasks submitted and neither completed nor failed.
    pub fn active_task_count(&self) -> usize {
        self.core.active.lock().unwrap().len()
    }

    /// Snapshot of an active task's state, if the path is active.
    pub fn get_task_status(&self, source_path: &str) -> Option<TestTask> {
        self.core.active.lock().unwrap().get(source_path).cloned()
    }

    /// The model this scheduler generates with.
    pub fn model(&self) -> Arc<dyn ChatModel> {
        self.core.model.clone()
    }

    /// The attached coverage runner, if any.
    pub fn coverage_runner(&self) -> Option<Arc<dyn CoverageRunner>> {
        self.core.callback.clone()
    }

    /// Root directory of the sources under test.
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Root directory for generated tests.
    pub fn test_root(&self) -> &Path {
        &self.test_root
    }
}
