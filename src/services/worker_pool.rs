//! Bounded worker pool for task closures.
//!
//! Executors are long-lived tokio tasks pulling jobs off one bounded
//! channel. A job panic is isolated from its executor: jobs run through a
//! nested `tokio::spawn`, so unwinding surfaces as a `JoinError` that the
//! executor logs before moving on. Termination is broadcast; `shutdown`
//! waits for executors to finish their in-flight jobs, bounded by a 5 s
//! timeout.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::{broadcast, mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::domain::PoolError;

/// A unit of work submitted to the pool.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// How long a submission waits for queue space before failing.
const SUBMIT_WAIT: Duration = Duration::from_millis(100);

/// How long shutdown waits for executors to drain.
const SHUTDOWN_WAIT: Duration = Duration::from_secs(5);

/// Queue capacity per executor.
const QUEUE_FACTOR: usize = 10;

/// Bounded concurrent executor of opaque jobs.
#[async_trait]
pub trait WorkerPool: Send + Sync {
    /// Enqueue a job for execution. Fails with [`PoolError::NotRunning`]
    /// before `run`, [`PoolError::ShuttingDown`] after `shutdown` has begun,
    /// and [`PoolError::QueueFull`] when the queue cannot accept the job
    /// within a short bounded wait.
    async fn submit(&self, job: Job) -> Result<(), PoolError>;

    /// Start the executors. Idempotent.
    async fn run(&self);

    /// Signal termination and wait for executors to drain. Idempotent;
    /// after this returns, `submit` is guaranteed to fail.
    async fn shutdown(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolState {
    New,
    Running,
    ShuttingDown,
    Stopped,
}

/// Tokio-backed [`WorkerPool`].
pub struct TokioWorkerPool {
    worker_count: usize,
    job_tx: mpsc::Sender<Job>,
    job_rx: StdMutex<Option<mpsc::Receiver<Job>>>,
    quit_tx: broadcast::Sender<()>,
    state: StdMutex<PoolState>,
    workers: StdMutex<Vec<JoinHandle<()>>>,
}

impl TokioWorkerPool {
    /// Create a pool with `worker_count` executors (at least one). The job
    /// queue holds up to ten jobs per executor to absorb bursts without
    /// unbounded memory.
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (job_tx, job_rx) = mpsc::channel(worker_count * QUEUE_FACTOR);
        let (quit_tx, _) = broadcast::channel(1);

        Self {
            worker_count,
            job_tx,
            job_rx: StdMutex::new(Some(job_rx)),
            quit_tx,
            state: StdMutex::new(PoolState::New),
            workers: StdMutex::new(Vec::new()),
        }
    }

    async fn executor_loop(
        worker_id: usize,
        jobs: Arc<AsyncMutex<mpsc::Receiver<Job>>>,
        mut quit_rx: broadcast::Receiver<()>,
    ) {
        debug!(worker_id, "pool executor started");

        loop {
            // Hold the receiver lock only while waiting, never while running
            // a job, so the other executors can keep dequeuing.
            let job = {
                let mut rx = jobs.lock().await;
                tokio::select! {
                    job = rx.recv() => job,
                    _ = quit_rx.recv() => None,
                }
            };

            let Some(job) = job else { break };

            if let Err(join_err) = tokio::spawn(job).await {
                if join_err.is_panic() {
                    error!(worker_id, "job panicked; executor continues");
                }
            }
        }

        debug!(worker_id, "pool executor stopped");
    }
}

#[async_trait]
impl WorkerPool for TokioWorkerPool {
    async fn submit(&self, job: Job) -> Result<(), PoolError> {
        {
            let state = self.state.lock().unwrap();
            match *state {
                PoolState::New => return Err(PoolError::NotRunning),
                PoolState::ShuttingDown | PoolState::Stopped => {
                    return Err(PoolError::ShuttingDown)
                }
                PoolState::Running => {}
            }
        }

        // The running check above races with shutdown; re-reading the state
        // after subscribing and watching the termination channel inside the
        // select closes the race (shutdown flips the state before it
        // broadcasts, so a signal sent after the re-read is always seen).
        let mut quit_rx = self.quit_tx.subscribe();
        if *self.state.lock().unwrap() != PoolState::Running {
            return Err(PoolError::ShuttingDown);
        }
        tokio::select! {
            result = self.job_tx.send_timeout(job, SUBMIT_WAIT) => {
                result.map_err(|err| match err {
                    mpsc::error::SendTimeoutError::Timeout(_) => PoolError::QueueFull,
                    mpsc::error::SendTimeoutError::Closed(_) => PoolError::ShuttingDown,
                })
            }
            _ = quit_rx.recv() => Err(PoolError::ShuttingDown),
        }
    }

    async fn run(&self) {
        {
            let mut state = self.state.lock().unwrap();
            if *state != PoolState::New {
                return;
            }
            *state = PoolState::Running;
        }

        let receiver = self
            .job_rx
            .lock()
            .unwrap()
            .take()
            .expect("job receiver is present until the first run");
        let jobs = Arc::new(AsyncMutex::new(receiver));

        let mut handles = Vec::with_capacity(self.worker_count);
        for worker_id in 0..self.worker_count {
            let jobs = jobs.clone();
            let quit_rx = self.quit_tx.subscribe();
            handles.push(tokio::spawn(Self::executor_loop(worker_id, jobs, quit_rx)));
        }

        *self.workers.lock().unwrap() = handles;
        debug!(worker_count = self.worker_count, "worker pool running");
    }

    async fn shutdown(&self) {
        {
            let mut state = self.state.lock().unwrap();
            match *state {
                PoolState::ShuttingDown | PoolState::Stopped => return,
                _ => *state = PoolState::ShuttingDown,
            }
        }

        let _ = self.quit_tx.send(());

        let handles: Vec<JoinHandle<()>> = self.workers.lock().unwrap().drain(..).collect();
        if !handles.is_empty() {
            match tokio::time::timeout(SHUTDOWN_WAIT, join_all(handles)).await {
                Ok(results) => {
                    for (worker_id, result) in results.into_iter().enumerate() {
                        if let Err(err) = result {
                            if err.is_panic() {
                                error!(worker_id, "executor terminated by panic");
                            }
                        }
                    }
                }
                Err(_) => {
                    warn!(
                        timeout_secs = SHUTDOWN_WAIT.as_secs(),
                        "worker pool shutdown timed out waiting for executors"
                    );
                }
            }
        }

        *self.state.lock().unwrap() = PoolState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn counting_job(counter: Arc<AtomicUsize>) -> Job {
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    async fn wait_until(counter: &AtomicUsize, expected: usize) -> bool {
        for _ in 0..100 {
            if counter.load(Ordering::SeqCst) == expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_submit_before_run_fails() {
        let pool = TokioWorkerPool::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        let result = pool.submit(counting_job(counter)).await;
        assert_eq!(result, Err(PoolError::NotRunning));
    }

    #[tokio::test]
    async fn test_jobs_execute_after_run() {
        let pool = TokioWorkerPool::new(2);
        pool.run().await;

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            pool.submit(counting_job(counter.clone())).await.unwrap();
        }

        assert!(wait_until(&counter, 5).await, "all jobs should run");
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_job_panic_does_not_kill_executor() {
        let pool = TokioWorkerPool::new(1);
        pool.run().await;

        pool.submit(Box::pin(async {
            panic!("job blew up");
        }))
        .await
        .unwrap();

        // The single executor must survive to run the next job.
        let counter = Arc::new(AtomicUsize::new(0));
        pool.submit(counting_job(counter.clone())).await.unwrap();

        assert!(wait_until(&counter, 1).await, "executor should survive a panic");
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails() {
        let pool = TokioWorkerPool::new(2);
        pool.run().await;
        pool.shutdown().await;

        let counter = Arc::new(AtomicUsize::new(0));
        let result = pool.submit(counting_job(counter)).await;
        assert_eq!(result, Err(PoolError::ShuttingDown));
    }

    #[tokio::test]
    async fn test_run_and_shutdown_are_idempotent() {
        let pool = TokioWorkerPool::new(1);
        pool.run().await;
        pool.run().await;

        let counter = Arc::new(AtomicUsize::new(0));
        pool.submit(counting_job(counter.clone())).await.unwrap();
        assert!(wait_until(&counter, 1).await);

        pool.shutdown().await;
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_without_run() {
        let pool = TokioWorkerPool::new(2);
        pool.shutdown().await;

        let counter = Arc::new(AtomicUsize::new(0));
        let result = pool.submit(counting_job(counter)).await;
        assert_eq!(result, Err(PoolError::ShuttingDown));
    }

    #[tokio::test]
    async fn test_submit_fails_when_queue_is_full() {
        let pool = TokioWorkerPool::new(1);
        pool.run().await;

        // Block the single executor so queued jobs cannot drain.
        let gate = Arc::new(Notify::new());
        let blocker = gate.clone();
        pool.submit(Box::pin(async move {
            blocker.notified().await;
        }))
        .await
        .unwrap();

        // Give the executor a moment to dequeue the blocking job so the
        // queue starts empty.
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Fill the queue (capacity = workers * 10).
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..10 {
            pool.submit(counting_job(counter.clone())).await.unwrap();
        }

        let result = pool.submit(counting_job(counter.clone())).await;
        assert_eq!(result, Err(PoolError::QueueFull));

        gate.notify_one();
        assert!(wait_until(&counter, 10).await, "queued jobs drain once unblocked");
        pool.shutdown().await;
    }
}
