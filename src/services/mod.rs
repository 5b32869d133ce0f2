//! Scheduling, analysis, and prompt-assembly services.

pub mod deep_worker;
pub mod enrichment;
pub mod extract;
pub mod minimize;
pub mod paths;
pub mod prompt;
pub mod symprompt_worker;
pub mod worker_pool;

pub use deep_worker::{DeepWorker, DeepWorkerConfig, TaskPromptGenerator};
pub use symprompt_worker::SymPromptWorker;
pub use worker_pool::{Job, TokioWorkerPool, WorkerPool};
