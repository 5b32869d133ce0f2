//! Configuration model.
//!
//! Loaded hierarchically by `infrastructure::config` (defaults, YAML file,
//! environment variables) and validated after merging.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration for a test-generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of pool executors. Non-positive values are treated as 1.
    pub worker_count: usize,

    /// Coverage fraction in `[0, 1]` below which a task iterates again.
    pub coverage_threshold: f64,

    /// Upper bound on feedback iterations per task.
    pub max_iterations: u32,

    /// Root directory containing the sources under test.
    pub source_root: PathBuf,

    /// Root directory test files are written under.
    pub test_root: PathBuf,

    /// Path to the prompt template file.
    pub prompt_template: PathBuf,

    /// Optional path to a JSON metadata document for prompt enrichment.
    pub metadata_path: Option<PathBuf>,

    pub llm: LlmConfig,
    pub retry: RetryConfig,
    pub logging: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_count: 2,
            coverage_threshold: 0.8,
            max_iterations: 3,
            source_root: PathBuf::from("."),
            test_root: PathBuf::from("."),
            prompt_template: PathBuf::from("prompt.txt"),
            metadata_path: None,
            llm: LlmConfig::default(),
            retry: RetryConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// LLM endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            max_tokens: 4096,
            timeout_secs: 300,
        }
    }
}

/// Retry policy configuration for the LLM adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 60_000,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of: trace, debug, info, warn, error.
    pub level: String,
    /// One of: pretty, json.
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
