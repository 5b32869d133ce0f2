//! Command-line front-end.
//!
//! Thin wrapper over the schedulers: enumerate source files, wire the
//! adapters together, submit, wait, shut down. Exit codes are owned here;
//! the core never terminates the process.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::domain::models::Config;
use crate::domain::ports::{ChatModel, CoverageRunner, MetadataStore};
use crate::infrastructure::{
    logging, AnthropicModel, ConfigLoader, InMemoryMetadataStore, PyCoverageRunner, SimpleFileIo,
};
use crate::services::prompt::feedback_prompt_generator;
use crate::services::{DeepWorker, DeepWorkerConfig, SymPromptWorker};

#[derive(Parser)]
#[command(name = "covsmith", about = "LLM-driven unit test generation", version)]
pub struct Cli {
    /// Path to a configuration file (defaults to covsmith.yaml + env).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate tests for every Python source under the source root.
    Run {
        /// Override the configured source root.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Generation strategy.
        #[arg(long, value_enum, default_value = "sym")]
        mode: Mode,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Mode {
    /// Per-function symbolic path prompts.
    Sym,
    /// Per-file iterative coverage feedback.
    Deep,
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    logging::init(&config.logging)?;

    match cli.command {
        Command::Run { root, mode } => run_generation(config, root, mode).await,
    }
}

/// Collect the Python sources to generate tests for, skipping files this
/// tool itself produces.
fn collect_python_sources(root: &Path) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !name.ends_with(".py") || name.ends_with("_test.py") || name.contains("test_case") {
            continue;
        }
        sources.push(entry.into_path());
    }

    sources.sort();
    Ok(sources)
}

async fn run_generation(config: Config, root: Option<PathBuf>, mode: Mode) -> Result<()> {
    let root = root.unwrap_or_else(|| config.source_root.clone());

    let template = tokio::fs::read_to_string(&config.prompt_template)
        .await
        .with_context(|| {
            format!(
                "failed to read prompt template {}",
                config.prompt_template.display()
            )
        })?;

    let api_key = std::env::var("ANTHROPIC_API_KEY").context("ANTHROPIC_API_KEY is not set")?;
    let model: Arc<dyn ChatModel> =
        Arc::new(AnthropicModel::new(api_key, &config.llm, &config.retry)?);
    let callback: Arc<dyn CoverageRunner> = Arc::new(PyCoverageRunner);

    let store: Option<Arc<dyn MetadataStore>> = match &config.metadata_path {
        Some(path) => {
            let store = InMemoryMetadataStore::load(path)
                .await
                .with_context(|| format!("failed to load metadata from {}", path.display()))?;
            info!(records = store.len(), "loaded metadata store");
            Some(Arc::new(store))
        }
        None => None,
    };

    let worker_config = DeepWorkerConfig {
        worker_count: config.worker_count,
        model,
        callback: Some(callback),
        coverage_threshold: config.coverage_threshold,
        max_iterations: config.max_iterations,
        source_root: root.clone(),
        test_root: config.test_root.clone(),
        prompt_generator: feedback_prompt_generator(template.clone(), store),
    };

    let sources = collect_python_sources(&root)?;
    info!(count = sources.len(), root = %root.display(), "collected source files");

    match mode {
        Mode::Sym => {
            let worker = SymPromptWorker::new(worker_config, Arc::new(SimpleFileIo), template);

            for source in &sources {
                if let Err(err) = worker.submit_sym_task(source).await {
                    warn!(source = %source.display(), error = %err, "skipping source");
                }
            }
        }
        Mode::Deep => {
            let worker = DeepWorker::new(worker_config);
            worker.run().await;

            for source in &sources {
                let code = tokio::fs::read_to_string(source)
                    .await
                    .with_context(|| format!("failed to read {}", source.display()))?;
                let path = source.display().to_string();
                if let Err(err) = worker.submit_task(&code, &path) {
                    warn!(source = %path, error = %err, "skipping source");
                }
            }

            while worker.active_task_count() > 0 {
                info!(remaining = worker.active_task_count(), "tasks in flight");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            worker.shutdown().await;
        }
    }

    info!("all tasks completed");
    Ok(())
}
