//! Symbolic per-function test generation.
//!
//! For each top-level function of a submitted source file, the scheduler
//! enumerates branch paths, minimizes them to a covering subset, renders a
//! path-annotated prompt, and writes one generated test file per function.
//! Processing is one-shot and synchronous per file; any failure along the
//! chain stops that file and surfaces to the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::domain::models::Language;
use crate::domain::ports::FileIo;
use crate::services::deep_worker::{DeepWorker, DeepWorkerConfig};
use crate::services::extract::extract_code;
use crate::services::minimize::minimize_paths;
use crate::services::paths::{
    collect_named_nodes, collect_paths, node_text, parse_python, PYTHON_GRAMMAR,
};
use crate::services::prompt::{render_path_cases, render_symbolic_prompt};

/// The symbolic scheduler: an iterative scheduler plus file I/O and a
/// path-annotated prompt template.
pub struct SymPromptWorker {
    worker: DeepWorker,
    file_io: Arc<dyn FileIo>,
    template: String,
}

impl SymPromptWorker {
    pub fn new(
        config: DeepWorkerConfig,
        file_io: Arc<dyn FileIo>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            worker: DeepWorker::new(config),
            file_io,
            template: template.into(),
        }
    }

    /// The underlying iterative scheduler.
    pub fn worker(&self) -> &DeepWorker {
        &self.worker
    }

    pub async fn run(&self) {
        self.worker.run().await;
    }

    pub async fn shutdown(&self) {
        self.worker.shutdown().await;
    }

    pub fn active_task_count(&self) -> usize {
        self.worker.active_task_count()
    }

    /// Generate one test file per function of `source_path`.
    ///
    /// Reads and parses the source, walks every `function_definition` in
    /// preorder, and for each one: enumerate its body paths, minimize them,
    /// render the prompt, call the model, extract the code block, and write
    /// `<base>_<function>_test_case_1.py` next to the source. An attached
    /// coverage runner is invoked for observation only; its failures are
    /// logged, not propagated.
    pub async fn submit_sym_task(&self, source_path: &Path) -> Result<()> {
        let bytes = self
            .file_io
            .read(source_path)
            .await
            .with_context(|| format!("failed to read {}", source_path.display()))?;
        let code = String::from_utf8(bytes)
            .with_context(|| format!("{} is not valid UTF-8", source_path.display()))?;

        let tree = parse_python(&code)
            .with_context(|| format!("failed to parse {}", source_path.display()))?;
        let root = tree.root_node();

        let mut functions = Vec::new();
        collect_named_nodes(root, "function_definition", &mut functions);

        let file_name = source_path.display().to_string();

        for function in &functions {
            let name = function
                .child_by_field_name("name")
                .map(|n| node_text(n, &code))
                .unwrap_or("unknown");
            let parameters = function
                .child_by_field_name("parameters")
                .map(|n| node_text(n, &code))
                .unwrap_or("");
            let return_type = function
                .child_by_field_name("return_type")
                .map(|n| node_text(n, &code))
                .unwrap_or("");

            let mut paths = Vec::new();
            collect_paths(
                &PYTHON_GRAMMAR,
                function.child_by_field_name("body"),
                &code,
                &[],
                &mut paths,
            );
            let minimized = minimize_paths(&paths);

            let descriptions = render_path_cases(name, parameters, return_type, &minimized);
            let prompt = render_symbolic_prompt(&self.template, &code, &file_name, &descriptions);

            let message = self
                .worker
                .model()
                .generate(&prompt)
                .await
                .with_context(|| format!("generation failed for function '{}'", name))?;
            let test_code = extract_code(&message.content, Some(Language::Python));

            let test_path = sym_test_file_path(source_path, name, 0);
            self.file_io
                .write(&test_path, test_code.as_bytes())
                .await
                .with_context(|| format!("failed to write {}", test_path.display()))?;

            info!(
                source_path = %file_name,
                function = name,
                test_path = %test_path.display(),
                path_count = minimized.len(),
                "wrote symbolic test"
            );

            if let Some(runner) = self.worker.coverage_runner() {
                if let Err(err) = runner.run(&code, &test_code, &test_path).await {
                    warn!(
                        source_path = %file_name,
                        function = name,
                        error = %err,
                        "observation coverage run failed"
                    );
                }
            }
        }

        Ok(())
    }
}

/// Test file name for one function: `<base>_<function>_test_case_<n+1>.py`,
/// placed next to the source.
fn sym_test_file_path(source_path: &Path, function_name: &str, index: usize) -> PathBuf {
    let base = source_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("source");
    source_path.with_file_name(format!(
        "{}_{}_test_case_{}.py",
        base,
        function_name,
        index + 1
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sym_test_file_path_naming() {
        assert_eq!(
            sym_test_file_path(Path::new("demo/calc.py"), "add", 0),
            PathBuf::from("demo/calc_add_test_case_1.py")
        );
        assert_eq!(
            sym_test_file_path(Path::new("calc.py"), "div", 2),
            PathBuf::from("calc_div_test_case_3.py")
        );
    }
}
