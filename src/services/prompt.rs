//! Prompt assembly.
//!
//! Templates carry literal placeholders (`{code}` and `{fileName}` in
//! iterative mode, plus `{file_name}` and `{path_constraints}` in symbolic
//! mode) substituted by global textual replacement over the whole
//! template. Placeholders the template does not use pass through unchanged.

use std::sync::Arc;

use crate::domain::models::TestTask;
use crate::domain::ports::MetadataStore;
use crate::services::deep_worker::TaskPromptGenerator;
use crate::services::enrichment;

/// Fixed prefix introducing the feedback section on re-iterations.
pub const REPORT_FEEDBACK_PREFIX: &str = "Your code needs improvement; report follows:";

/// Builder for iterative-mode prompts: template plus optional enrichment
/// and feedback sections, then placeholder substitution.
pub struct PromptBuilder {
    template: String,
    code: String,
    file_name: String,
}

impl PromptBuilder {
    pub fn new(
        template: impl Into<String>,
        code: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            template: template.into(),
            code: code.into(),
            file_name: file_name.into(),
        }
    }

    /// Append literal text to the template.
    #[must_use]
    pub fn append(mut self, text: &str) -> Self {
        self.template.push_str(text);
        self
    }

    /// Append the result of a retrieval adapter called with the code and
    /// file name. Adapters return an empty string on failure, so the prompt
    /// always assembles.
    #[must_use]
    pub fn enrich_with<F>(mut self, adapter: F) -> Self
    where
        F: FnOnce(&str, &str) -> String,
    {
        let extra = adapter(&self.code, &self.file_name);
        self.template.push_str(&extra);
        self
    }

    /// Append the feedback section carrying the previous test report.
    #[must_use]
    pub fn with_report(mut self, report: &str) -> Self {
        self.template.push('\n');
        self.template.push_str(REPORT_FEEDBACK_PREFIX);
        self.template.push('\n');
        self.template.push_str(report);
        self.template.push('\n');
        self
    }

    /// Substitute `{code}` and `{fileName}` and return the final prompt.
    pub fn build(self) -> String {
        self.template
            .replace("{code}", &self.code)
            .replace("{fileName}", &self.file_name)
    }
}

/// Standard prompt generator for the iterative scheduler: template, optional
/// metadata enrichment, and the prior report once iterations have started.
pub fn feedback_prompt_generator(
    template: String,
    store: Option<Arc<dyn MetadataStore>>,
) -> TaskPromptGenerator {
    Arc::new(move |task: &TestTask| {
        let mut builder = PromptBuilder::new(&template, &task.source_code, &task.source_path);

        if let Some(store) = &store {
            builder = builder
                .enrich_with(|code, file_name| enrichment::summarize(store.as_ref(), code, file_name));
        }

        if task.iterations > 0 {
            builder = builder.with_report(&task.test_report);
        }

        builder.build()
    })
}

/// Substitute a symbolic-mode template. Order matters: path constraints
/// first, then code, then file name. Substitution is whole-template, so a
/// later replacement also applies inside earlier ones.
pub fn render_symbolic_prompt(
    template: &str,
    code: &str,
    file_name: &str,
    path_descriptions: &[String],
) -> String {
    template
        .replace("{path_constraints}", &path_descriptions.join("\n"))
        .replace("{code}", code)
        .replace("{file_name}", file_name)
}

/// Render one test-case description per minimized path.
///
/// Each description opens with a numbered header for the function signature,
/// then lists the conditions the path takes (negated via `not(...)` when
/// the path goes through an else arm), and closes with the returned value
/// when the path ends in a return.
pub fn render_path_cases(
    function_name: &str,
    parameters: &str,
    return_type: &str,
    paths: &[Vec<String>],
) -> Vec<String> {
    paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let mut conditions = Vec::new();
            let mut return_value = String::new();

            for token in path {
                for prefix in ["if:", "elif:"] {
                    if let Some(rest) = token.strip_prefix(prefix) {
                        if let Some(cond) = rest.strip_suffix("-then") {
                            conditions.push(cond.to_string());
                        } else if let Some(cond) = rest.strip_suffix("-else") {
                            conditions.push(format!("not({})", cond));
                        }
                    }
                }
                if let Some(value) = token.strip_prefix("return:") {
                    return_value = value.trim().to_string();
                }
            }

            let returns_suffix = if return_type.is_empty() {
                String::new()
            } else {
                format!(" -> {}", return_type)
            };

            let mut description = format!(
                "Testcase {} for {}{}{}:\n",
                index + 1,
                function_name,
                parameters,
                returns_suffix
            );

            if let Some((first, rest)) = conditions.split_first() {
                description.push_str(&format!("test case where {},\n", first));
                for condition in rest {
                    description.push_str(&format!("and {}\n", condition));
                }
            }

            if !return_value.is_empty() {
                description.push_str(&format!("returns '{}'", return_value));
            }

            description
        })
        .collect()
}
