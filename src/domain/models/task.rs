//! Test-generation task model.
//!
//! A [`TestTask`] carries the state of one source file across feedback
//! iterations: the latest generated test, the latest coverage report, and
//! the best coverage seen so far. The source path doubles as the task's
//! identity key inside a scheduler.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Programming language of a source file under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Go,
    Python,
    JavaScript,
    Java,
    Cpp,
}

impl Language {
    /// Detect the language from a file extension. Unknown extensions map to
    /// `None`, which downstream consumers treat as "no language tag".
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "go" => Some(Self::Go),
            "py" => Some(Self::Python),
            "js" => Some(Self::JavaScript),
            "java" => Some(Self::Java),
            "cpp" => Some(Self::Cpp),
            _ => None,
        }
    }

    /// The tag used on fenced code blocks for this language.
    pub fn fence_tag(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::Java => "java",
            Self::Cpp => "cpp",
        }
    }

    /// The file extension (without dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Python => "py",
            Self::JavaScript => "js",
            Self::Java => "java",
            Self::Cpp => "cpp",
        }
    }
}

/// Compute where the generated test for `source_path` should be written.
///
/// Per-language conventions: `foo.go → foo_test.go`, `foo.py → foo_test.py`,
/// `foo.js → foo_test.js`, `src/Foo.java → src/TestFoo.java`. Languages
/// without a convention (and unknown extensions) keep the source path.
pub fn test_file_path(source_path: &Path, language: Option<Language>) -> PathBuf {
    let Some(language) = language else {
        return source_path.to_path_buf();
    };

    let stem = match source_path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) => stem,
        None => return source_path.to_path_buf(),
    };

    let file_name = match language {
        Language::Go | Language::Python | Language::JavaScript => {
            format!("{}_test.{}", stem, language.extension())
        }
        Language::Java => format!("Test{}.java", stem),
        Language::Cpp => return source_path.to_path_buf(),
    };

    source_path.with_file_name(file_name)
}

/// Per-source-file state carried across feedback iterations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestTask {
    /// The source code under test.
    pub source_code: String,

    /// Path to the source file; also the task's identity key.
    pub source_path: String,

    /// Number of feedback iterations completed so far.
    pub iterations: u32,

    /// Best coverage rate achieved so far, in `[0, 1]`.
    pub best_coverage: f64,

    /// The most recently generated test code (empty initially).
    pub generated_test: String,

    /// The most recent test execution report (empty initially).
    pub test_report: String,

    /// Detected language of the source file, if any.
    pub language: Option<Language>,

    /// When the task was submitted.
    pub submitted_at: DateTime<Utc>,
}

impl TestTask {
    /// Create a fresh task for the given source file.
    pub fn new(source_code: impl Into<String>, source_path: impl Into<String>) -> Self {
        let source_path = source_path.into();
        let language = Language::from_path(Path::new(&source_path));

        Self {
            source_code: source_code.into(),
            source_path,
            iterations: 0,
            best_coverage: 0.0,
            generated_test: String::new(),
            test_report: String::new(),
            language,
            submitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_detection() {
        assert_eq!(Language::from_path(Path::new("a.go")), Some(Language::Go));
        assert_eq!(Language::from_path(Path::new("a.py")), Some(Language::Python));
        assert_eq!(
            Language::from_path(Path::new("dir/a.js")),
            Some(Language::JavaScript)
        );
        assert_eq!(
            Language::from_path(Path::new("Foo.java")),
            Some(Language::Java)
        );
        assert_eq!(Language::from_path(Path::new("a.cpp")), Some(Language::Cpp));
        assert_eq!(Language::from_path(Path::new("a.rb")), None);
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_test_file_path_per_language() {
        assert_eq!(
            test_file_path(Path::new("pkg/foo.go"), Some(Language::Go)),
            PathBuf::from("pkg/foo_test.go")
        );
        assert_eq!(
            test_file_path(Path::new("foo.py"), Some(Language::Python)),
            PathBuf::from("foo_test.py")
        );
        assert_eq!(
            test_file_path(Path::new("src/foo.js"), Some(Language::JavaScript)),
            PathBuf::from("src/foo_test.js")
        );
        assert_eq!(
            test_file_path(Path::new("src/Foo.java"), Some(Language::Java)),
            PathBuf::from("src/TestFoo.java")
        );
    }

    #[test]
    fn test_test_file_path_without_convention() {
        assert_eq!(
            test_file_path(Path::new("a.cpp"), Some(Language::Cpp)),
            PathBuf::from("a.cpp")
        );
        assert_eq!(test_file_path(Path::new("a.txt"), None), PathBuf::from("a.txt"));
    }

    #[test]
    fn test_new_task_defaults() {
        let task = TestTask::new("print(1)", "demo/a.py");
        assert_eq!(task.iterations, 0);
        assert_eq!(task.best_coverage, 0.0);
        assert!(task.generated_test.is_empty());
        assert!(task.test_report.is_empty());
        assert_eq!(task.language, Some(Language::Python));
    }
}
