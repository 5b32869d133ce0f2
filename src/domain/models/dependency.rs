//! Dependency edges between source files.
//!
//! Produced by lightweight import/usage scanning and consumed only by the
//! prompt-enrichment adapter; nothing in the schedulers depends on them.

use serde::{Deserialize, Serialize};

/// The relationship a dependency edge expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Import,
    Extends,
    Implements,
    Uses,
    References,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Extends => "extends",
            Self::Implements => "implements",
            Self::Uses => "uses",
            Self::References => "references",
        }
    }
}

/// A dependency relationship between code elements in two files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub source_file: String,
    pub target_file: String,
    pub kind: DependencyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_element: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_element: Option<String>,
    /// Edge strength in `[0, 1]`; imports weigh 1.0, usages less.
    pub weight: f64,
}

impl Dependency {
    /// An import edge with full weight.
    pub fn import(source_file: impl Into<String>, target_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            target_file: target_file.into(),
            kind: DependencyKind::Import,
            source_element: None,
            target_element: None,
            weight: 1.0,
        }
    }

    /// A usage edge; weighted below imports.
    pub fn uses(
        source_file: impl Into<String>,
        target_file: impl Into<String>,
        target_element: impl Into<String>,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            target_file: target_file.into(),
            kind: DependencyKind::Uses,
            source_element: None,
            target_element: Some(target_element.into()),
            weight: 0.7,
        }
    }
}
