//! Port trait for code-metadata retrieval.

use crate::domain::models::FileRecord;

/// Lookup of structural metadata by file path.
///
/// Prompt enrichment is best-effort: implementations return `None` rather
/// than erroring so the prompt still assembles when retrieval fails.
/// Remote stores are expected to hydrate a local cache up front and answer
/// from it here.
pub trait MetadataStore: Send + Sync {
    fn file_record(&self, file_name: &str) -> Option<FileRecord>;
}
