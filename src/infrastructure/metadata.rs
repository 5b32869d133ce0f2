//! In-memory metadata store and dependency cache.
//!
//! The store answers `MetadataStore` lookups from a preloaded map; a remote
//! metadata source is expected to be hydrated into it ahead of a run. The
//! dependency cache memoizes per-file dependency scans behind a
//! reader/writer lock.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use anyhow::Result;

use crate::domain::models::{Dependency, FileRecord};
use crate::domain::ports::MetadataStore;
use crate::infrastructure::fs::load_json;

/// Metadata store backed by a `HashMap` keyed by file path.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    files: RwLock<HashMap<String, FileRecord>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<FileRecord>) -> Self {
        let files = records
            .into_iter()
            .map(|record| (record.path.clone(), record))
            .collect();
        Self {
            files: RwLock::new(files),
        }
    }

    /// Load records from a JSON document holding either an array of file
    /// records or a single record.
    pub async fn load(path: &Path) -> Result<Self> {
        match load_json::<Vec<FileRecord>>(path).await {
            Ok(records) => Ok(Self::from_records(records)),
            Err(_) => {
                let record = load_json::<FileRecord>(path).await?;
                Ok(Self::from_records(vec![record]))
            }
        }
    }

    pub fn insert(&self, record: FileRecord) {
        self.files
            .write()
            .unwrap()
            .insert(record.path.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.files.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn file_record(&self, file_name: &str) -> Option<FileRecord> {
        self.files.read().unwrap().get(file_name).cloned()
    }
}

/// Memoized per-file dependency results. Readers share, writers exclude.
#[derive(Default)]
pub struct DependencyCache {
    cached: RwLock<HashMap<String, Vec<Dependency>>>,
}

impl DependencyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_path: &str) -> Option<Vec<Dependency>> {
        self.cached.read().unwrap().get(file_path).cloned()
    }

    pub fn store(&self, file_path: impl Into<String>, deps: Vec<Dependency>) {
        self.cached.write().unwrap().insert(file_path.into(), deps);
    }

    /// Return the cached dependencies for a file, scanning its record's
    /// function bodies on a miss.
    pub fn get_or_scan(&self, record: &FileRecord) -> Vec<Dependency> {
        if let Some(deps) = self.get(&record.path) {
            return deps;
        }
        let deps = scan_imports(record);
        self.store(record.path.clone(), deps.clone());
        deps
    }
}

/// Scan the function bodies of a file record for Python import statements
/// and turn them into dependency edges.
///
/// Handles `import x, y` and `from x import a, b`. Module names resolve to
/// `<module>.py`; anything richer (packages, relative imports) is left to
/// the metadata generator.
pub fn scan_imports(record: &FileRecord) -> Vec<Dependency> {
    let mut deps = Vec::new();

    let bodies = record
        .functions
        .iter()
        .map(|f| (&f.name, &f.body))
        .chain(
            record
                .classes
                .iter()
                .flat_map(|c| c.methods.iter().map(|m| (&m.function.name, &m.function.body))),
        );

    for (element, body) in bodies {
        for line in body.lines() {
            let line = line.trim();

            if let Some(rest) = line.strip_prefix("from ") {
                let mut parts = rest.split_whitespace();
                let Some(module) = parts.next() else { continue };
                if parts.next() != Some("import") {
                    continue;
                }
                for imported in parts {
                    let imported = imported.trim_end_matches(',');
                    if imported.is_empty() {
                        continue;
                    }
                    let mut dep =
                        Dependency::import(record.path.clone(), format!("{}.py", module));
                    dep.source_element = Some(element.clone());
                    dep.target_element = Some(imported.to_string());
                    deps.push(dep);
                }
            } else if let Some(rest) = line.strip_prefix("import ") {
                for module in rest.split(',') {
                    let module = module.trim();
                    if module.is_empty() {
                        continue;
                    }
                    let mut dep =
                        Dependency::import(record.path.clone(), format!("{}.py", module));
                    dep.source_element = Some(element.clone());
                    deps.push(dep);
                }
            }
        }
    }

    deps
}
