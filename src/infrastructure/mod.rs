//! Infrastructure adapters behind the domain ports.

pub mod config;
pub mod coverage;
pub mod fs;
pub mod llm;
pub mod logging;
pub mod metadata;

pub use config::{ConfigError, ConfigLoader};
pub use coverage::PyCoverageRunner;
pub use fs::SimpleFileIo;
pub use llm::AnthropicModel;
pub use metadata::{DependencyCache, InMemoryMetadataStore};
