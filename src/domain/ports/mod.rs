//! Port trait definitions.
//!
//! Async trait interfaces the infrastructure adapters implement:
//! - `ChatModel`: LLM text generation
//! - `CoverageRunner`: test execution and coverage measurement
//! - `FileIo`: filesystem access for the symbolic scheduler
//! - `MetadataStore`: structural metadata lookup for prompt enrichment
//!
//! The scheduler layer depends only on these contracts, never on concrete
//! adapters.

pub mod chat_model;
pub mod coverage;
pub mod file_io;
pub mod metadata_store;

pub use chat_model::{ChatError, ChatMessage, ChatModel};
pub use coverage::{CoverageError, CoverageReport, CoverageRunner};
pub use file_io::FileIo;
pub use metadata_store::MetadataStore;

#[cfg(test)]
pub use chat_model::MockChatModel;
