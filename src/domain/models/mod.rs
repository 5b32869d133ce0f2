//! Domain models.

pub mod config;
pub mod dependency;
pub mod metadata;
pub mod task;

pub use config::{Config, LlmConfig, LogConfig, RetryConfig};
pub use dependency::{Dependency, DependencyKind};
pub use metadata::{
    ClassRecord, FieldRecord, FileRecord, FunctionRecord, InterfaceRecord, MethodRecord,
    ParameterRecord,
};
pub use task::{test_file_path, Language, TestTask};
