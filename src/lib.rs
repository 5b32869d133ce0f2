//! Covsmith - LLM-driven unit test generation with coverage feedback.

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::models::Config;
pub use domain::{PoolError, SubmitError};
