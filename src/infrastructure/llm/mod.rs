//! Chat-model adapters.

pub mod client;
pub mod retry;

pub use client::AnthropicModel;
pub use retry::RetryPolicy;
