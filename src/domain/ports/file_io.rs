//! Port trait for file access.
//!
//! The symbolic scheduler reads sources and writes generated tests only
//! through this seam, which keeps its pipeline testable against in-memory
//! fakes.

use std::io;
use std::path::Path;

use async_trait::async_trait;

/// Minimal read/write capability surface.
#[async_trait]
pub trait FileIo: Send + Sync {
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;
}
