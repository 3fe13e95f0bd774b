//! # Storage Layer
//!
//! Codecs and the shell engine never touch the filesystem directly. They go
//! through [`DataStore`], which has two implementations:
//!
//! - [`fs::FileStore`]: production, reads and writes real files
//! - [`memory::InMemoryStore`]: tests, a path-keyed map of byte buffers
//!
//! Paths are passed through untouched; a store does not resolve or create
//! anything beyond the file it is asked to write.

use crate::error::{FwumdError, Result};
use std::path::Path;

pub mod fs;
pub mod memory;

pub trait DataStore {
    /// Read the whole file at `path`
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Create or replace the file at `path`
    fn write(&mut self, path: &Path, data: &[u8]) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Read a text file. Bytes that are not UTF-8 are malformed text, so
    /// they are a schema error rather than a storage failure.
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            FwumdError::Schema(format!("{} is not valid UTF-8: {}", path.display(), e))
        })
    }
}
