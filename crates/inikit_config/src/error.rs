//! Error types for configuration operations.
//!
//! Most of the merge/parse surface is deliberately infallible: malformed
//! lines are skipped, missing files read as empty. [`Error`] covers the
//! operations that can genuinely fail, such as flushing the cache to disk.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the configuration cache.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (reading or writing a config file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A file that the caller required to be present was not in the cache.
    #[error("Config file not loaded: {0}")]
    FileNotLoaded(Utf8PathBuf),

    /// Write-back failed for one or more dirty files during a flush.
    #[error("Failed to write {failed} of {total} dirty config file(s)")]
    FlushFailed { failed: usize, total: usize },
}
