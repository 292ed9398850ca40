//! Error types for the store and seeder layers.
//!
//! Codec-level problems never surface as errors — malformed field values
//! are recovered with defaults at commit time. Only file and network
//! operations can fail, and those failures propagate unmodified to the
//! presentation surface for user-visible reporting.

use std::io;
use std::path::PathBuf;

/// Errors from the spawn-file store.
#[derive(Debug)]
pub enum StoreError {
    /// The requested file does not exist.
    NotFound(PathBuf),
    /// The file exists but is not structurally valid JSON.
    Parse { path: PathBuf, message: String },
    /// Read or write failure.
    Io(io::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            StoreError::Parse { path, message } => {
                write!(f, "Invalid spawn file {}: {}", path.display(), message)
            }
            StoreError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors from the seed provider. A failed seed leaves either the prior
/// on-disk state or a fully-seeded state, never a half-written one.
#[derive(Debug)]
pub enum SeedError {
    /// Transport-level failure (connection, timeout).
    Network(String),
    /// The remote API answered with a non-success status.
    Api(String),
    /// The downloaded archive could not be unpacked.
    Archive(String),
    /// Local filesystem failure while applying the seed.
    Io(io::Error),
}

impl std::fmt::Display for SeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedError::Network(e) => write!(f, "Network error: {}", e),
            SeedError::Api(e) => write!(f, "Remote API error: {}", e),
            SeedError::Archive(e) => write!(f, "Archive error: {}", e),
            SeedError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for SeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SeedError::Io(e) => Some(e),
            _ => None,
        }
    }
}
