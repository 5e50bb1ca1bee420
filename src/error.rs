//! Error types for trueno-lab
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trueno-lab error types
#[derive(Error, Debug)]
pub enum Error {
    /// The run directory is already present (two runs in the same second)
    #[error("Experiment directory already exists: {}\nRun names are only unique to the second; wait or pick another name", path.display())]
    DirectoryExists {
        /// Directory that could not be created
        path: PathBuf,
    },

    /// Experiment name cannot be used as a directory component
    #[error("Invalid experiment name: {0:?}\nNames must be non-empty and contain no path separators")]
    InvalidName(String),

    /// A figure implementation failed to render
    #[error("Figure error: {0}")]
    Figure(String),

    /// Manifest serialization failed
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
