//! Error types for namespaced store operations.

/// Error type for namespaced store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host session store could not be started.
    #[error("Session backend failed to start: {0}")]
    Start(String),
}

/// Result type for namespaced store operations.
pub type Result<T> = std::result::Result<T, Error>;
