//! Error types for SeqForge

use thiserror::Error;

/// Main error type for SeqForge operations
#[derive(Debug, Error)]
pub enum SeqForgeError {
    /// Error in solver configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A move generator or listener failed during search
    #[error("Search error: {0}")]
    Search(String),

    /// Invalid operation for current solver state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Internal error (should not occur in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for SeqForge operations
pub type Result<T> = std::result::Result<T, SeqForgeError>;
