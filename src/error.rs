//! Error types for projgrant

use thiserror::Error;

/// The main error type for projgrant operations.
///
/// A deny is not an error: [`crate::Authorizer::authorize`] returns a decision. `Denied` only
/// appears on the protected write paths, which turn a denying decision into a failure.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("store: {0}")]
    Store(String),

    #[error("not initialized")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("config: {0}")]
    Config(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid permission: {0}")]
    InvalidPermission(String),

    #[error("{reason}")]
    Denied { status: u16, reason: String },
}

/// Result type alias for projgrant operations
pub type Result<T> = std::result::Result<T, Error>;

/// Convert any storage error to Error::Store
pub fn err<E: std::error::Error>(e: E) -> Error {
    Error::Store(e.to_string())
}
