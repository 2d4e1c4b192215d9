//! Shared error and result types.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PacerError>;

/// Errors surfaced by the pacer's control surface.
///
/// The recording and budget APIs never fail; only operator-facing calls
/// such as configuration updates return these.
#[derive(Debug, Error)]
pub enum PacerError {
    /// A configuration failed validation and was not installed.
    #[error("invalid pacer config: {0}")]
    InvalidConfig(String),
}
