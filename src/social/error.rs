//! Error types for social group coordination.
//!
//! This module defines errors that can occur while registering users,
//! creating groups through the aggregation service, and loading
//! configuration.

use thiserror::Error;

/// Error type for social operations.
#[derive(Error, Debug)]
pub enum SocialError {
    /// The aggregation service rejected a group-creation request.
    #[error("Group creation failed: {0}")]
    CreationFailed(String),

    /// The group owner is not registered with the aggregation service.
    #[error("User not registered: {0}")]
    UserNotRegistered(String),

    /// The registry guard was poisoned by a panicking holder.
    #[error("Lock error: {0}")]
    Lock(String),

    /// Configuration is well-formed but semantically invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for social operations.
pub type Result<T> = std::result::Result<T, SocialError>;

impl<T> From<std::sync::PoisonError<T>> for SocialError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(format!("Failed to acquire social registry lock: {err}"))
    }
}
