//! Error taxonomy shared by the CLI layers.

use thiserror::Error;

/// An expected, user-facing failure.
///
/// Commands return this when the run should stop with a plain message and no
/// usage text or stack dump.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct DomainError(pub String);

impl DomainError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Problems with how the tool was invoked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("Invalid output format - {0}")]
    InvalidOutputFormat(String),

    #[error("Unknown command specified - {0}")]
    UnknownCommand(String),

    #[error("Expected command")]
    MissingCommand,

    #[error("{0}")]
    InvalidOptions(String),
}
