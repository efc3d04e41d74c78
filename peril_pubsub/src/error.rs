use std::error::Error as StdError;
use thiserror::Error;

/// Represents a failure of the broker transport: a channel could not be
/// opened, a frame could not be sent, or the broker rejected an operation.
///
/// Transport errors produced by `lapin` are flattened into their message, so
/// that the broker client does not leak into the error API of this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Creates a new transport error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Reports the message of this error.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<lapin::Error> for TransportError {
    fn from(value: lapin::Error) -> Self {
        Self::new(value.to_string())
    }
}

/// Represents a value that could not be encoded into the wire format.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct SerializationError(Box<dyn StdError + Send + Sync>);

impl SerializationError {
    /// Wraps the given encoder error.
    pub fn new(error: impl StdError + Send + Sync + 'static) -> Self {
        Self(Box::new(error))
    }
}
