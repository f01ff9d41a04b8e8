use std::fmt;

use crate::record::Record;

/// Category of a broker client error. Lets the caller decide between
/// "report and exit", "log and continue" and "stop trying".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid client property or unusable client configuration.
    Config,
    /// Metadata request failed or returned an unusable answer.
    Metadata,
    /// Consume-side failure for a specific partition.
    Consume,
}

/// Error returned by broker client operations other than `send`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ClientError {
    kind: ErrorKind,
    message: String,
}

impl ClientError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    pub fn metadata(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Metadata, message: msg.into() }
    }

    pub fn consume(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Consume, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prefix the message, keeping the kind.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

/// Immediate result of a rejected `send`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// Local send queue is full; the record may be retried after a poll.
    #[error("local queue full")]
    QueueFull,

    #[error("{0}")]
    Fatal(String),
}

impl SendError {
    pub fn is_backpressure(&self) -> bool {
        matches!(self, SendError::QueueFull)
    }
}

/// A rejected send hands the record back so a retry needs no copy.
#[derive(Debug)]
pub struct SendFailure {
    pub error: SendError,
    pub record: Record,
}

impl SendFailure {
    pub fn new(error: SendError, record: Record) -> Self {
        Self { error, record }
    }
}
