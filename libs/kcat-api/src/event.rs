use crate::record::Message;

/// Everything a bounded `poll()` can hand back.
///
/// Producers yield delivery reports, consumers yield messages and partition
/// EOF markers; both may yield client errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A previously accepted send reached the broker.
    Delivered { partition: i32, offset: i64 },

    /// The broker rejected a previously accepted send.
    DeliveryFailed { reason: String },

    Message(Message),

    /// The partition currently has no further messages; `offset` is the
    /// position the marker was reported at.
    PartitionEof {
        topic: String,
        partition: i32,
        offset: i64,
    },

    /// Client-level error. `fatal` errors end the run.
    Error { fatal: bool, reason: String },
}

impl ClientEvent {
    pub fn error(reason: impl Into<String>) -> Self {
        ClientEvent::Error { fatal: false, reason: reason.into() }
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        ClientEvent::Error { fatal: true, reason: reason.into() }
    }
}
