/// How the bytes of an outgoing [`Record`] came to be owned by it.
///
/// `Copied` records were copied out of the framer's read buffer, which the
/// framer keeps reusing. `Transferred` records took the read buffer itself;
/// the framer had to start a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Copied,
    Transferred,
}

/// One outgoing unit. Payload and key are independently nullable:
/// `None` is an explicit null, `Some(vec![])` is an empty byte sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub payload: Option<Vec<u8>>,
    pub key: Option<Vec<u8>>,
    pub ownership: Ownership,
}

impl Record {
    /// Copied record with a payload and no key.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Some(payload.into()),
            key: None,
            ownership: Ownership::Copied,
        }
    }

    pub fn payload_len(&self) -> usize {
        self.payload.as_ref().map_or(0, Vec::len)
    }
}

/// One incoming message as delivered by the broker client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Option<Vec<u8>>,
}

impl Message {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            key: None,
            payload: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}
