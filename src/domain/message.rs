use std::borrow::Cow;
use std::fmt;

/// Position of a message inside its source, used to acknowledge it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Offset {
    pub partition: i32,
    pub position: i64,
}

impl Offset {
    pub fn new(partition: i32, position: i64) -> Self {
        Self {
            partition,
            position,
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.partition, self.position)
    }
}

/// Opaque unit handed out by a message source
///
/// The source owns the message until it is committed. The stream processor
/// holds it for one dispatch (all attempts) and hands it back through
/// `MessageSource::commit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub offset: Offset,
}

impl RawMessage {
    /// Create a new raw message
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>, offset: Offset) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            offset,
        }
    }

    /// Key interpreted as text (invalid UTF-8 is replaced)
    pub fn key_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }

    /// Value interpreted as text (invalid UTF-8 is replaced)
    pub fn value_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }
}
