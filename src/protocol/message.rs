//! Protocol message types.

use super::WireError;

/// Request tag sent by the client ahead of each exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// Client wants to register a username
    Register = 1,
    /// Client is sending a chat message body
    Send = 2,
}

impl Opcode {
    /// Wire representation of the opcode.
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for Opcode {
    type Error = WireError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Opcode::Register),
            2 => Ok(Opcode::Send),
            other => Err(WireError::UnknownOpcode(other)),
        }
    }
}

/// One chat message: server timestamp, sender username, and message body.
///
/// Messages are created once when the server accepts a Send exchange and are
/// never mutated afterwards. On the wire a message travels as a 3-element
/// `StringList`. The body may be empty; an empty line is a legitimate chat
/// message, not a control signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Server-local wall-clock time (`HH:MM:SS`) at broadcast
    pub timestamp: String,
    /// Name the sender registered under
    pub username: String,
    /// User-provided text, possibly empty
    pub body: String,
}

impl ChatMessage {
    pub fn new(
        timestamp: impl Into<String>,
        username: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            username: username.into(),
            body: body.into(),
        }
    }

    /// Wire field order: `[timestamp, username, body]`.
    pub fn fields(&self) -> [&str; 3] {
        [&self.timestamp, &self.username, &self.body]
    }

    /// Consume the message into its wire fields.
    pub fn into_fields(self) -> Vec<String> {
        vec![self.timestamp, self.username, self.body]
    }

    /// Parse a received `StringList` into a message.
    ///
    /// Returns the original fields on an arity mismatch so the caller can
    /// still display the raw list.
    pub fn from_fields(fields: Vec<String>) -> Result<Self, Vec<String>> {
        let [timestamp, username, body] = <[String; 3]>::try_from(fields)?;
        Ok(Self {
            timestamp,
            username,
            body,
        })
    }
}
