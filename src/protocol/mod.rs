//! Binary wire protocol shared by the chat server and client.
//!
//! Every value on the wire is one of five primitive frames, all multi-byte
//! integers little-endian:
//!
//! - `Int32`: 4 bytes, signed
//! - `Bool`: 1 byte, 0 = false, nonzero = true
//! - `String`: `Int32` byte-length, then that many raw UTF-8 bytes
//! - `StringList`: `Int32` count, then that many `String` frames
//! - `ListOfStringLists`: `Int32` count, then that many `StringList` frames
//!
//! A client opens the exchange with `Int32(1)` followed by a `String`
//! username; the server answers with a `Bool` and, when accepted, the history
//! as a `ListOfStringLists`. After that the client sends `Int32(2)` plus a
//! `String` body per message, and the server pushes each accepted message to
//! every registered client as a 3-element `StringList`
//! `[timestamp, username, body]`.

pub mod codec;
mod error;
mod message;

pub use error::WireError;
pub use message::{ChatMessage, Opcode};

/// Port the chat service listens on.
pub const DEFAULT_PORT: u16 = 2568;
