//! TCP chat room library.
//!
//! This library provides server and client implementations for a chat room
//! speaking a length-prefixed binary protocol (little-endian framing) over a
//! plain TCP connection. The server enforces username uniqueness, broadcasts
//! every accepted message to all registered clients, and replays the ten most
//! recent messages to newly joined clients.

pub mod client;
pub mod protocol;
pub mod server;

// shared library
pub mod common;
