//! Utilities shared by the server and client.

pub mod logger;
pub mod time;
