//! Chat server implementation.

mod runner;
mod session;
mod state;

pub use runner::{ChatServer, run_server};
pub use state::{AppState, HISTORY_CAPACITY, MessageHistory, SessionRegistry};
