//! Chat client implementation.

mod error;
mod formatter;
mod input;
mod runner;
mod session;
mod ui;

pub use error::ClientError;
pub use input::{ConsoleLineSource, LineSource};
pub use runner::run_client;
