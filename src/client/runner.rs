//! Client execution logic with username retry support.

use crate::protocol::DEFAULT_PORT;

use super::error::ClientError;
use super::input::{ConsoleLineSource, LineSource};
use super::session::run_client_session;

/// Run the chat client against the server at `host`.
///
/// Prompts for a username, connects, and on a rejected name prompts again
/// over a fresh connection; the registry frees nothing in between, so only a
/// different name can succeed. Exhausting the input at any point exits
/// normally.
pub async fn run_client(host: String) -> Result<(), ClientError> {
    let mut input = ConsoleLineSource::spawn("> ");

    loop {
        println!("Enter username:");
        let Some(username) = input.next_line().await else {
            tracing::info!("Input closed before a username was chosen");
            return Ok(());
        };

        match run_client_session(&host, DEFAULT_PORT, &username, &mut input).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Err(ClientError::UsernameTaken(name)) => {
                println!("Username '{}' is already taken, pick another.", name);
            }
            Err(e) => return Err(e),
        }
    }
}
