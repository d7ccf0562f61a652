//! Client session: paired reader and writer flows over one connection.

use tokio::net::TcpStream;

use crate::protocol::{Opcode, WireError, codec};

use super::error::ClientError;
use super::formatter::MessageFormatter;
use super::input::LineSource;
use super::ui::redisplay_prompt;

/// Run one client session against `host:port` under the given username.
///
/// The handshake is driven sequentially (Register out, verdict in); after
/// acceptance the writer flow pushes lines from `input` while the reader flow
/// prints broadcasts, each one racing the other. Either flow finishing drops
/// the connection, which the other observes as end-of-stream.
///
/// Returns [`ClientError::UsernameTaken`] when the server rejects the name;
/// the caller may reconnect with a different one.
pub async fn run_client_session<S>(
    host: &str,
    port: u16,
    username: &str,
    input: &mut S,
) -> Result<(), ClientError>
where
    S: LineSource,
{
    let stream = TcpStream::connect((host, port)).await?;
    let (mut reader, mut writer) = stream.into_split();

    codec::write_opcode(&mut writer, Opcode::Register).await?;
    codec::write_string(&mut writer, username).await?;

    if !codec::read_bool(&mut reader).await? {
        return Err(ClientError::UsernameTaken(username.to_string()));
    }

    tracing::info!("Connected to chat server as '{}'", username);

    let history = codec::read_string_lists(&mut reader).await?;
    print!("{}", MessageFormatter::format_history(&history));
    redisplay_prompt(username);

    // Writer flow: forward lines until the input source is exhausted.
    let write_flow = async {
        while let Some(line) = input.next_line().await {
            codec::write_opcode(&mut writer, Opcode::Send).await?;
            codec::write_string(&mut writer, &line).await?;
        }
        Ok::<(), WireError>(())
    };

    // Reader flow: print broadcasts until the stream ends or breaks.
    let read_flow = async {
        loop {
            match codec::read_string_list(&mut reader).await {
                Ok(fields) => {
                    println!("\n{}", MessageFormatter::format_fields(fields));
                    redisplay_prompt(username);
                }
                Err(e) => break e,
            }
        }
    };

    tokio::select! {
        result = write_flow => {
            result?;
            tracing::info!("Input closed, leaving the chat");
        }
        err = read_flow => {
            if err.is_clean_eof() {
                tracing::info!("Server closed the connection");
            } else {
                return Err(err.into());
            }
        }
    }

    Ok(())
}
