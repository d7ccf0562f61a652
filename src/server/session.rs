//! Per-connection session handling.
//!
//! Each accepted connection runs one session through the states
//! `Connected → AwaitingUsername → Registered → Closed`. The session owns its
//! socket exclusively: the read half drives the state machine in this task,
//! and once registered, a spawned send task drains the session's outbound
//! channel onto the write half so broadcasts never block the registry.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, WriteHalf};
use tokio::sync::mpsc;

use crate::common::time::Clock;
use crate::protocol::{ChatMessage, Opcode, codec};

use super::state::AppState;

/// Drive one client connection until it closes.
///
/// Any read or decode failure is terminal for this connection only: the
/// session transitions to closed, unregisters its username if it had one,
/// and never affects other sessions.
pub async fn handle_connection<S>(
    stream: S,
    peer: SocketAddr,
    state: Arc<AppState>,
    clock: Arc<dyn Clock>,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    // AwaitingUsername: repeat the Register exchange until a name is
    // accepted. A rejected name keeps the connection open for a retry.
    let (username, rx) = loop {
        let opcode = match codec::read_opcode(&mut reader).await {
            Ok(opcode) => opcode,
            Err(e) if e.is_clean_eof() => {
                tracing::debug!("{} disconnected before registering", peer);
                return;
            }
            Err(e) => {
                tracing::warn!("{}: protocol error while awaiting username: {}", peer, e);
                return;
            }
        };

        match opcode {
            Opcode::Register => {
                let username = match codec::read_string(&mut reader).await {
                    Ok(username) => username,
                    Err(e) => {
                        tracing::warn!("{}: malformed Register frame: {}", peer, e);
                        return;
                    }
                };

                // Usernames are non-empty by contract; an empty one is
                // rejected the same way as a duplicate.
                if username.is_empty() {
                    tracing::warn!("{} offered an empty username, rejecting", peer);
                    if codec::write_bool(&mut writer, false).await.is_err() {
                        return;
                    }
                    continue;
                }

                let (tx, rx) = mpsc::unbounded_channel();
                match state.register(&username, tx).await {
                    Some(snapshot) => {
                        if let Err(e) = send_acceptance(&mut writer, snapshot).await {
                            // The client never learned it was accepted; roll
                            // the registration back before bailing out.
                            tracing::warn!(
                                "{}: failed to deliver acceptance to '{}': {}",
                                peer,
                                username,
                                e
                            );
                            state.unregister(&username).await;
                            return;
                        }
                        break (username, rx);
                    }
                    None => {
                        tracing::info!(
                            "{}: username '{}' is already registered, rejecting",
                            peer,
                            username
                        );
                        if codec::write_bool(&mut writer, false).await.is_err() {
                            return;
                        }
                    }
                }
            }
            Opcode::Send => {
                tracing::warn!("{} sent a message before registering, closing", peer);
                return;
            }
        }
    };

    tracing::info!("Client '{}' registered from {}", username, peer);

    // Registered: outbound broadcasts flow through the channel onto the
    // write half while this task keeps reading Send exchanges.
    let send_task = spawn_send_task(writer, rx, username.clone());

    loop {
        let opcode = match codec::read_opcode(&mut reader).await {
            Ok(opcode) => opcode,
            Err(e) if e.is_clean_eof() => {
                tracing::info!("Client '{}' disconnected", username);
                break;
            }
            Err(e) => {
                tracing::warn!("Client '{}': framing error: {}", username, e);
                break;
            }
        };

        match opcode {
            Opcode::Send => {
                let body = match codec::read_string(&mut reader).await {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::warn!("Client '{}': malformed Send frame: {}", username, e);
                        break;
                    }
                };
                // An empty body is a legitimate message and is broadcast
                // like any other.
                let message = ChatMessage::new(clock.now_hms(), username.clone(), body);
                state.publish(message).await;
            }
            Opcode::Register => {
                tracing::warn!(
                    "Client '{}' attempted to re-register, closing connection",
                    username
                );
                break;
            }
        }
    }

    state.unregister(&username).await;
    send_task.abort();
    tracing::info!("Client '{}' removed from registry", username);
}

/// Reply `accepted=true` followed by the history snapshot, oldest first.
async fn send_acceptance<W>(
    writer: &mut W,
    snapshot: Vec<ChatMessage>,
) -> Result<(), crate::protocol::WireError>
where
    W: AsyncWrite + Unpin,
{
    codec::write_bool(writer, true).await?;
    let lists: Vec<Vec<String>> = snapshot.into_iter().map(ChatMessage::into_fields).collect();
    codec::write_string_lists(writer, &lists).await?;
    writer.flush().await?;
    Ok(())
}

/// Spawn the task that drains this session's outbound channel onto its
/// socket. A write failure only ends this session's delivery; the read loop
/// notices the closed socket and performs the unregister.
fn spawn_send_task<S>(
    mut writer: WriteHalf<S>,
    mut rx: mpsc::UnboundedReceiver<ChatMessage>,
    username: String,
) -> tokio::task::JoinHandle<()>
where
    S: AsyncWrite + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = codec::write_string_list(&mut writer, &message.fields()).await {
                tracing::debug!("Stopping outbound delivery to '{}': {}", username, e);
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::time::FixedClock;
    use crate::protocol::codec::{
        read_bool, read_string_list, read_string_lists, write_opcode, write_string,
    };

    fn test_peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn spawn_session(state: Arc<AppState>) -> tokio::io::DuplexStream {
        let (client_side, server_side) = tokio::io::duplex(4096);
        let clock = Arc::new(FixedClock::new("12:00:00"));
        tokio::spawn(handle_connection(server_side, test_peer(), state, clock));
        client_side
    }

    #[tokio::test]
    async fn test_register_on_empty_history_sends_empty_snapshot() {
        // given:
        let state = Arc::new(AppState::new());
        let mut conn = spawn_session(state.clone());

        // when:
        write_opcode(&mut conn, Opcode::Register).await.unwrap();
        write_string(&mut conn, "alice").await.unwrap();

        // then:
        assert!(read_bool(&mut conn).await.unwrap());
        assert_eq!(read_string_lists(&mut conn).await.unwrap(), Vec::<Vec<String>>::new());
        assert_eq!(state.participant_count().await, 1);
    }

    #[tokio::test]
    async fn test_rejected_name_keeps_connection_open_for_retry() {
        // given: alice is already registered
        let state = Arc::new(AppState::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        state.register("alice", tx).await.unwrap();
        let mut conn = spawn_session(state.clone());

        // when: a second session tries "alice" and then retries as "bob"
        write_opcode(&mut conn, Opcode::Register).await.unwrap();
        write_string(&mut conn, "alice").await.unwrap();
        let first = read_bool(&mut conn).await.unwrap();

        write_opcode(&mut conn, Opcode::Register).await.unwrap();
        write_string(&mut conn, "bob").await.unwrap();
        let second = read_bool(&mut conn).await.unwrap();

        // then:
        assert!(!first);
        assert!(second);
        read_string_lists(&mut conn).await.unwrap();
        assert_eq!(state.participant_count().await, 2);
    }

    #[tokio::test]
    async fn test_empty_username_is_rejected() {
        let state = Arc::new(AppState::new());
        let mut conn = spawn_session(state.clone());

        write_opcode(&mut conn, Opcode::Register).await.unwrap();
        write_string(&mut conn, "").await.unwrap();

        assert!(!read_bool(&mut conn).await.unwrap());
        assert_eq!(state.participant_count().await, 0);
    }

    #[tokio::test]
    async fn test_send_echoes_back_with_server_timestamp() {
        // given: a registered session
        let state = Arc::new(AppState::new());
        let mut conn = spawn_session(state.clone());
        write_opcode(&mut conn, Opcode::Register).await.unwrap();
        write_string(&mut conn, "alice").await.unwrap();
        read_bool(&mut conn).await.unwrap();
        read_string_lists(&mut conn).await.unwrap();

        // when: alice sends "hello"
        write_opcode(&mut conn, Opcode::Send).await.unwrap();
        write_string(&mut conn, "hello").await.unwrap();

        // then: the sender receives its own broadcast copy
        let fields = read_string_list(&mut conn).await.unwrap();
        assert_eq!(fields, ["12:00:00", "alice", "hello"]);
        assert_eq!(state.history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_send_before_registration_is_a_violation() {
        // given:
        let state = Arc::new(AppState::new());
        let mut conn = spawn_session(state.clone());

        // when: opcode Send arrives while awaiting the username
        write_opcode(&mut conn, Opcode::Send).await.unwrap();
        write_string(&mut conn, "sneaky").await.unwrap();

        // then: the server closes without registering anyone
        let mut probe = [0u8; 1];
        let n = tokio::io::AsyncReadExt::read(&mut conn, &mut probe)
            .await
            .unwrap();
        assert_eq!(n, 0, "server should have closed the stream");
        assert_eq!(state.participant_count().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_frees_the_username() {
        // given: alice registers then drops the connection
        let state = Arc::new(AppState::new());
        let mut conn = spawn_session(state.clone());
        write_opcode(&mut conn, Opcode::Register).await.unwrap();
        write_string(&mut conn, "alice").await.unwrap();
        read_bool(&mut conn).await.unwrap();
        read_string_lists(&mut conn).await.unwrap();
        drop(conn);

        // when: the session loop observes the close
        tokio::task::yield_now().await;
        let mut settled = state.participant_count().await;
        for _ in 0..100 {
            if settled == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            settled = state.participant_count().await;
        }

        // then: the name is reusable
        assert_eq!(settled, 0);
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(state.register("alice", tx).await.is_some());
    }
}
