//! Server execution logic.

use std::sync::Arc;

use tokio::net::{TcpListener, ToSocketAddrs};

use crate::common::time::{Clock, SystemClock};

use super::session::handle_connection;
use super::state::AppState;

/// A bound chat server ready to accept connections.
///
/// Binding and running are split so tests can bind port 0 and read back the
/// assigned address before driving the accept loop.
pub struct ChatServer {
    listener: TcpListener,
    state: Arc<AppState>,
    clock: Arc<dyn Clock>,
}

impl ChatServer {
    /// Bind the listener. This is the only fatal error path in steady state;
    /// everything after bind is handled per connection.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            state: Arc::new(AppState::new()),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the message timestamp source. Used by tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Accept connections forever, one session task per connection.
    pub async fn run(self) -> Result<(), std::io::Error> {
        tracing::info!("Chat server listening on {}", self.listener.local_addr()?);

        loop {
            let (stream, peer) = self.listener.accept().await?;
            tracing::debug!("Accepted connection from {}", peer);
            tokio::spawn(handle_connection(
                stream,
                peer,
                Arc::clone(&self.state),
                Arc::clone(&self.clock),
            ));
        }
    }
}

/// Run the chat server on all interfaces at the given port.
pub async fn run_server(port: u16) -> Result<(), std::io::Error> {
    ChatServer::bind(("0.0.0.0", port)).await?.run().await
}
