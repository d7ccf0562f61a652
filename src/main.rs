//! TCP chat room over a length-prefixed binary protocol.
//!
//! Run with:
//! ```not_rust
//! cargo run -- server
//! cargo run -- client 127.0.0.1
//! ```

use clap::{Parser, Subcommand};

use tcp_chat_rs::client::run_client;
use tcp_chat_rs::common::logger::setup_logger;
use tcp_chat_rs::protocol::DEFAULT_PORT;
use tcp_chat_rs::server::run_server;

#[derive(Parser, Debug)]
#[command(name = "tcp-chat")]
#[command(about = "TCP server-client chat room that runs on port 2568", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server
    Server,
    /// Connect to a server chat room
    Client {
        /// The IP address or hostname of the server
        address: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    match args.command {
        Command::Server => {
            if let Err(e) = run_server(DEFAULT_PORT).await {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Command::Client { address } => {
            if let Err(e) = run_client(address).await {
                tracing::error!("Client error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
