//! `ipk24chat-client` binary.
//!
//! Usage:
//!   ipk24chat-client -t tcp|udp -s <host> [-p <port>] [-d <ms>] [-r <n>] [-h]
//!
//! Standard input commands:
//!   /auth <username> <secret> <display_name>
//!   /join <channel_id>
//!   /rename <display_name>
//!   /help
//!   anything else not starting with `/` is sent as a chat message.

use std::io::BufRead;

use tokio::sync::mpsc;
use tracing::{error, info};

use chat_client::cli::{self, ParsedArgs};
use chat_client::session::ChatSession;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cfg = match cli::parse(&args) {
        Ok(ParsedArgs::Config(cfg)) => cfg,
        Ok(ParsedArgs::Help) => {
            print!("{}", cli::USAGE);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("ERR: {e}");
            eprint!("{}", cli::USAGE);
            std::process::exit(1);
        }
    };

    info!(host = %cfg.host, port = cfg.port, transport = ?cfg.transport, "connecting");

    let mut session = match ChatSession::connect(&cfg).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("ERR: {e}");
            std::process::exit(1);
        }
    };

    let (input_tx, input_rx) = mpsc::channel::<Option<String>>(32);

    let stdin_tx = input_tx.clone();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if stdin_tx.blocking_send(Some(line)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
        // EOF: wake the reactor so it can run its shutdown handshake.
        let _ = stdin_tx.blocking_send(None);
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = input_tx.send(None).await;
        }
    });

    let exit_code = match session.run(input_rx).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "reactor terminated with an error");
            1
        }
    };

    std::process::exit(exit_code);
}
