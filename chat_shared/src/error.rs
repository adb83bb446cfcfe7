//! Error taxonomy.
//!
//! Split out as a typed enum (rather than `anyhow::Error` throughout, as
//! the rest of this workspace's ancestry prefers) because the reactor needs
//! to distinguish "recoverable, loop continues" from "fatal, attempt a BYE
//! and terminate" by kind, not by inspecting a message string.

use std::net::AddrParseError;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Bad or missing CLI flags, fatal before any I/O.
    #[error("configuration error: {0}")]
    Config(String),

    /// DNS or socket failure establishing the connection.
    #[error("could not connect to server: {0}")]
    ResolveOrConnect(#[source] std::io::Error),

    /// Mid-session socket error.
    #[error("transport I/O error: {0}")]
    TransportIo(#[source] std::io::Error),

    /// Malformed or truncated inbound frame.
    #[error("malformed frame: {0}")]
    ProtocolParse(String),

    /// User input violates a field grammar rule.
    #[error("invalid input: {0}")]
    LocalValidation(String),

    /// Command issued in a phase that forbids it.
    #[error("not allowed in current state: {0}")]
    PhaseViolation(String),

    /// UDP retransmission budget exhausted.
    #[error("gave up retransmitting after {retries} attempts")]
    ReliabilityExhaustion { retries: u32 },
}

impl From<AddrParseError> for ChatError {
    fn from(e: AddrParseError) -> Self {
        ChatError::Config(format!("invalid address: {e}"))
    }
}
