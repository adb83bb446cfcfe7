//! Client configuration, as resolved from CLI flags.

/// Selects which framing and transport the session runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Tcp,
    Udp,
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub transport: TransportKind,
    pub host: String,
    pub port: u16,
    /// UDP confirmation timeout, milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of UDP retransmissions.
    pub max_retries: u32,
}

impl ChatConfig {
    pub const DEFAULT_PORT: u16 = 4567;
    pub const DEFAULT_TIMEOUT_MS: u64 = 250;
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
}
