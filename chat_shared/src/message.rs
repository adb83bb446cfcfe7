//! The protocol message model.
//!
//! One tagged variant shared by both wire framings (`codec::text` for TCP,
//! `codec::binary` for UDP), rather than a parallel per-transport struct
//! for every message kind.

/// A single IPK24-CHAT protocol message, framing-agnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    /// Client -> server: login request.
    Auth {
        username: String,
        secret: String,
        display_name: String,
    },
    /// Client -> server: channel membership request.
    Join {
        channel_id: String,
        display_name: String,
    },
    /// Either direction: chat payload.
    Msg {
        display_name: String,
        content: String,
    },
    /// Server -> client: outcome of the most recent `Auth` or `Join`.
    Reply { ok: bool, content: String },
    /// Either direction: fatal, session must end.
    Err {
        display_name: String,
        content: String,
    },
    /// Either direction: graceful termination.
    Bye,
}

impl ChatMessage {
    /// A short tag for logging, independent of any field values.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatMessage::Auth { .. } => "AUTH",
            ChatMessage::Join { .. } => "JOIN",
            ChatMessage::Msg { .. } => "MSG",
            ChatMessage::Reply { .. } => "REPLY",
            ChatMessage::Err { .. } => "ERR",
            ChatMessage::Bye => "BYE",
        }
    }

    /// True for messages that signal the session must end.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatMessage::Bye | ChatMessage::Err { .. })
    }
}

/// UDP-only acknowledgement of a prior non-`Confirm` frame. Has no TCP
/// counterpart, so it lives outside `ChatMessage` rather than as a variant
/// every text-framing match arm would need to reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirm {
    pub message_id: u16,
}
