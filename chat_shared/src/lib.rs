//! `chat_shared`
//!
//! The IPK24-CHAT protocol engine: grammar validators, the message model,
//! the dual wire codecs, transport adapters, the UDP reliability layer, the
//! phase state machine, configuration and the error taxonomy. Shared
//! between the `ipk24chat-client` binary and its integration tests.
//!
//! Design goals:
//! - Deterministic and modular where practical.
//! - Clear separation of concerns (codec, transport, reliability, state).
//! - No `unsafe`.

pub mod codec;
pub mod config;
pub mod error;
pub mod grammar;
pub mod message;
pub mod reliability;
pub mod state;
pub mod transport;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::error::ChatError;
    pub use crate::message::{ChatMessage, Confirm};
    pub use crate::state::{Command, Event, Phase};
}
