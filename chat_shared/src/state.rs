//! The client's phase state machine.
//!
//! Replaces the loose `waiting_for_auth` / `waiting_for_response` booleans a
//! hand-rolled C client tends to accumulate with one typed enum and a single
//! `transition` entry point, so illegal phase/command and phase/event pairs
//! are rejected in one place instead of scattered `if` guards.

use crate::error::ChatError;

/// The client's current position in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    AwaitingAuthReply,
    Open,
    AwaitingJoinReply,
    Terminating,
    Failed,
}

/// Events that can move the phase forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    AuthSent,
    JoinSent,
    ReplyOk,
    ReplyNok,
    InboundBye,
    InboundErr,
    LocalBye,
    Eof,
    RetryExhausted,
}

/// A command the user typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Auth,
    Join,
    Msg,
    Rename,
    Help,
    Bye,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Terminating | Phase::Failed)
    }

    /// Applies `event`, returning the next phase or a [`ChatError`] if the
    /// event cannot occur in the current phase.
    pub fn transition(self, event: Event) -> Result<Phase, ChatError> {
        use Event::*;
        use Phase::*;

        let next = match (self, event) {
            (_, InboundErr) => Failed,
            (_, RetryExhausted) => Failed,
            (_, InboundBye) | (_, LocalBye) | (_, Eof) if !self.is_terminal() => Terminating,

            (Start, AuthSent) => AwaitingAuthReply,
            (AwaitingAuthReply, ReplyOk) => Open,
            (AwaitingAuthReply, ReplyNok) => Start,
            (Open, JoinSent) => AwaitingJoinReply,
            (AwaitingJoinReply, ReplyOk) | (AwaitingJoinReply, ReplyNok) => Open,

            _ => {
                return Err(ChatError::PhaseViolation(format!(
                    "event {event:?} is not valid in phase {self:?}"
                )))
            }
        };
        Ok(next)
    }

    /// Whether `cmd` is admissible in this phase — legal to dispatch right
    /// now, or (for `Join`/`Msg`) legal to accept and hold in the queue
    /// until the session unblocks. `/rename` and `/help` are legal
    /// everywhere non-terminal; they never transmit. `Join`/`Msg` are
    /// admissible from `Open` and from `AwaitingJoinReply` — that second
    /// phase is only reachable once authenticated, so a command typed
    /// while a `Join` reply is outstanding is accepted and queued rather
    /// than rejected; whether it dispatches immediately or waits is a
    /// separate, blocked-state question the caller answers on its own.
    pub fn allows(self, cmd: Command) -> bool {
        if self.is_terminal() {
            return false;
        }
        match cmd {
            Command::Rename | Command::Help => true,
            Command::Auth => matches!(self, Phase::Start),
            Command::Join | Command::Msg => matches!(self, Phase::Open | Phase::AwaitingJoinReply),
            Command::Bye => true,
        }
    }
}
