//! UDP stop-and-wait reliability layer.
//!
//! At most one outbound non-`Confirm` frame is ever unconfirmed. `Pending`
//! tracks it and its retransmission clock; `ChatSession` (in `chat_client`)
//! owns at most one `Pending` at a time and consults [`Pending::poll`] from
//! its reactor tick.

use bytes::Bytes;
use tokio::time::Instant;

use crate::error::ChatError;

/// An unconfirmed outbound UDP frame and its retransmission bookkeeping.
#[derive(Debug, Clone)]
pub struct Pending {
    bytes: Bytes,
    message_id: u16,
    first_sent_at: Instant,
    retries_used: u32,
    max_retries: u32,
}

/// What the reactor should do after a timer tick or a `Confirm`.
#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// Timer hasn't expired yet; keep waiting.
    StillWaiting,
    /// Resend the same bytes under the same `message_id`.
    Resend,
    /// Retry budget exhausted; give up.
    Exhausted,
}

impl Pending {
    pub fn new(bytes: Bytes, message_id: u16, max_retries: u32, now: Instant) -> Self {
        Self {
            bytes,
            message_id,
            first_sent_at: now,
            retries_used: 0,
            max_retries,
        }
    }

    pub fn message_id(&self) -> u16 {
        self.message_id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether `confirm_id` clears this pending frame.
    pub fn confirms(&self, confirm_id: u16) -> bool {
        confirm_id == self.message_id
    }

    /// Called when the retransmission timer fires. Advances `retries_used`
    /// and resets the clock when a resend is due.
    pub fn on_timeout(&mut self, now: Instant) -> PollOutcome {
        if self.retries_used >= self.max_retries {
            return PollOutcome::Exhausted;
        }
        self.retries_used += 1;
        self.first_sent_at = now;
        PollOutcome::Resend
    }

    /// Deadline at which the next timeout tick is due.
    pub fn deadline(&self, timeout: std::time::Duration) -> Instant {
        self.first_sent_at + timeout
    }
}

/// Error helper for the reactor: builds the fatal error once a `Pending`
/// reports [`PollOutcome::Exhausted`].
pub fn exhaustion_error(retries: u32) -> ChatError {
    ChatError::ReliabilityExhaustion { retries }
}
