//! UDP framing: compact binary, one frame per datagram.
//!
//! Every frame starts with a 3-byte header: a 1-byte type tag followed by a
//! big-endian 16-bit `message_id`. For `Confirm` the id field holds the id
//! of the frame being acknowledged rather than a freshly minted one.
//!
//! ```text
//! 0x00  Confirm  (header only)
//! 0x01  Reply    1B ok, 2B ref_mid (BE), NUL-terminated content
//! 0x02  Auth     NUL username, secret, display_name
//! 0x03  Join     NUL channel_id, display_name
//! 0x04  Msg      NUL display_name, content
//! 0xFE  Err      NUL display_name, content
//! 0xFF  Bye      (no further payload)
//! ```

use bytes::{BufMut, BytesMut};

use crate::error::ChatError;
use crate::message::ChatMessage;

const TYPE_CONFIRM: u8 = 0x00;
const TYPE_REPLY: u8 = 0x01;
const TYPE_AUTH: u8 = 0x02;
const TYPE_JOIN: u8 = 0x03;
const TYPE_MSG: u8 = 0x04;
const TYPE_ERR: u8 = 0xFE;
const TYPE_BYE: u8 = 0xFF;

/// A decoded UDP datagram: either a `Confirm` for some id, or a message
/// paired with the id it was sent under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Confirm(u16),
    Message(ChatMessage, u16),
}

/// Serializes `msg` under `message_id`. `ref_mid` is only meaningful for
/// `Reply` (the id of the `Auth`/`Join` it answers); callers that never
/// originate replies (the client) can pass `0`.
pub fn encode(msg: &ChatMessage, message_id: u16, ref_mid: u16) -> BytesMut {
    let mut buf = BytesMut::new();
    match msg {
        ChatMessage::Auth {
            username,
            secret,
            display_name,
        } => {
            buf.put_u8(TYPE_AUTH);
            buf.put_u16(message_id);
            put_cstr(&mut buf, username);
            put_cstr(&mut buf, secret);
            put_cstr(&mut buf, display_name);
        }
        ChatMessage::Join {
            channel_id,
            display_name,
        } => {
            buf.put_u8(TYPE_JOIN);
            buf.put_u16(message_id);
            put_cstr(&mut buf, channel_id);
            put_cstr(&mut buf, display_name);
        }
        ChatMessage::Msg {
            display_name,
            content,
        } => {
            buf.put_u8(TYPE_MSG);
            buf.put_u16(message_id);
            put_cstr(&mut buf, display_name);
            put_cstr(&mut buf, content);
        }
        ChatMessage::Reply { ok, content } => {
            buf.put_u8(TYPE_REPLY);
            buf.put_u16(message_id);
            buf.put_u8(if *ok { 1 } else { 0 });
            buf.put_u16(ref_mid);
            put_cstr(&mut buf, content);
        }
        ChatMessage::Err {
            display_name,
            content,
        } => {
            buf.put_u8(TYPE_ERR);
            buf.put_u16(message_id);
            put_cstr(&mut buf, display_name);
            put_cstr(&mut buf, content);
        }
        ChatMessage::Bye => {
            buf.put_u8(TYPE_BYE);
            buf.put_u16(message_id);
        }
    }
    buf
}

/// Serializes a `Confirm` acknowledging `message_id`.
pub fn encode_confirm(message_id: u16) -> BytesMut {
    let mut buf = BytesMut::with_capacity(3);
    buf.put_u8(TYPE_CONFIRM);
    buf.put_u16(message_id);
    buf
}

/// Parses one complete datagram. Oversize, truncated or unrecognized frames
/// are reported as [`ChatError::ProtocolParse`] rather than panicking, so
/// garbage on the wire is always a recoverable, dispatchable outcome.
pub fn decode(bytes: &[u8]) -> Result<Frame, ChatError> {
    if bytes.len() < 3 {
        return Err(too_short());
    }
    let ty = bytes[0];
    let message_id = u16::from_be_bytes([bytes[1], bytes[2]]);
    let payload = &bytes[3..];

    match ty {
        TYPE_CONFIRM => Ok(Frame::Confirm(message_id)),
        TYPE_BYE => Ok(Frame::Message(ChatMessage::Bye, message_id)),
        TYPE_AUTH => {
            let mut pos = 0;
            let username = read_cstr(payload, &mut pos)?;
            let secret = read_cstr(payload, &mut pos)?;
            let display_name = read_cstr(payload, &mut pos)?;
            Ok(Frame::Message(
                ChatMessage::Auth {
                    username,
                    secret,
                    display_name,
                },
                message_id,
            ))
        }
        TYPE_JOIN => {
            let mut pos = 0;
            let channel_id = read_cstr(payload, &mut pos)?;
            let display_name = read_cstr(payload, &mut pos)?;
            Ok(Frame::Message(
                ChatMessage::Join {
                    channel_id,
                    display_name,
                },
                message_id,
            ))
        }
        TYPE_MSG => {
            let mut pos = 0;
            let display_name = read_cstr(payload, &mut pos)?;
            let content = read_cstr(payload, &mut pos)?;
            Ok(Frame::Message(
                ChatMessage::Msg {
                    display_name,
                    content,
                },
                message_id,
            ))
        }
        TYPE_ERR => {
            let mut pos = 0;
            let display_name = read_cstr(payload, &mut pos)?;
            let content = read_cstr(payload, &mut pos)?;
            Ok(Frame::Message(
                ChatMessage::Err {
                    display_name,
                    content,
                },
                message_id,
            ))
        }
        TYPE_REPLY => {
            if payload.len() < 3 {
                return Err(too_short());
            }
            let ok = payload[0] != 0;
            // ref_mid (payload[1..3]) is carried out of band; the reactor
            // dispatches replies by current phase, not by correlation id.
            let mut pos = 3;
            let content = read_cstr(payload, &mut pos)?;
            Ok(Frame::Message(ChatMessage::Reply { ok, content }, message_id))
        }
        _ => Err(ChatError::ProtocolParse(format!(
            "unknown UDP frame type byte 0x{ty:02X}"
        ))),
    }
}

fn put_cstr(buf: &mut BytesMut, s: &str) {
    buf.put_slice(s.as_bytes());
    buf.put_u8(0);
}

fn read_cstr(buf: &[u8], pos: &mut usize) -> Result<String, ChatError> {
    let start = *pos;
    let nul = buf[start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(too_short)?;
    let s = String::from_utf8_lossy(&buf[start..start + nul]).into_owned();
    *pos = start + nul + 1;
    Ok(s)
}

fn too_short() -> ChatError {
    ChatError::ProtocolParse("truncated UDP frame".to_string())
}
