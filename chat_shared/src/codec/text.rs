//! TCP framing: line-oriented, `\r\n`-terminated, case-sensitive keywords.
//!
//! ```text
//! AUTH <username> AS <secret> USING <display_name>\r\n
//! JOIN <channel_id> AS <display_name>\r\n
//! MSG FROM <display_name> IS <content>\r\n
//! ERR FROM <display_name> IS <content>\r\n
//! REPLY <OK|NOK> IS <content>\r\n
//! BYE\r\n
//! ```
//!
//! Fields are space-separated; `<content>` is the remainder of the line and
//! may itself contain spaces.

use bytes::{BufMut, BytesMut};

use crate::error::ChatError;
use crate::message::ChatMessage;

/// Serializes a message to a complete `\r\n`-terminated frame.
pub fn encode(msg: &ChatMessage) -> BytesMut {
    let mut buf = BytesMut::new();
    match msg {
        ChatMessage::Auth {
            username,
            secret,
            display_name,
        } => {
            buf.put_slice(format!("AUTH {username} AS {secret} USING {display_name}").as_bytes());
        }
        ChatMessage::Join {
            channel_id,
            display_name,
        } => {
            buf.put_slice(format!("JOIN {channel_id} AS {display_name}").as_bytes());
        }
        ChatMessage::Msg {
            display_name,
            content,
        } => {
            buf.put_slice(format!("MSG FROM {display_name} IS {content}").as_bytes());
        }
        ChatMessage::Reply { ok, content } => {
            let verdict = if *ok { "OK" } else { "NOK" };
            buf.put_slice(format!("REPLY {verdict} IS {content}").as_bytes());
        }
        ChatMessage::Err {
            display_name,
            content,
        } => {
            buf.put_slice(format!("ERR FROM {display_name} IS {content}").as_bytes());
        }
        ChatMessage::Bye => buf.put_slice(b"BYE"),
    }
    buf.put_slice(b"\r\n");
    buf
}

/// Parses one complete line (without the trailing `\r\n`) into a message.
///
/// Dispatch is by the first whitespace-delimited token. Anything
/// unrecognized or structurally short is a [`ChatError::ProtocolParse`], not
/// a panic.
pub fn decode(line: &str) -> Result<ChatMessage, ChatError> {
    let mut parts = line.splitn(2, ' ');
    let tag = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("");

    match tag {
        "AUTH" => {
            // <username> AS <secret> USING <display_name>
            let mut it = rest.splitn(2, " AS ");
            let username = it.next().unwrap_or("");
            let tail = it.next().ok_or_else(|| bad(line))?;
            let mut it = tail.splitn(2, " USING ");
            let secret = it.next().unwrap_or("");
            let display_name = it.next().ok_or_else(|| bad(line))?;
            if username.is_empty() || secret.is_empty() || display_name.is_empty() {
                return Err(bad(line));
            }
            Ok(ChatMessage::Auth {
                username: username.to_string(),
                secret: secret.to_string(),
                display_name: display_name.to_string(),
            })
        }
        "JOIN" => {
            let mut it = rest.splitn(2, " AS ");
            let channel_id = it.next().unwrap_or("");
            let display_name = it.next().ok_or_else(|| bad(line))?;
            if channel_id.is_empty() || display_name.is_empty() {
                return Err(bad(line));
            }
            Ok(ChatMessage::Join {
                channel_id: channel_id.to_string(),
                display_name: display_name.to_string(),
            })
        }
        "MSG" => {
            let rest = rest.strip_prefix("FROM ").ok_or_else(|| bad(line))?;
            let mut it = rest.splitn(2, " IS ");
            let display_name = it.next().unwrap_or("");
            let content = it.next().ok_or_else(|| bad(line))?;
            if display_name.is_empty() {
                return Err(bad(line));
            }
            Ok(ChatMessage::Msg {
                display_name: display_name.to_string(),
                content: content.to_string(),
            })
        }
        "ERR" => {
            let rest = rest.strip_prefix("FROM ").ok_or_else(|| bad(line))?;
            let mut it = rest.splitn(2, " IS ");
            let display_name = it.next().unwrap_or("");
            let content = it.next().ok_or_else(|| bad(line))?;
            if display_name.is_empty() {
                return Err(bad(line));
            }
            Ok(ChatMessage::Err {
                display_name: display_name.to_string(),
                content: content.to_string(),
            })
        }
        "REPLY" => {
            let mut it = rest.splitn(2, " IS ");
            let verdict = it.next().unwrap_or("");
            let content = it.next().ok_or_else(|| bad(line))?;
            let ok = match verdict {
                "OK" => true,
                "NOK" => false,
                _ => return Err(bad(line)),
            };
            Ok(ChatMessage::Reply {
                ok,
                content: content.to_string(),
            })
        }
        "BYE" => Ok(ChatMessage::Bye),
        _ => Err(bad(line)),
    }
}

fn bad(line: &str) -> ChatError {
    ChatError::ProtocolParse(format!("unrecognized TCP frame: {line:?}"))
}
