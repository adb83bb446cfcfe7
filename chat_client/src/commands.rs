//! Parses one line of standard input into a session-level command.

use chat_shared::error::ChatError;
use chat_shared::grammar;

/// A command typed at the prompt, already field-validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Auth {
        username: String,
        secret: String,
        display_name: String,
    },
    Join {
        channel_id: String,
    },
    Rename {
        display_name: String,
    },
    Help,
    Msg {
        content: String,
    },
}

pub fn parse_line(line: &str) -> Result<UserCommand, ChatError> {
    let line = line.trim_end_matches(['\r', '\n']);

    if line == "/help" {
        return Ok(UserCommand::Help);
    }

    if let Some(rest) = line.strip_prefix("/auth ") {
        let mut parts = rest.splitn(3, ' ');
        let username = parts.next().unwrap_or("");
        let secret = parts.next().unwrap_or("");
        let display_name = parts.next().unwrap_or("");
        if !grammar::is_valid_id(username) {
            return Err(bad("username", username));
        }
        if !grammar::is_valid_secret(secret) {
            return Err(bad("secret", secret));
        }
        if !grammar::is_valid_display_name(display_name) {
            return Err(bad("display_name", display_name));
        }
        return Ok(UserCommand::Auth {
            username: username.to_string(),
            secret: secret.to_string(),
            display_name: display_name.to_string(),
        });
    }

    if let Some(rest) = line.strip_prefix("/join ") {
        let channel_id = rest.trim();
        if !grammar::is_valid_id(channel_id) {
            return Err(bad("channel_id", channel_id));
        }
        return Ok(UserCommand::Join {
            channel_id: channel_id.to_string(),
        });
    }

    if let Some(rest) = line.strip_prefix("/rename ") {
        let display_name = rest.trim();
        if !grammar::is_valid_display_name(display_name) {
            return Err(bad("display_name", display_name));
        }
        return Ok(UserCommand::Rename {
            display_name: display_name.to_string(),
        });
    }

    if let Some(token) = line.strip_prefix('/') {
        return Err(ChatError::LocalValidation(format!(
            "unknown command /{token}"
        )));
    }

    if !grammar::is_valid_content(line) {
        return Err(bad("content", line));
    }
    Ok(UserCommand::Msg {
        content: line.to_string(),
    })
}

fn bad(field: &str, value: &str) -> ChatError {
    ChatError::LocalValidation(format!("invalid {field}: {value:?}"))
}
