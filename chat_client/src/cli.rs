//! Command-line argument parsing.
//!
//! Hand-rolled short-flag parsing rather than pulling in a flag-parsing
//! crate. `-t` and `-s` are required; the transport check is a literal
//! match against `tcp`/`udp` only.

use chat_shared::config::{ChatConfig, TransportKind};
use chat_shared::error::ChatError;

pub const USAGE: &str = "\
Usage: ipk24chat-client -t tcp|udp -s <host> [-p <port>] [-d <ms>] [-r <n>] [-h]

  -t tcp|udp   transport protocol (required)
  -s <host>    server hostname or IP address (required)
  -p <port>    server port (default 4567)
  -d <ms>      UDP confirmation timeout in milliseconds (default 250)
  -r <n>       maximum number of UDP retransmissions (default 3)
  -h           print this help and exit
";

/// Outcome of parsing: either a ready-to-use config, or a request to print
/// usage and exit 0.
pub enum ParsedArgs {
    Config(ChatConfig),
    Help,
}

pub fn parse(args: &[String]) -> Result<ParsedArgs, ChatError> {
    let mut transport: Option<TransportKind> = None;
    let mut host: Option<String> = None;
    let mut port = ChatConfig::DEFAULT_PORT;
    let mut timeout_ms = ChatConfig::DEFAULT_TIMEOUT_MS;
    let mut max_retries = ChatConfig::DEFAULT_MAX_RETRIES;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" => return Ok(ParsedArgs::Help),
            "-t" => {
                let value = next_value(args, &mut i, "-t")?;
                transport = Some(match value.as_str() {
                    "tcp" => TransportKind::Tcp,
                    "udp" => TransportKind::Udp,
                    other => {
                        return Err(ChatError::Config(format!(
                            "-t must be literally \"tcp\" or \"udp\", got {other:?}"
                        )))
                    }
                });
            }
            "-s" => host = Some(next_value(args, &mut i, "-s")?),
            "-p" => {
                let value = next_value(args, &mut i, "-p")?;
                port = value
                    .parse()
                    .map_err(|_| ChatError::Config(format!("-p: invalid port {value:?}")))?;
            }
            "-d" => {
                let value = next_value(args, &mut i, "-d")?;
                timeout_ms = value
                    .parse()
                    .map_err(|_| ChatError::Config(format!("-d: invalid timeout {value:?}")))?;
            }
            "-r" => {
                let value = next_value(args, &mut i, "-r")?;
                max_retries = value
                    .parse()
                    .map_err(|_| ChatError::Config(format!("-r: invalid retry count {value:?}")))?;
            }
            other => return Err(ChatError::Config(format!("unrecognized argument {other:?}"))),
        }
    }

    let transport = transport.ok_or_else(|| ChatError::Config("-t is required".to_string()))?;
    let host = host.ok_or_else(|| ChatError::Config("-s is required".to_string()))?;

    Ok(ParsedArgs::Config(ChatConfig {
        transport,
        host,
        port,
        timeout_ms,
        max_retries,
    }))
}

fn next_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, ChatError> {
    let value = args
        .get(*i + 1)
        .ok_or_else(|| ChatError::Config(format!("{flag} requires a value")))?
        .clone();
    *i += 2;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_required_flags_with_defaults() {
        match parse(&args(&["-t", "tcp", "-s", "localhost"])).unwrap() {
            ParsedArgs::Config(cfg) => {
                assert_eq!(cfg.transport, TransportKind::Tcp);
                assert_eq!(cfg.host, "localhost");
                assert_eq!(cfg.port, ChatConfig::DEFAULT_PORT);
                assert_eq!(cfg.timeout_ms, ChatConfig::DEFAULT_TIMEOUT_MS);
                assert_eq!(cfg.max_retries, ChatConfig::DEFAULT_MAX_RETRIES);
            }
            ParsedArgs::Help => panic!("expected Config"),
        }
    }

    #[test]
    fn rejects_missing_required_flags() {
        assert!(parse(&args(&["-s", "localhost"])).is_err());
        assert!(parse(&args(&["-t", "tcp"])).is_err());
    }

    #[test]
    fn rejects_non_literal_transport() {
        assert!(parse(&args(&["-t", "TCP", "-s", "localhost"])).is_err());
        assert!(parse(&args(&["-t", "anything", "-s", "localhost"])).is_err());
    }

    #[test]
    fn help_flag_short_circuits_before_required_flags_are_checked() {
        assert!(matches!(parse(&args(&["-h"])).unwrap(), ParsedArgs::Help));
    }

    #[test]
    fn overrides_apply() {
        match parse(&args(&[
            "-t", "udp", "-s", "h", "-p", "9999", "-d", "100", "-r", "5",
        ]))
        .unwrap()
        {
            ParsedArgs::Config(cfg) => {
                assert_eq!(cfg.port, 9999);
                assert_eq!(cfg.timeout_ms, 100);
                assert_eq!(cfg.max_retries, 5);
            }
            _ => panic!("expected Config"),
        }
    }
}
