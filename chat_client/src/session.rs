//! The reactor: one async loop multiplexing the transport handle, standard
//! input, and — for UDP — the retransmission timer. A `poll(2)`-style loop
//! translated one-for-one into `tokio::select!`; the blocking stdin read is
//! moved to its own OS thread feeding an `mpsc::channel`.
//!
//! TCP and UDP sessions share all phase/queue/command logic but run
//! through separate loop bodies (`run_tcp`, `run_udp`): the two transports
//! differ enough in framing and in whether a retransmission timer exists
//! that unifying them into one `select!` would mean boxing every branch's
//! future just to paper over that difference.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{error, warn};

use chat_shared::codec::binary::{self, Frame};
use chat_shared::config::{ChatConfig, TransportKind};
use chat_shared::error::ChatError;
use chat_shared::message::ChatMessage;
use chat_shared::reliability::{self, Pending, PollOutcome};
use chat_shared::state::{Command, Event, Phase};
use chat_shared::transport::{TcpTransport, UdpTransport};

use crate::commands::{self, UserCommand};

/// Cap on buffered user commands; once full, further input is rejected
/// locally rather than growing the queue without bound.
const QUEUE_CAP: usize = 1024;

enum TransportHandle {
    Tcp(TcpTransport),
    Udp(UdpTransport),
}

/// One chat session: the transport, the phase, and everything the reactor
/// needs across iterations.
pub struct ChatSession {
    transport: TransportHandle,
    phase: Phase,
    display_name: String,
    next_mid: u16,
    pending: Option<Pending>,
    queue: VecDeque<UserCommand>,
    timeout: Duration,
    max_retries: u32,
}

impl ChatSession {
    pub async fn connect(cfg: &ChatConfig) -> Result<Self, ChatError> {
        let addr = format!("{}:{}", cfg.host, cfg.port);
        let transport = match cfg.transport {
            TransportKind::Tcp => TransportHandle::Tcp(TcpTransport::connect(addr).await?),
            TransportKind::Udp => {
                let server_addr = tokio::net::lookup_host(&addr)
                    .await
                    .map_err(ChatError::ResolveOrConnect)?
                    .next()
                    .ok_or_else(|| ChatError::Config(format!("could not resolve {addr}")))?;
                TransportHandle::Udp(UdpTransport::connect(server_addr).await?)
            }
        };
        Ok(Self {
            transport,
            phase: Phase::Start,
            display_name: String::new(),
            next_mid: 0,
            pending: None,
            queue: VecDeque::new(),
            timeout: Duration::from_millis(cfg.timeout_ms),
            max_retries: cfg.max_retries,
        })
    }

    /// Runs the reactor to completion, returning the process exit code.
    pub async fn run(&mut self, stdin_rx: mpsc::Receiver<Option<String>>) -> Result<i32, ChatError> {
        let is_udp = matches!(self.transport, TransportHandle::Udp(_));
        if is_udp {
            self.run_udp(stdin_rx).await
        } else {
            self.run_tcp(stdin_rx).await
        }
    }

    async fn run_tcp(&mut self, mut stdin_rx: mpsc::Receiver<Option<String>>) -> Result<i32, ChatError> {
        loop {
            if self.phase.is_terminal() {
                return Ok(exit_code_for(self.phase));
            }

            tokio::select! {
                line = stdin_rx.recv() => {
                    match line {
                        Some(Some(text)) => self.handle_input_line(&text).await?,
                        Some(None) | None => self.handle_shutdown_signal().await?,
                    }
                }
                msg = self.recv_tcp() => {
                    match msg {
                        Ok(msg) => self.handle_inbound(msg).await?,
                        Err(e @ ChatError::ProtocolParse(_)) => {
                            warn!(error = %e, "malformed TCP line; dropping");
                        }
                        Err(e) => return self.handle_fatal(e).await,
                    }
                }
            }

            if !self.phase.is_terminal() {
                self.drain_queue().await?;
            }
        }
    }

    async fn run_udp(&mut self, mut stdin_rx: mpsc::Receiver<Option<String>>) -> Result<i32, ChatError> {
        loop {
            if self.phase.is_terminal() && self.pending.is_none() {
                return Ok(exit_code_for(self.phase));
            }

            let deadline = self
                .pending
                .as_ref()
                .map(|p| p.deadline(self.timeout))
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(60 * 60 * 24));

            tokio::select! {
                _ = tokio::time::sleep_until(deadline), if self.pending.is_some() => {
                    self.on_timeout().await?;
                }
                line = stdin_rx.recv(), if !self.phase.is_terminal() => {
                    match line {
                        Some(Some(text)) => self.handle_input_line(&text).await?,
                        Some(None) | None => self.handle_shutdown_signal().await?,
                    }
                }
                frame = self.recv_udp_frame() => {
                    match frame {
                        Ok(bytes) => self.handle_udp_datagram(&bytes).await?,
                        Err(e) => return self.handle_fatal(e).await,
                    }
                }
            }

            if !self.phase.is_terminal() {
                self.drain_queue().await?;
            }
        }
    }

    async fn recv_tcp(&mut self) -> Result<ChatMessage, ChatError> {
        match &mut self.transport {
            TransportHandle::Tcp(t) => t.recv_message().await,
            TransportHandle::Udp(_) => unreachable!("run_tcp only drives a TCP transport"),
        }
    }

    async fn recv_udp_frame(&mut self) -> Result<Vec<u8>, ChatError> {
        match &mut self.transport {
            TransportHandle::Udp(t) => t.recv_frame().await,
            TransportHandle::Tcp(_) => unreachable!("run_udp only drives a UDP transport"),
        }
    }

    async fn on_timeout(&mut self) -> Result<(), ChatError> {
        let now = Instant::now();
        let outcome = self
            .pending
            .as_mut()
            .expect("timer branch only fires while pending is Some")
            .on_timeout(now);

        match outcome {
            PollOutcome::Resend => {
                let bytes = self.pending.as_ref().unwrap().bytes().to_vec();
                if let TransportHandle::Udp(t) = &mut self.transport {
                    t.send_to_peer(&bytes).await?;
                }
            }
            PollOutcome::Exhausted => {
                print_local_error(&reliability::exhaustion_error(self.max_retries));
                self.pending = None;
                self.phase = self.phase.transition(Event::RetryExhausted)?;
            }
            PollOutcome::StillWaiting => {}
        }
        Ok(())
    }

    async fn handle_udp_datagram(&mut self, bytes: &[u8]) -> Result<(), ChatError> {
        match binary::decode(bytes) {
            Ok(Frame::Confirm(mid)) => {
                let confirmed = self.pending.as_ref().is_some_and(|p| p.confirms(mid));
                if confirmed {
                    self.pending = None;
                    self.next_mid = self.next_mid.wrapping_add(1);
                } else {
                    warn!(mid, "Confirm for unexpected message id; ignoring");
                }
            }
            Ok(Frame::Message(msg, mid)) => {
                self.send_confirm(mid).await?;
                self.handle_inbound(msg).await?;
            }
            Err(e) => {
                warn!(error = %e, "malformed UDP frame; dropping");
            }
        }
        Ok(())
    }

    async fn send_confirm(&mut self, mid: u16) -> Result<(), ChatError> {
        if let TransportHandle::Udp(t) = &mut self.transport {
            let frame = binary::encode_confirm(mid);
            t.send_to_peer(&frame).await?;
        }
        Ok(())
    }

    async fn handle_inbound(&mut self, msg: ChatMessage) -> Result<(), ChatError> {
        match msg {
            ChatMessage::Reply { ok, content } => match self.phase {
                Phase::AwaitingAuthReply | Phase::AwaitingJoinReply => {
                    if ok {
                        eprintln!("Success: {content}");
                        self.phase = self.phase.transition(Event::ReplyOk)?;
                    } else {
                        eprintln!("Failure: {content}");
                        self.phase = self.phase.transition(Event::ReplyNok)?;
                    }
                }
                other => warn!(phase = ?other, "unexpected Reply; ignoring"),
            },
            ChatMessage::Msg {
                display_name,
                content,
            } => {
                println!("{display_name}: {content}");
            }
            ChatMessage::Err {
                display_name,
                content,
            } => {
                eprintln!("ERR FROM {display_name}: {content}");
                self.phase = self.phase.transition(Event::InboundErr)?;
                let _ = self.transmit(ChatMessage::Bye).await;
            }
            ChatMessage::Bye => {
                self.phase = self.phase.transition(Event::InboundBye)?;
            }
            ChatMessage::Auth { .. } | ChatMessage::Join { .. } => {
                warn!("received a client-originated message kind from the peer; ignoring");
            }
        }
        Ok(())
    }

    async fn handle_shutdown_signal(&mut self) -> Result<(), ChatError> {
        self.transmit(ChatMessage::Bye).await?;
        self.phase = self.phase.transition(Event::Eof)?;
        Ok(())
    }

    async fn handle_fatal(&mut self, e: ChatError) -> Result<i32, ChatError> {
        error!(error = %e, "fatal transport error; attempting a best-effort BYE");
        let _ = self.transmit(ChatMessage::Bye).await;
        Ok(1)
    }

    async fn handle_input_line(&mut self, line: &str) -> Result<(), ChatError> {
        let cmd = match commands::parse_line(line) {
            Ok(cmd) => cmd,
            Err(e) => {
                print_local_error(&e);
                return Ok(());
            }
        };

        match cmd {
            UserCommand::Rename { display_name } => {
                self.display_name = display_name;
                return Ok(());
            }
            UserCommand::Help => {
                print!("{}", crate::cli::USAGE);
                return Ok(());
            }
            _ => {}
        }

        let required = match &cmd {
            UserCommand::Auth { .. } => Command::Auth,
            UserCommand::Join { .. } => Command::Join,
            UserCommand::Msg { .. } => Command::Msg,
            UserCommand::Rename { .. } | UserCommand::Help => unreachable!(),
        };

        // `allows` answers "is this admissible at all from here" (pre-auth
        // commands are rejected outright); `is_blocked` below then decides
        // whether an admissible command dispatches now or waits in `queue`.
        if !self.phase.allows(required) {
            print_local_error(&ChatError::PhaseViolation(format!(
                "{required:?} is not allowed in phase {:?}",
                self.phase
            )));
            return Ok(());
        }

        if self.is_blocked() {
            if self.queue.len() >= QUEUE_CAP {
                print_local_error(&ChatError::LocalValidation(
                    "command queue is full".to_string(),
                ));
                return Ok(());
            }
            eprintln!("ERR: queued (awaiting a pending reply/confirm)");
            self.queue.push_back(cmd);
            return Ok(());
        }

        self.execute(cmd).await
    }

    fn is_blocked(&self) -> bool {
        matches!(self.phase, Phase::AwaitingAuthReply | Phase::AwaitingJoinReply) || self.pending.is_some()
    }

    async fn drain_queue(&mut self) -> Result<(), ChatError> {
        while !self.is_blocked() {
            let Some(cmd) = self.queue.pop_front() else {
                break;
            };
            self.execute(cmd).await?;
        }
        Ok(())
    }

    async fn execute(&mut self, cmd: UserCommand) -> Result<(), ChatError> {
        match cmd {
            UserCommand::Auth {
                username,
                secret,
                display_name,
            } => {
                self.display_name = display_name.clone();
                self.transmit(ChatMessage::Auth {
                    username,
                    secret,
                    display_name,
                })
                .await?;
                self.phase = self.phase.transition(Event::AuthSent)?;
            }
            UserCommand::Join { channel_id } => {
                self.transmit(ChatMessage::Join {
                    channel_id,
                    display_name: self.display_name.clone(),
                })
                .await?;
                self.phase = self.phase.transition(Event::JoinSent)?;
            }
            UserCommand::Msg { content } => {
                self.transmit(ChatMessage::Msg {
                    display_name: self.display_name.clone(),
                    content,
                })
                .await?;
            }
            UserCommand::Rename { .. } | UserCommand::Help => unreachable!("handled before queueing"),
        }
        Ok(())
    }

    /// Sends `msg`. On UDP this also registers it as the one outstanding
    /// `Pending` frame under the current `next_mid`.
    async fn transmit(&mut self, msg: ChatMessage) -> Result<(), ChatError> {
        match &mut self.transport {
            TransportHandle::Tcp(t) => t.send_message(&msg).await,
            TransportHandle::Udp(t) => {
                let mid = self.next_mid;
                let frame = binary::encode(&msg, mid, 0);
                t.send_to_peer(&frame).await?;
                self.pending = Some(Pending::new(
                    frame.freeze(),
                    mid,
                    self.max_retries,
                    Instant::now(),
                ));
                Ok(())
            }
        }
    }
}

fn exit_code_for(phase: Phase) -> i32 {
    if matches!(phase, Phase::Failed) {
        1
    } else {
        0
    }
}

fn print_local_error(e: &ChatError) {
    eprintln!("ERR: {e}");
}
