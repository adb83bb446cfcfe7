//! Transport adapters.
//!
//! `TcpTransport` and `UdpTransport` wrap a `tokio::net` socket, framing
//! per the wire grammars in [`crate::codec`] instead of length-prefixed
//! JSON. Kept as two concrete types rather than a shared trait object: the
//! reactor already knows which one it's driving from `ChatConfig::transport`
//! and the two frame at different granularities (line vs. datagram), so a
//! common trait would either leak that difference back out or paper over
//! it.

use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs, UdpSocket};

use crate::codec::text;
use crate::error::ChatError;
use crate::message::ChatMessage;

/// TCP transport: one `ChatMessage` per `\r\n`-terminated line.
pub struct TcpTransport {
    stream: TcpStream,
    read_buf: BytesMut,
}

impl TcpTransport {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ChatError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(ChatError::ResolveOrConnect)?;
        Ok(Self {
            stream,
            read_buf: BytesMut::with_capacity(4096),
        })
    }

    pub async fn send_message(&mut self, msg: &ChatMessage) -> Result<(), ChatError> {
        let frame = text::encode(msg);
        self.stream
            .write_all(&frame)
            .await
            .map_err(ChatError::TransportIo)
    }

    /// Reads one `\r\n`-terminated line, reassembling across reads as
    /// needed, and decodes it.
    pub async fn recv_message(&mut self) -> Result<ChatMessage, ChatError> {
        loop {
            if let Some(pos) = find_crlf(&self.read_buf) {
                let line = self.read_buf.split_to(pos);
                let _ = self.read_buf.split_to(2); // drop the \r\n itself
                let line = std::str::from_utf8(&line)
                    .map_err(|e| ChatError::ProtocolParse(format!("non-UTF8 TCP line: {e}")))?;
                return text::decode(line);
            }

            let mut chunk = [0u8; 4096];
            let n = self
                .stream
                .read(&mut chunk)
                .await
                .map_err(ChatError::TransportIo)?;
            if n == 0 {
                return Err(ChatError::TransportIo(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "peer closed TCP connection",
                )));
            }
            self.read_buf.extend_from_slice(&chunk[..n]);
        }
    }

    pub fn peer_addr(&self) -> Result<SocketAddr, ChatError> {
        self.stream.peer_addr().map_err(ChatError::TransportIo)
    }

    pub async fn close(&mut self) -> Result<(), ChatError> {
        self.stream.shutdown().await.map_err(ChatError::TransportIo)
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// UDP transport: one frame per datagram, tracking the peer's address
/// across replies (the server answers from an ephemeral port distinct
/// from the one the first datagram was sent to).
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpTransport {
    pub async fn connect(server_addr: SocketAddr) -> Result<Self, ChatError> {
        let bind_addr: SocketAddr = if server_addr.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(ChatError::ResolveOrConnect)?;
        socket
            .set_broadcast(true)
            .map_err(ChatError::ResolveOrConnect)?;
        Ok(Self {
            socket,
            peer: server_addr,
        })
    }

    /// Sends a raw, already-framed datagram to the current peer address.
    pub async fn send_to_peer(&self, frame: &[u8]) -> Result<(), ChatError> {
        self.socket
            .send_to(frame, self.peer)
            .await
            .map_err(ChatError::TransportIo)?;
        Ok(())
    }

    /// Receives one datagram, adopting its source as the new peer address.
    pub async fn recv_frame(&mut self) -> Result<Vec<u8>, ChatError> {
        let mut buf = vec![0u8; 64 * 1024];
        let (n, from) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(ChatError::TransportIo)?;
        self.peer = from;
        buf.truncate(n);
        Ok(buf)
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ChatError> {
        self.socket.local_addr().map_err(ChatError::TransportIo)
    }
}
