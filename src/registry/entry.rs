//! Subscriber connection
//!
//! A connection is created by the acceptor after a successful handshake and
//! lives in the registry until a send fails or it is removed. Dropping it
//! closes the socket.

use std::future::poll_fn;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::Poll;
use std::time::{Duration, Instant};

use tokio::io::AsyncWrite;

use crate::error::SendError;
use crate::protocol::{EncodedFrame, StreamCategory};

/// Write side of a subscriber socket
pub type FrameSink = Box<dyn AsyncWrite + Send + Unpin>;

/// A registered subscriber
pub struct ClientConnection {
    /// Unique connection ID
    pub id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Category bound at handshake
    pub category: StreamCategory,

    /// Cleared when a send fails or would block; the connection is then
    /// evicted
    pub active: bool,

    /// When the handshake completed
    pub connected_at: Instant,

    /// Frames written
    pub frames_sent: u64,

    /// Bytes written
    pub bytes_sent: u64,

    sink: FrameSink,
}

impl ClientConnection {
    /// Create an active connection
    pub fn new(id: u64, peer_addr: SocketAddr, category: StreamCategory, sink: FrameSink) -> Self {
        Self {
            id,
            peer_addr,
            category,
            active: true,
            connected_at: Instant::now(),
            frames_sent: 0,
            bytes_sent: 0,
            sink,
        }
    }

    /// Write one frame without waiting on the subscriber
    ///
    /// The frame goes out whole or not at all from the caller's point of
    /// view: if the socket cannot take every byte right now the frame is
    /// abandoned, its framing on the wire is broken, and the connection is
    /// marked inactive. The caller is expected to remove it from the
    /// registry.
    pub async fn send(&mut self, frame: &EncodedFrame) -> Result<(), SendError> {
        let data = &frame.data[..];
        let sink = &mut self.sink;
        let mut written = 0;

        let result = poll_fn(|cx| {
            while written < data.len() {
                match Pin::new(&mut *sink).poll_write(cx, &data[written..]) {
                    Poll::Ready(Ok(0)) => {
                        return Poll::Ready(Err(SendError::Io(io::ErrorKind::WriteZero.into())))
                    }
                    Poll::Ready(Ok(n)) => written += n,
                    Poll::Ready(Err(e)) => return Poll::Ready(Err(SendError::Io(e))),
                    Poll::Pending => return Poll::Ready(Err(SendError::Full)),
                }
            }

            match Pin::new(&mut *sink).poll_flush(cx) {
                Poll::Ready(Ok(())) => Poll::Ready(Ok(())),
                Poll::Ready(Err(e)) => Poll::Ready(Err(SendError::Io(e))),
                Poll::Pending => Poll::Ready(Err(SendError::Full)),
            }
        })
        .await;

        match result {
            Ok(()) => {
                self.frames_sent += 1;
                self.bytes_sent += frame.len() as u64;
                Ok(())
            }
            Err(e) => {
                if written > 0 {
                    tracing::debug!(
                        conn_id = self.id,
                        written = written,
                        total = data.len(),
                        "Partial frame written"
                    );
                }
                self.active = false;
                Err(e)
            }
        }
    }

    /// Snapshot of this connection's counters
    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            id: self.id,
            peer_addr: self.peer_addr,
            category: self.category,
            active: self.active,
            duration: self.connected_at.elapsed(),
            frames_sent: self.frames_sent,
            bytes_sent: self.bytes_sent,
        }
    }
}

impl std::fmt::Debug for ClientConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConnection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .field("category", &self.category)
            .field("active", &self.active)
            .field("frames_sent", &self.frames_sent)
            .finish()
    }
}

/// Statistics for a connection
#[derive(Debug, Clone)]
pub struct ConnectionStats {
    pub id: u64,
    pub peer_addr: SocketAddr,
    pub category: StreamCategory,
    pub active: bool,
    /// Time since the handshake completed
    pub duration: Duration,
    pub frames_sent: u64,
    pub bytes_sent: u64,
}
