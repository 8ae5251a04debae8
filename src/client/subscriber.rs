//! Frame subscriber
//!
//! Client side of the relay: connect, send the stream id for one category,
//! then read length-prefixed frames until the server closes the socket.

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{DecodeError, Result};
use crate::protocol::handshake::encode_stream_id;
use crate::protocol::{DecodedFrame, StreamCategory};

/// Largest payload a subscriber will allocate for
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Subscriber for a single category
///
/// # Example
/// ```no_run
/// use pose_relay::client::FrameSubscriber;
/// use pose_relay::StreamCategory;
///
/// # async fn example() -> pose_relay::Result<()> {
/// let addr = "127.0.0.1:9009".parse().unwrap();
/// let mut body = FrameSubscriber::connect(addr, StreamCategory::ClosestBody).await?;
///
/// while let Some(frame) = body.next_frame().await? {
///     println!("t={} code={}", frame.timestamp, frame.code);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FrameSubscriber<S = TcpStream> {
    stream: S,
    category: StreamCategory,
    frames_received: u64,
}

impl FrameSubscriber<TcpStream> {
    /// Connect to a relay and subscribe to `category`
    pub async fn connect(addr: SocketAddr, category: StreamCategory) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        tracing::debug!(addr = %addr, category = %category, "Connected to relay");
        Self::subscribe(stream, category).await
    }
}

impl<S> FrameSubscriber<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Send the stream id over an already connected stream
    pub async fn subscribe(mut stream: S, category: StreamCategory) -> Result<Self> {
        stream.write_all(&encode_stream_id(category)).await?;
        stream.flush().await?;

        Ok(Self {
            stream,
            category,
            frames_received: 0,
        })
    }

    pub fn category(&self) -> StreamCategory {
        self.category
    }

    /// Frames read so far
    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Read the next frame
    ///
    /// Returns `Ok(None)` when the server closes the connection between
    /// frames. A rejected subscription looks the same: the server closes
    /// without sending anything.
    pub async fn next_frame(&mut self) -> Result<Option<DecodedFrame>> {
        let len = match self.stream.read_i32_le().await {
            Ok(len) => len,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if len < 0 || len as usize > MAX_FRAME_SIZE {
            return Err(DecodeError::InvalidLength(len).into());
        }

        let mut payload = vec![0u8; len as usize];
        self.stream.read_exact(&mut payload).await.map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                DecodeError::Truncated {
                    expected: len as usize,
                    actual: 0,
                }
                .into()
            } else {
                crate::Error::from(e)
            }
        })?;

        let frame = DecodedFrame::decode(self.category, &payload)?;
        self.frames_received += 1;
        Ok(Some(frame))
    }
}
