//! Stream id handshake
//!
//! The whole handshake is a single 4-byte message from the client:
//!
//! ```text
//! Client                                   Server
//!   |                                        |
//!   |------- stream id (i32, LE) ----------->|
//!   |                                        |
//!   |        [accepted: frames follow]       |
//!   |        [rejected: socket closed]       |
//! ```
//!
//! The server never writes anything in response. A rejected client only
//! sees the connection close.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::constants::STREAM_ID_SIZE;
use super::StreamCategory;
use crate::error::HandshakeError;

/// Read the raw stream id
pub async fn read_stream_id<R>(reader: &mut R) -> Result<i32, HandshakeError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; STREAM_ID_SIZE];
    reader.read_exact(&mut buf).await.map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            HandshakeError::Truncated
        } else {
            HandshakeError::Io(e)
        }
    })?;

    Ok(i32::from_le_bytes(buf))
}

/// Map a raw stream id to its category
pub fn resolve_stream_id(id: i32) -> Result<StreamCategory, HandshakeError> {
    StreamCategory::from_stream_id(id).ok_or(HandshakeError::UnknownStreamId(id))
}

/// Read and resolve the stream id, giving up after `timeout`
pub async fn perform<R>(reader: &mut R, timeout: Duration) -> Result<StreamCategory, HandshakeError>
where
    R: AsyncRead + Unpin,
{
    let id = tokio::time::timeout(timeout, read_stream_id(reader))
        .await
        .map_err(|_| HandshakeError::TimedOut)??;

    resolve_stream_id(id)
}

/// Bytes a client sends to subscribe to `category`
pub fn encode_stream_id(category: StreamCategory) -> [u8; STREAM_ID_SIZE] {
    category.stream_id().to_le_bytes()
}
