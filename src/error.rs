//! Error types
//!
//! Each failure class of the relay has its own error type so the server loop
//! can route it to a distinct handler:
//!
//! - [`HandshakeError`]: a new client presented a bad or duplicate stream id
//! - [`ParseError`]: an upstream payload line did not match its category
//! - [`SendError`]: a subscriber could not take a frame
//! - [`Error::UpstreamClosed`]: the engine's output stream ended
//!
//! The first three are handled inside the server loop and never reach
//! [`Error`]. Only the last one is fatal.

use std::fmt;
use std::io;

use crate::protocol::StreamCategory;
use crate::registry::RegistryError;

/// Result alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// I/O error on the listener or upstream stream
    Io(io::Error),
    /// Wire frame could not be decoded
    Decode(DecodeError),
    /// Configured crop size does not fit the i32 length prefix
    FrameTooLarge {
        category: StreamCategory,
        size: usize,
    },
    /// The upstream engine closed its output
    UpstreamClosed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Decode(e) => write!(f, "Decode error: {}", e),
            Error::FrameTooLarge { category, size } => write!(
                f,
                "{} frames would be {} bytes, larger than a length prefix can carry",
                category, size
            ),
            Error::UpstreamClosed => write!(f, "Upstream stream closed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Decode(e) => Some(e),
            Error::FrameTooLarge { .. } | Error::UpstreamClosed => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode(e)
    }
}

/// Handshake failures
///
/// In every case the socket is dropped without a response.
#[derive(Debug)]
pub enum HandshakeError {
    /// Peer closed before sending all 4 bytes of the stream id
    Truncated,
    /// Peer did not send the stream id in time
    TimedOut,
    /// Stream id is not one of the known categories
    UnknownStreamId(i32),
    /// Another client already holds the category
    CategoryTaken(StreamCategory),
    /// Socket error during the handshake
    Io(io::Error),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::Truncated => write!(f, "stream id truncated"),
            HandshakeError::TimedOut => write!(f, "timed out waiting for stream id"),
            HandshakeError::UnknownStreamId(id) => write!(f, "unknown stream id: {}", id),
            HandshakeError::CategoryTaken(category) => {
                write!(f, "category already has a subscriber: {}", category)
            }
            HandshakeError::Io(e) => write!(f, "socket error: {}", e),
        }
    }
}

impl std::error::Error for HandshakeError {}

impl From<RegistryError> for HandshakeError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::CategoryTaken(category) => HandshakeError::CategoryTaken(category),
        }
    }
}

/// Upstream payload line did not match the category's fixed arity
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Wrong number of whitespace-separated values
    ArityMismatch {
        category: StreamCategory,
        expected: usize,
        actual: usize,
    },
    /// A value could not be parsed as the category's numeric type
    InvalidToken {
        category: StreamCategory,
        token: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::ArityMismatch {
                category,
                expected,
                actual,
            } => write!(
                f,
                "{} payload has {} values, expected {}",
                category, actual, expected
            ),
            ParseError::InvalidToken { category, token } => {
                write!(f, "{} payload has invalid value {:?}", category, token)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Frame delivery failures
#[derive(Debug)]
pub enum SendError {
    /// Subscriber socket could not take the whole frame without blocking
    Full,
    /// Subscriber socket is no longer writable
    Io(io::Error),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Full => write!(f, "subscriber send buffer full"),
            SendError::Io(e) => write!(f, "socket error: {}", e),
        }
    }
}

impl std::error::Error for SendError {}

/// Wire frame decoding failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload shorter than its layout requires
    Truncated { expected: usize, actual: usize },
    /// Length prefix is negative
    InvalidLength(i32),
    /// Payload size does not match the declared dimensions
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated { expected, actual } => {
                write!(f, "frame truncated: {} of {} bytes", actual, expected)
            }
            DecodeError::InvalidLength(len) => write!(f, "invalid length prefix: {}", len),
            DecodeError::SizeMismatch { expected, actual } => {
                write!(f, "frame size {} does not match layout size {}", actual, expected)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::ArityMismatch {
            category: StreamCategory::ClosestBody,
            expected: 55,
            actual: 3,
        };
        assert_eq!(err.to_string(), "ClosestBody payload has 3 values, expected 55");
    }

    #[test]
    fn test_registry_error_maps_to_handshake_error() {
        let err: HandshakeError = RegistryError::CategoryTaken(StreamCategory::HandColorLH).into();
        assert!(matches!(
            err,
            HandshakeError::CategoryTaken(StreamCategory::HandColorLH)
        ));
    }

    #[test]
    fn test_upstream_closed_has_no_source() {
        use std::error::Error as _;

        let err = Error::UpstreamClosed;
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "Upstream stream closed");
    }

    #[test]
    fn test_frame_too_large_display() {
        let err = Error::FrameTooLarge {
            category: StreamCategory::HeadColor,
            size: 3_000_000_000,
        };
        assert!(err.to_string().starts_with("HeadColor frames would be 3000000000 bytes"));
    }
}
