//! Bolt protocol error types.

use std::fmt;
use std::io;

use super::packstream::PackStreamError;

/// Result type for Bolt operations.
pub type BoltResult<T> = Result<T, BoltError>;

/// Bolt protocol errors.
#[derive(Debug)]
pub enum BoltError {
    /// I/O error
    Io(io::Error),

    /// Handshake error
    Handshake(HandshakeError),

    /// PackStream serialization error
    PackStream(PackStreamError),

    /// Unexpected message or malformed message content
    Protocol(String),

    /// TLS setup or handshake error
    Tls(String),

    /// Server rejected the credentials
    Authentication { code: String, message: String },

    /// Server answered a request with FAILURE
    Failure { code: String, message: String },

    /// Message too large
    MessageTooLarge { size: usize, max: usize },

    /// Timeout error
    Timeout,

    /// Peer closed the stream
    ConnectionClosed,
}

impl fmt::Display for BoltError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoltError::Io(e) => write!(f, "I/O error: {}", e),
            BoltError::Handshake(e) => write!(f, "Handshake error: {}", e),
            BoltError::PackStream(e) => write!(f, "PackStream error: {}", e),
            BoltError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            BoltError::Tls(msg) => write!(f, "TLS error: {}", msg),
            BoltError::Authentication { code, message } => {
                write!(f, "Authentication failed: {} ({})", message, code)
            }
            BoltError::Failure { code, message } => write!(f, "{}: {}", code, message),
            BoltError::MessageTooLarge { size, max } => {
                write!(f, "Message too large: {} bytes (max: {})", size, max)
            }
            BoltError::Timeout => write!(f, "Operation timed out"),
            BoltError::ConnectionClosed => write!(f, "Connection closed by server"),
        }
    }
}

impl std::error::Error for BoltError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BoltError::Io(e) => Some(e),
            BoltError::Handshake(e) => Some(e),
            BoltError::PackStream(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for BoltError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => BoltError::ConnectionClosed,
            _ => BoltError::Io(err),
        }
    }
}

impl From<HandshakeError> for BoltError {
    fn from(err: HandshakeError) -> Self {
        BoltError::Handshake(err)
    }
}

impl From<PackStreamError> for BoltError {
    fn from(err: PackStreamError) -> Self {
        BoltError::PackStream(err)
    }
}

/// Handshake-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// Server agreed to none of the proposed versions
    NoCompatibleVersion,

    /// Server picked a version that was never proposed
    UnexpectedVersion { major: u8, minor: u8 },

    /// Server answered with something other than a Bolt version (e.g. HTTP)
    InvalidResponse([u8; 4]),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::NoCompatibleVersion => {
                write!(f, "No compatible protocol version found")
            }
            HandshakeError::UnexpectedVersion { major, minor } => {
                write!(f, "Server selected unproposed version {}.{}", major, minor)
            }
            HandshakeError::InvalidResponse(bytes) => {
                write!(f, "Invalid handshake response {:02X?}", bytes)
            }
        }
    }
}

impl std::error::Error for HandshakeError {}
