//! Error types
//!
//! Transport, handshake and setup decoding failures are fatal for a run.
//! [`QueryError`] covers a single extension round trip and is downgraded to a
//! gap in the report by the caller.

use crate::protocol::{DecodeError, X11Error};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to open a byte stream to the display
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to resolve X server host name '{host}': {reason}")]
    ResolutionFailed { host: String, reason: String },

    #[error("failed to connect to X server at {address}: {source}")]
    ConnectFailed {
        address: String,
        #[source]
        source: io::Error,
    },
}

/// Failure while talking to the server over an open connection
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to write to X server: {0}")]
    WriteFailed(#[source] io::Error),

    #[error("failed to read from X server: {0}")]
    ReadFailed(#[source] io::Error),

    /// The stream ended before a complete structure arrived
    #[error("X server closed the connection before sending {expected} bytes")]
    Truncated { expected: usize },

    #[error("X server rejected the connection: {reason}")]
    Rejected { reason: String },

    #[error("unknown connection setup status {0}")]
    UnknownSetupStatus(u8),

    #[error("unexpected reply status {0}")]
    UnexpectedStatus(u8),

    #[error("{0}")]
    Server(X11Error),

    #[error("malformed data from X server: {0}")]
    Decode(#[from] DecodeError),
}

impl ProtocolError {
    /// Classify a failed read, treating end-of-stream as truncation
    pub(crate) fn from_read(err: io::Error, expected: usize) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ProtocolError::Truncated { expected }
        } else {
            ProtocolError::ReadFailed(err)
        }
    }
}

/// Failure of a single extension query
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("no known version query for extension {0}")]
    UnknownDialect(String),

    #[error("unexpected reply status {0}")]
    UnexpectedStatus(u8),

    #[error("{0}")]
    Server(X11Error),

    #[error("reply truncated")]
    Truncated,

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    #[error("malformed reply: {0}")]
    Decode(#[from] DecodeError),
}

impl From<ProtocolError> for QueryError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::WriteFailed(e) | ProtocolError::ReadFailed(e) => QueryError::Io(e),
            ProtocolError::Truncated { .. } => QueryError::Truncated,
            ProtocolError::UnexpectedStatus(status) => QueryError::UnexpectedStatus(status),
            ProtocolError::Server(e) => QueryError::Server(e),
            ProtocolError::Decode(e) => QueryError::Decode(e),
            ProtocolError::Rejected { reason } => {
                QueryError::Io(io::Error::new(io::ErrorKind::Other, reason))
            }
            ProtocolError::UnknownSetupStatus(status) => QueryError::UnexpectedStatus(status),
        }
    }
}

/// Failure reading local authorization data
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to open Xauthority file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to determine the local host name: {0}")]
    Hostname(#[source] io::Error),
}

/// Top-level error of a run
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid X display name '{0}'")]
    InvalidTarget(String),

    #[error("no X authentication data for host '{hostname}' display {display}")]
    CredentialUnavailable { hostname: String, display: u32 },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("failed to write report: {0}")]
    Output(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
