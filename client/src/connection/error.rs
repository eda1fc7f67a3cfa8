use std::io;

use pylon_common::protocol::{self, CommandType, ErrorCode};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] protocol::Error),
    #[error("connection closed by peer")]
    Disconnected,
    #[error("wait for reply timeout")]
    Timeout,
    /// redirects are not followed, the caller has to connect to `broker_url`
    #[error("topic is served by another broker: {broker_url}")]
    Redirect { broker_url: String },
    #[error("lookup failed: {0}")]
    LookupFailed(String),
    #[error("received unexpected command: expected {expected}, found {found}")]
    UnexpectedCommand {
        expected: CommandType,
        found: CommandType,
    },
    #[error("receive error from server: {code}: {message}")]
    FromServer { code: ErrorCode, message: String },
}
