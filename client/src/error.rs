use pylon_common::protocol::{CommandType, ErrorCode, Packet};

use crate::connection;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by producer and consumer sessions.
///
/// Nothing is retried: the session stays in whatever state the failing call
/// left it in, and the caller decides whether to run the operation again.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// the connection failed to send or receive
    #[error("failed to {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: connection::Error,
    },
    /// topic lookup failed before any command was sent
    #[error("failed to lookup topic {topic}: {source}")]
    Lookup {
        topic: String,
        #[source]
        source: connection::Error,
    },
    /// the reply does not match the command that was sent
    #[error("received unexpected command: expected {expected}, found {found}")]
    UnexpectedCommand {
        expected: CommandType,
        found: CommandType,
    },
    /// the broker answered with an error reply
    #[error("receive error from server on {operation}: {code}: {message}")]
    FromServer {
        operation: &'static str,
        code: ErrorCode,
        message: String,
    },
    #[error("batch message is empty")]
    EmptyBatch,
    #[error("no flow permits granted to consumer {consumer_id}")]
    NoFlowPermits { consumer_id: u64 },
    #[error("failed to connect: {0}")]
    Connect(#[source] connection::Error),
}

impl Error {
    /// error for a reply that is not `expected`
    pub(crate) fn unexpected_reply(
        operation: &'static str,
        expected: CommandType,
        reply: Packet,
    ) -> Self {
        match reply {
            Packet::Error(e) => Error::FromServer {
                operation,
                code: e.code,
                message: e.message,
            },
            Packet::SendError(e) => Error::FromServer {
                operation,
                code: e.code,
                message: e.message,
            },
            p => Error::UnexpectedCommand {
                expected,
                found: p.command_type(),
            },
        }
    }
}

pub(crate) trait WrapError<T> {
    /// tag a connection failure with the operation that was attempted
    fn wrap(self, operation: &'static str) -> Result<T>;
}

impl<T> WrapError<T> for connection::Result<T> {
    fn wrap(self, operation: &'static str) -> Result<T> {
        self.map_err(|source| Error::Transport { operation, source })
    }
}
