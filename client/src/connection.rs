mod error;
mod framed;
#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use pylon_common::protocol::Packet;

pub use error::{Error, Result};
pub use framed::{ConnectOptions, FramedConnection, PROTOCOL_VERSION};

/// A connection already established with the broker, shared by any number of
/// producer and consumer sessions.
///
/// Sessions assume one outstanding request at a time: the next `receive`
/// yields the reply to the last request sent. Serializing writes and keeping
/// replies in request order is up to the implementation.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn send(&self, request: Packet) -> Result<()>;

    async fn receive(&self) -> Result<Packet>;

    /// make sure `topic` is served by this connection
    async fn resolve_and_connect(
        &self,
        topic: &str,
        request_id: u64,
        authoritative: bool,
    ) -> Result<()>;
}
