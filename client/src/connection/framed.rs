use std::{net::SocketAddr, time::Duration};

use async_trait::async_trait;
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use log::{debug, trace};
use pylon_common::protocol::{CommandType, Connect, Lookup, LookupType, Packet, PacketCodec};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
    sync::Mutex,
    time::timeout,
};
use tokio_util::codec::Framed;

use super::{Connection, Error, Result};

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub client_version: String,
    /// keepalive(ms) announced to the broker
    pub keepalive: u32,
    /// deadline for every receive, none by default
    pub operation_timeout: Option<Duration>,
}

impl ConnectOptions {
    pub const DEFAULT_KEEPALIVE_MS: u32 = 10000;
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            client_version: concat!("pylon-client-", env!("CARGO_PKG_VERSION")).to_string(),
            keepalive: Self::DEFAULT_KEEPALIVE_MS,
            operation_timeout: None,
        }
    }
}

/// [`Connection`] over a single byte stream.
///
/// Writes go through one lock and reads through another, so concurrent
/// senders are serialized in the order they acquire the sink. PING packets
/// from the broker are answered inside `receive` and never surface.
pub struct FramedConnection<T> {
    sink: Mutex<SplitSink<Framed<T, PacketCodec>, Packet>>,
    stream: Mutex<SplitStream<Framed<T, PacketCodec>>>,
    operation_timeout: Option<Duration>,
    server_version: Option<String>,
}

impl FramedConnection<TcpStream> {
    pub async fn connect(addr: SocketAddr, options: &ConnectOptions) -> Result<Self> {
        trace!("connection::connect: connect to {addr}");
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Self::handshake(stream, options).await
    }
}

impl<T> FramedConnection<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// wrap a stream, skipping the CONNECT handshake
    pub fn new(io: T, operation_timeout: Option<Duration>) -> Self {
        let (sink, stream) = Framed::new(io, PacketCodec).split::<Packet>();
        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            operation_timeout,
            server_version: None,
        }
    }

    pub async fn handshake(io: T, options: &ConnectOptions) -> Result<Self> {
        let mut conn = Self::new(io, options.operation_timeout);
        conn.send(Packet::Connect(Connect {
            client_version: options.client_version.clone(),
            protocol_version: PROTOCOL_VERSION,
            keepalive: options.keepalive,
        }))
        .await?;
        match conn.receive().await? {
            Packet::Connected(connected) => {
                debug!(
                    "connected to broker {}, protocol version {}",
                    connected.server_version, connected.protocol_version
                );
                conn.server_version = Some(connected.server_version);
                Ok(conn)
            }
            Packet::Error(e) => Err(Error::FromServer {
                code: e.code,
                message: e.message,
            }),
            p => Err(Error::UnexpectedCommand {
                expected: CommandType::Connected,
                found: p.command_type(),
            }),
        }
    }

    /// set once the CONNECT handshake completed
    pub fn server_version(&self) -> Option<&str> {
        self.server_version.as_deref()
    }
}

#[async_trait]
impl<T> Connection for FramedConnection<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&self, request: Packet) -> Result<()> {
        let command_type = request.command_type();
        let mut sink = self.sink.lock().await;
        sink.send(request).await?;
        trace!("connection::send: {command_type} packet");
        Ok(())
    }

    async fn receive(&self) -> Result<Packet> {
        loop {
            let next = {
                let mut stream = self.stream.lock().await;
                match self.operation_timeout {
                    Some(deadline) => timeout(deadline, stream.next())
                        .await
                        .map_err(|_| Error::Timeout)?,
                    None => stream.next().await,
                }
            };
            match next {
                Some(Ok(Packet::Ping)) => {
                    trace!("connection::receive: PING from broker, reply PONG");
                    self.send(Packet::Pong).await?;
                }
                Some(Ok(packet)) => {
                    trace!("connection::receive: {} packet", packet.command_type());
                    return Ok(packet);
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Err(Error::Disconnected),
            }
        }
    }

    async fn resolve_and_connect(
        &self,
        topic: &str,
        request_id: u64,
        authoritative: bool,
    ) -> Result<()> {
        self.send(Packet::Lookup(Lookup {
            request_id,
            topic: topic.to_string(),
            authoritative,
        }))
        .await?;
        match self.receive().await? {
            Packet::LookupResponse(res) => match res.response {
                LookupType::Connect => {
                    debug!("topic {topic} is served on this connection");
                    Ok(())
                }
                LookupType::Redirect => Err(Error::Redirect {
                    broker_url: res.broker_url.unwrap_or_default(),
                }),
                LookupType::Failed => Err(Error::LookupFailed(res.message.unwrap_or_default())),
            },
            Packet::Error(e) => Err(Error::FromServer {
                code: e.code,
                message: e.message,
            }),
            p => Err(Error::UnexpectedCommand {
                expected: CommandType::LookupResponse,
                found: p.command_type(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pylon_common::protocol::{Connected, ErrorCode, LookupResponse, ServerError, Success};
    use tokio::io::DuplexStream;

    use super::*;

    fn pair(
        operation_timeout: Option<Duration>,
    ) -> (
        FramedConnection<DuplexStream>,
        Framed<DuplexStream, PacketCodec>,
    ) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        (
            FramedConnection::new(client, operation_timeout),
            Framed::new(server, PacketCodec),
        )
    }

    #[tokio::test]
    async fn handshake_works() {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let broker = tokio::spawn(async move {
            let mut framed = Framed::new(server, PacketCodec);
            let Some(Ok(Packet::Connect(connect))) = framed.next().await else {
                panic!("expected CONNECT packet")
            };
            assert_eq!(connect.protocol_version, PROTOCOL_VERSION);
            assert_eq!(connect.keepalive, ConnectOptions::DEFAULT_KEEPALIVE_MS);
            framed
                .send(Packet::Connected(Connected {
                    server_version: "test-broker".to_string(),
                    protocol_version: PROTOCOL_VERSION,
                }))
                .await
                .unwrap();
            framed
        });

        let conn = FramedConnection::handshake(client, &ConnectOptions::default())
            .await
            .unwrap();
        assert_eq!(conn.server_version(), Some("test-broker"));
        broker.await.unwrap();
    }

    #[tokio::test]
    async fn handshake_rejected() {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let mut broker = Framed::new(server, PacketCodec);
        broker
            .send(Packet::Error(ServerError {
                request_id: 0,
                code: ErrorCode::AuthenticationError,
                message: "bad credentials".to_string(),
            }))
            .await
            .unwrap();

        let res = FramedConnection::handshake(client, &ConnectOptions::default()).await;
        assert!(matches!(
            res,
            Err(Error::FromServer {
                code: ErrorCode::AuthenticationError,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn ping_is_answered() {
        let (conn, mut broker) = pair(None);
        broker.send(Packet::Ping).await.unwrap();
        broker
            .send(Packet::Success(Success { request_id: 7 }))
            .await
            .unwrap();

        assert_eq!(
            conn.receive().await.unwrap(),
            Packet::Success(Success { request_id: 7 })
        );
        assert_eq!(broker.next().await.unwrap().unwrap(), Packet::Pong);
    }

    #[tokio::test]
    async fn lookup_connect() {
        let (conn, mut broker) = pair(None);
        broker
            .send(Packet::LookupResponse(LookupResponse {
                request_id: 1,
                response: LookupType::Connect,
                broker_url: None,
                message: None,
            }))
            .await
            .unwrap();

        conn.resolve_and_connect("test-topic", 1, true).await.unwrap();
        assert_eq!(
            broker.next().await.unwrap().unwrap(),
            Packet::Lookup(Lookup {
                request_id: 1,
                topic: "test-topic".to_string(),
                authoritative: true,
            })
        );
    }

    #[tokio::test]
    async fn lookup_redirect() {
        let (conn, mut broker) = pair(None);
        broker
            .send(Packet::LookupResponse(LookupResponse {
                request_id: 1,
                response: LookupType::Redirect,
                broker_url: Some("pylon://other-broker:6650".to_string()),
                message: None,
            }))
            .await
            .unwrap();

        let err = conn
            .resolve_and_connect("test-topic", 1, false)
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::Redirect { ref broker_url } if broker_url == "pylon://other-broker:6650")
        );
    }

    #[tokio::test]
    async fn lookup_failed() {
        let (conn, mut broker) = pair(None);
        broker
            .send(Packet::LookupResponse(LookupResponse {
                request_id: 1,
                response: LookupType::Failed,
                broker_url: None,
                message: Some("no such namespace".to_string()),
            }))
            .await
            .unwrap();

        let err = conn
            .resolve_and_connect("test-topic", 1, false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LookupFailed(ref msg) if msg == "no such namespace"));
    }

    #[tokio::test]
    async fn receive_timeout() {
        let (conn, _broker) = pair(Some(Duration::from_millis(50)));
        assert!(matches!(conn.receive().await, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn peer_closed() {
        let (conn, broker) = pair(None);
        drop(broker);
        assert!(matches!(conn.receive().await, Err(Error::Disconnected)));
    }
}
