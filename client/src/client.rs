use std::{net::SocketAddr, sync::Arc, time::Duration};

use log::debug;
use pylon_common::id::SerialId;
use tokio::net::TcpStream;

use crate::{
    connection::{ConnectOptions, Connection, FramedConnection},
    consumer::{Consumer, SubscribeMessage},
    error::{Error, Result},
    producer::Producer,
};

pub struct ClientBuilder {
    addr: SocketAddr,
    options: ConnectOptions,
}

impl ClientBuilder {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            options: ConnectOptions::default(),
        }
    }

    /// default to 10000ms
    pub fn keepalive(mut self, keepalive: u32) -> Self {
        self.options.keepalive = keepalive;
        self
    }

    pub fn client_version(mut self, client_version: &str) -> Self {
        self.options.client_version = client_version.to_string();
        self
    }

    /// bound every wait for a broker reply, unbounded by default
    pub fn operation_timeout(mut self, operation_timeout: Duration) -> Self {
        self.options.operation_timeout = Some(operation_timeout);
        self
    }

    pub async fn build(self) -> Result<Client<FramedConnection<TcpStream>>> {
        let conn = FramedConnection::connect(self.addr, &self.options)
            .await
            .map_err(Error::Connect)?;
        debug!("client connected to {}", self.addr);
        Ok(Client::new(Arc::new(conn)))
    }
}

/// Hands out producer and consumer sessions over one shared connection.
///
/// Ids are allocated here: producer and consumer ids count up from 1 per
/// client, request ids come from one counter shared by every session.
pub struct Client<C> {
    conn: Arc<C>,
    producer_id: u64,
    consumer_id: u64,
    request_id: SerialId,
}

impl<C: Connection> Client<C> {
    pub fn new(conn: Arc<C>) -> Self {
        Self {
            conn,
            producer_id: 0,
            consumer_id: 0,
            request_id: SerialId::starting_at(1),
        }
    }

    pub fn connection(&self) -> &Arc<C> {
        &self.conn
    }

    pub fn next_request_id(&self) -> u64 {
        self.request_id.next()
    }

    /// Create a producer on `topic` and open it.
    pub async fn new_producer(&mut self, topic: &str) -> Result<Producer<C>> {
        self.producer_id += 1;
        let mut producer = Producer::new(self.producer_id, topic, self.conn.clone());
        producer.open(self.next_request_id()).await?;
        Ok(producer)
    }

    /// Create a consumer and subscribe it.
    pub async fn new_consumer(&mut self, subscribe: SubscribeMessage) -> Result<Consumer<C>> {
        self.consumer_id += 1;
        let mut consumer = Consumer::new(self.consumer_id, self.conn.clone());
        consumer
            .subscribe_with(subscribe, self.next_request_id())
            .await?;
        Ok(consumer)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::{SinkExt, StreamExt};
    use pylon_common::{
        protocol::{
            LookupResponse, LookupType, Message, Packet, PacketCodec, ProducerSuccess,
            SendReceipt, Success,
        },
        types::{AckType, MessageIdData, Payload, SubType},
    };
    use tokio::io::DuplexStream;
    use tokio_util::codec::Framed;

    use crate::producer::Properties;

    use super::*;

    const TOPIC: &str = "persistent://public/default/e2e";

    /// Answers every request the way a broker serving `TOPIC` would and
    /// echoes each published message back to the consumer.
    async fn fake_broker(io: DuplexStream) -> Vec<Packet> {
        let mut framed = Framed::new(io, PacketCodec);
        let mut received = Vec::new();
        let mut entry_id = 0;
        while let Some(Ok(packet)) = framed.next().await {
            received.push(packet.clone());
            let replies = match packet {
                Packet::Lookup(lookup) => vec![Packet::LookupResponse(LookupResponse {
                    request_id: lookup.request_id,
                    response: LookupType::Connect,
                    broker_url: None,
                    message: None,
                })],
                Packet::CreateProducer(create) => vec![Packet::ProducerSuccess(ProducerSuccess {
                    request_id: create.request_id,
                    producer_name: format!("standalone-0-{}", create.producer_id),
                })],
                Packet::Subscribe(subscribe) => vec![Packet::Success(Success {
                    request_id: subscribe.request_id,
                })],
                Packet::Send {
                    command,
                    metadata,
                    payload,
                } => {
                    let message_id = MessageIdData {
                        ledger_id: 1,
                        entry_id,
                        batch_index: None,
                    };
                    entry_id += 1;
                    vec![
                        Packet::SendReceipt(SendReceipt {
                            producer_id: command.producer_id,
                            sequence_id: command.sequence_id,
                            message_id,
                        }),
                        Packet::Message {
                            command: Message {
                                consumer_id: 1,
                                message_id,
                            },
                            metadata,
                            payload,
                        },
                    ]
                }
                _ => Vec::new(),
            };
            for reply in replies {
                if framed.send(reply).await.is_err() {
                    return received;
                }
            }
        }
        received
    }

    #[tokio::test]
    async fn produce_and_consume() {
        let (client_io, broker_io) = tokio::io::duplex(64 * 1024);
        let broker = tokio::spawn(fake_broker(broker_io));

        let conn = Arc::new(FramedConnection::new(
            client_io,
            Some(Duration::from_secs(5)),
        ));
        let mut client = Client::new(conn);

        let mut producer = client.new_producer(TOPIC).await.unwrap();
        assert_eq!(producer.id(), 1);
        assert_eq!(producer.name(), Some("standalone-0-1"));

        let mut consumer = client
            .new_consumer(SubscribeMessage::new(TOPIC, "e2e").sub_type(SubType::Shared))
            .await
            .unwrap();
        assert_eq!(consumer.id(), 1);
        consumer.flow(10).await.unwrap();

        let sequence_id = producer
            .send("hello", Properties::from([("k".to_string(), "v".to_string())]))
            .await
            .unwrap();
        assert_eq!(sequence_id, 0);
        let receipt = producer.receive_send_receipt().await.unwrap();
        assert_eq!(receipt.sequence_id, 0);

        let message = consumer.receive_message().await.unwrap();
        assert_eq!(message.message_id, receipt.message_id);
        assert_eq!(message.metadata.producer_name, "standalone-0-1");
        assert_eq!(message.payload, Payload::Single(Bytes::from_static(b"hello")));
        consumer
            .ack(AckType::Individual, message.message_id, None)
            .await
            .unwrap();

        let close_producer = client.next_request_id();
        producer.close(close_producer).await.unwrap();
        let close_consumer = client.next_request_id();
        consumer.close(close_consumer).await.unwrap();
        drop(producer);
        drop(consumer);
        drop(client);

        let received = broker.await.unwrap();
        let request_ids = received
            .iter()
            .filter_map(|p| match p {
                Packet::Lookup(p) => Some(p.request_id),
                Packet::CloseProducer(p) => Some(p.request_id),
                Packet::CloseConsumer(p) => Some(p.request_id),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(request_ids, vec![1, 2, 3, 4]);
        assert!(matches!(received.last(), Some(Packet::CloseConsumer(_))));
    }
}
