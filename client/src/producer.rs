mod batch;
mod sequence;

use std::sync::Arc;

use bytes::Bytes;
use log::debug;
use pylon_common::{
    protocol::{CloseProducer, CommandType, CreateProducer, Packet, SendReceipt},
    types::{BatchMessage, CompressionType},
};

use crate::{
    connection::Connection,
    error::{Error, Result, WrapError},
};

use self::batch::MessageBatchEncoder;

pub use batch::Properties;
pub use sequence::SequenceGenerator;

/// A producer publishing to one topic.
///
/// The session starts closed with no name. [`Producer::open`] registers it
/// with the broker and stores the name the broker assigned; sends are only
/// valid after that. Sends take `&self` so an opened producer can be shared
/// behind an `Arc` and published to from many tasks: every send draws its own
/// sequence id.
pub struct Producer<C> {
    id: u64,
    topic: String,
    /// broker-assigned, set by a successful open
    name: Option<String>,
    sequence_id: SequenceGenerator,
    conn: Arc<C>,
}

impl<C: Connection> Producer<C> {
    pub fn new(id: u64, topic: &str, conn: Arc<C>) -> Self {
        Self {
            id,
            topic: topic.to_string(),
            name: None,
            sequence_id: SequenceGenerator::new(),
            conn,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// `None` until opened
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Register the producer with the broker.
    ///
    /// Lookup, PRODUCER and the reply are separate steps. If any of them fails
    /// the producer stays closed and `open` has to be run again from the start.
    pub async fn open(&mut self, request_id: u64) -> Result<()> {
        self.conn
            .resolve_and_connect(&self.topic, request_id, false)
            .await
            .map_err(|source| Error::Lookup {
                topic: self.topic.clone(),
                source,
            })?;

        self.conn
            .send(Packet::CreateProducer(CreateProducer {
                request_id,
                producer_id: self.id,
                topic: self.topic.clone(),
            }))
            .await
            .wrap("send producer command")?;
        debug!("sent producer");

        match self
            .conn
            .receive()
            .await
            .wrap("receive producerSuccess command")?
        {
            Packet::ProducerSuccess(success) => {
                debug!(
                    "created producer {} on topic {}",
                    success.producer_name, self.topic
                );
                self.name = Some(success.producer_name);
                Ok(())
            }
            reply => Err(Error::unexpected_reply(
                "open producer",
                CommandType::ProducerSuccess,
                reply,
            )),
        }
    }

    /// Publish one message and return its sequence id.
    ///
    /// The producer must be open. The receipt is not awaited, collect it with
    /// [`Producer::receive_send_receipt`].
    pub async fn send(&self, payload: impl Into<Bytes>, properties: Properties) -> Result<u64> {
        let sequence_id = self.sequence_id.next();
        let packet = MessageBatchEncoder::new(self.id, self.producer_name()).single(
            sequence_id,
            payload.into(),
            properties,
        );
        self.conn.send(packet).await.wrap("send 'send' command")?;
        debug!("sent 'send'");
        Ok(sequence_id)
    }

    /// Publish a batch under a single sequence id and return that id.
    pub async fn send_batch(
        &self,
        batch: BatchMessage,
        compression: CompressionType,
    ) -> Result<u64> {
        if batch.is_empty() {
            return Err(Error::EmptyBatch);
        }
        let sequence_id = self.sequence_id.next();
        let packet = MessageBatchEncoder::new(self.id, self.producer_name()).batch(
            sequence_id,
            batch,
            compression,
        );
        self.conn
            .send(packet)
            .await
            .wrap("send batch 'send' command")?;
        debug!("sent batch 'send'");
        Ok(sequence_id)
    }

    pub async fn receive_send_receipt(&self) -> Result<SendReceipt> {
        match self
            .conn
            .receive()
            .await
            .wrap("receive sendReceipt command")?
        {
            Packet::SendReceipt(receipt) => {
                debug!(
                    "receive sendReceipt: sequence id {}, message id {}",
                    receipt.sequence_id, receipt.message_id
                );
                Ok(receipt)
            }
            reply => Err(Error::unexpected_reply(
                "receive send receipt",
                CommandType::SendReceipt,
                reply,
            )),
        }
    }

    /// One-way CLOSE_PRODUCER, no reply is awaited.
    pub async fn close(&mut self, request_id: u64) -> Result<()> {
        self.conn
            .send(Packet::CloseProducer(CloseProducer {
                producer_id: self.id,
                request_id,
            }))
            .await
            .wrap("send closeProducer command")?;
        self.name = None;
        debug!("sent closeProducer");
        Ok(())
    }

    /// empty before open, the broker rejects such sends
    fn producer_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}
