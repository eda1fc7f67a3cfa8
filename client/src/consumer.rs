use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use log::{debug, warn};
use pylon_common::{
    protocol::{Ack, CloseConsumer, CommandType, Flow, Packet, Subscribe, Unsubscribe},
    types::{
        AckType, InitialPosition, MessageIdData, MessageMetadata, Payload, SubType,
        ValidationError,
    },
};

use crate::{
    connection::Connection,
    error::{Error, Result, WrapError},
};

#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeMessage {
    pub topic: String,
    /// subscription name
    pub subscription: String,
    pub sub_type: SubType,
    pub initial_position: InitialPosition,
}

impl SubscribeMessage {
    /// exclusive subscription starting from the latest message
    pub fn new(topic: &str, subscription: &str) -> Self {
        Self {
            topic: topic.to_string(),
            subscription: subscription.to_string(),
            sub_type: SubType::Exclusive,
            initial_position: InitialPosition::default(),
        }
    }

    pub fn sub_type(mut self, sub_type: SubType) -> Self {
        self.sub_type = sub_type;
        self
    }

    pub fn initial_position(mut self, initial_position: InitialPosition) -> Self {
        self.initial_position = initial_position;
        self
    }
}

/// A message delivered to a consumer
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumeMessage {
    pub message_id: MessageIdData,
    pub metadata: MessageMetadata,
    pub payload: Payload,
}

/// A consumer attached to one subscription.
///
/// The broker only pushes messages against credits granted with
/// [`Consumer::flow`], and nothing here replenishes them: the caller grants
/// more once it has worked through what it asked for.
pub struct Consumer<C> {
    id: u64,
    /// recorded once subscribe succeeds
    subscription: Option<SubscribeMessage>,
    /// permits granted since the last subscribe
    permits: AtomicU64,
    conn: Arc<C>,
}

impl<C: Connection> Consumer<C> {
    pub fn new(id: u64, conn: Arc<C>) -> Self {
        Self {
            id,
            subscription: None,
            permits: AtomicU64::new(0),
            conn,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn subscription(&self) -> Option<&SubscribeMessage> {
        self.subscription.as_ref()
    }

    pub fn permits(&self) -> u64 {
        self.permits.load(Ordering::SeqCst)
    }

    /// Subscribe starting from the latest message. Waits for and consumes one
    /// broker reply, see [`Consumer::subscribe_with`].
    pub async fn subscribe(
        &mut self,
        topic: &str,
        subscription: &str,
        sub_type: SubType,
        request_id: u64,
    ) -> Result<()> {
        let sub = SubscribeMessage::new(topic, subscription).sub_type(sub_type);
        self.subscribe_with(sub, request_id).await
    }

    /// Attach to the subscription described by `sub`, creating it on the
    /// broker if needed. The subscription is recorded only after the broker
    /// confirmed it.
    ///
    /// Besides the lookup reply this consumes exactly one reply from the
    /// connection, the broker's SUCCESS or ERROR, so no other request may be
    /// outstanding on a shared connection meanwhile. Flow permits start from
    /// zero again on success.
    pub async fn subscribe_with(&mut self, sub: SubscribeMessage, request_id: u64) -> Result<()> {
        self.conn
            .resolve_and_connect(&sub.topic, request_id, false)
            .await
            .map_err(|source| Error::Lookup {
                topic: sub.topic.clone(),
                source,
            })?;

        self.conn
            .send(Packet::Subscribe(Subscribe {
                request_id,
                consumer_id: self.id,
                topic: sub.topic.clone(),
                subscription: sub.subscription.clone(),
                sub_type: sub.sub_type,
                initial_position: sub.initial_position,
            }))
            .await
            .wrap("send subscribe command")?;
        debug!("sent subscribe");

        match self
            .conn
            .receive()
            .await
            .wrap("receive subscribe success")?
        {
            Packet::Success(_) => {
                debug!(
                    "consumer {} subscribed to {} as {} ({})",
                    self.id, sub.topic, sub.subscription, sub.sub_type
                );
                self.subscription = Some(sub);
                self.permits.store(0, Ordering::SeqCst);
                Ok(())
            }
            reply => Err(Error::unexpected_reply(
                "subscribe",
                CommandType::Success,
                reply,
            )),
        }
    }

    /// Grant the broker `message_permits` more messages. Credits add up.
    pub async fn flow(&self, message_permits: u32) -> Result<()> {
        self.conn
            .send(Packet::Flow(Flow {
                consumer_id: self.id,
                message_permits,
            }))
            .await
            .wrap("request flow command")?;
        self.permits
            .fetch_add(message_permits as u64, Ordering::SeqCst);
        debug!("sent flow");
        Ok(())
    }

    /// Wait for the next pushed message.
    ///
    /// Without any flow grant the broker never pushes, so this fails up
    /// front instead of waiting forever.
    pub async fn receive_message(&self) -> Result<ConsumeMessage> {
        if self.permits() == 0 {
            return Err(Error::NoFlowPermits {
                consumer_id: self.id,
            });
        }
        match self
            .conn
            .receive()
            .await
            .wrap("receive message command")?
        {
            Packet::Message {
                command,
                metadata,
                payload,
            } => {
                if command.consumer_id != self.id {
                    warn!(
                        "consumer {} received message {} addressed to consumer {}",
                        self.id, command.message_id, command.consumer_id
                    );
                }
                debug!("receive message {}", command.message_id);
                Ok(ConsumeMessage {
                    message_id: command.message_id,
                    metadata,
                    payload,
                })
            }
            reply => Err(Error::unexpected_reply(
                "receive message",
                CommandType::Message,
                reply,
            )),
        }
    }

    /// Acknowledge `message_id`. A `validation_error` marks it as a negative
    /// ack and tells the broker why the message was rejected.
    pub async fn ack(
        &self,
        ack_type: AckType,
        message_id: MessageIdData,
        validation_error: Option<ValidationError>,
    ) -> Result<()> {
        self.conn
            .send(Packet::Ack(Ack {
                consumer_id: self.id,
                ack_type,
                message_id,
                validation_error,
            }))
            .await
            .wrap("send ack command")?;
        debug!("sent ack");
        Ok(())
    }

    /// Remove the subscription from the broker. Consumes one reply, like
    /// subscribe.
    pub async fn unsubscribe(&mut self, request_id: u64) -> Result<()> {
        self.conn
            .send(Packet::Unsubscribe(Unsubscribe {
                request_id,
                consumer_id: self.id,
            }))
            .await
            .wrap("send unsubscribe command")?;
        debug!("sent unsubscribe");

        match self
            .conn
            .receive()
            .await
            .wrap("receive unsubscribe success")?
        {
            Packet::Success(_) => {
                self.subscription = None;
                self.permits.store(0, Ordering::SeqCst);
                Ok(())
            }
            reply => Err(Error::unexpected_reply(
                "unsubscribe",
                CommandType::Success,
                reply,
            )),
        }
    }

    /// One-way CLOSE_CONSUMER, no reply is awaited.
    pub async fn close(&mut self, request_id: u64) -> Result<()> {
        self.conn
            .send(Packet::CloseConsumer(CloseConsumer {
                consumer_id: self.id,
                request_id,
            }))
            .await
            .wrap("send closeConsumer command")?;
        self.subscription = None;
        self.permits.store(0, Ordering::SeqCst);
        debug!("sent closeConsumer");
        Ok(())
    }
}
