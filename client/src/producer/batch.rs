use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::Utc;
use pylon_common::{
    protocol::{Packet, Send},
    types::{BatchMessage, CompressionType, KeyValue, MessageMetadata, Payload},
};

/// application properties attached to a single message
pub type Properties = BTreeMap<String, String>;

/// Builds the SEND packet for one send operation: command, metadata and
/// payload, all stamped with the same sequence id.
pub(crate) struct MessageBatchEncoder<'a> {
    producer_id: u64,
    producer_name: &'a str,
    /// seconds since the unix epoch
    publish_time: u64,
}

impl<'a> MessageBatchEncoder<'a> {
    pub fn new(producer_id: u64, producer_name: &'a str) -> Self {
        Self {
            producer_id,
            producer_name,
            publish_time: Utc::now().timestamp().max(0) as u64,
        }
    }

    #[cfg(test)]
    fn with_publish_time(mut self, publish_time: u64) -> Self {
        self.publish_time = publish_time;
        self
    }

    pub fn single(&self, sequence_id: u64, payload: Bytes, properties: Properties) -> Packet {
        Packet::Send {
            command: Send {
                producer_id: self.producer_id,
                sequence_id,
                num_messages: 1,
            },
            metadata: MessageMetadata {
                producer_name: self.producer_name.to_string(),
                sequence_id,
                publish_time: self.publish_time,
                properties: properties.into_iter().map(KeyValue::from).collect(),
                compression: None,
                num_messages_in_batch: None,
            },
            payload: Payload::Single(payload),
        }
    }

    pub fn batch(
        &self,
        sequence_id: u64,
        batch: BatchMessage,
        compression: CompressionType,
    ) -> Packet {
        // command and metadata counts must never disagree
        let num_messages = batch.len() as u32;
        Packet::Send {
            command: Send {
                producer_id: self.producer_id,
                sequence_id,
                num_messages,
            },
            metadata: MessageMetadata {
                producer_name: self.producer_name.to_string(),
                sequence_id,
                publish_time: self.publish_time,
                properties: Vec::new(),
                compression: Some(compression),
                num_messages_in_batch: Some(num_messages),
            },
            payload: Payload::Batch(batch),
        }
    }
}
