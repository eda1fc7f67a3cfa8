use crate::types::MessageIdData;

/// Message pushed to a consumer, metadata and payload follow in the same packet
#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct Message {
    pub consumer_id: u64,
    pub message_id: MessageIdData,
}
