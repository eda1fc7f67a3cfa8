use crate::types::{AckType, MessageIdData, ValidationError};

#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct Ack {
    pub consumer_id: u64,
    pub ack_type: AckType,
    /// which message to ack
    pub message_id: MessageIdData,
    /// set for a negative ack
    pub validation_error: Option<ValidationError>,
}
