use crate::types::MessageIdData;

use super::ErrorCode;

/// Publish command, the metadata and payload travel in the same packet
#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct Send {
    pub producer_id: u64,
    pub sequence_id: u64,
    /// 1 for a single message, the entry count for a batch
    pub num_messages: u32,
}

#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct SendReceipt {
    pub producer_id: u64,
    pub sequence_id: u64,
    pub message_id: MessageIdData,
}

#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct SendError {
    pub producer_id: u64,
    pub sequence_id: u64,
    pub code: ErrorCode,
    pub message: String,
}
