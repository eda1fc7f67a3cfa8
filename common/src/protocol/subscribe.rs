use crate::types::{InitialPosition, SubType};

/// Each consumer corresponds to a subscription
#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct Subscribe {
    pub request_id: u64,
    /// consumer_id, unique within one connection
    pub consumer_id: u64,
    pub topic: String,
    /// subscription name
    pub subscription: String,
    pub sub_type: SubType,
    /// where a new subscription starts reading
    pub initial_position: InitialPosition,
}

#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct Unsubscribe {
    pub request_id: u64,
    pub consumer_id: u64,
}

#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct CloseConsumer {
    pub consumer_id: u64,
    pub request_id: u64,
}
