#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct Flow {
    pub consumer_id: u64,
    /// number of additional messages the broker may push
    pub message_permits: u32,
}
