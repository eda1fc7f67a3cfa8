#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct CreateProducer {
    pub request_id: u64,
    pub producer_id: u64,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct ProducerSuccess {
    pub request_id: u64,
    /// name assigned by the broker
    pub producer_name: String,
}

#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct CloseProducer {
    pub producer_id: u64,
    pub request_id: u64,
}
