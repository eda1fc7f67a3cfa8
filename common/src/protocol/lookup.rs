use crate::codec;

crate::types::byte_enum_codec!(LookupType);

#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct Lookup {
    pub request_id: u64,
    pub topic: String,
    /// skip redirection when the broker already knows it owns the topic
    pub authoritative: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LookupType {
    /// topic is served by another broker, see `broker_url`
    Redirect = 0,
    /// topic is served on this connection
    Connect,
    Failed,
}

impl TryFrom<u8> for LookupType {
    type Error = codec::Error;

    fn try_from(value: u8) -> codec::Result<Self> {
        Ok(match value {
            0 => Self::Redirect,
            1 => Self::Connect,
            2 => Self::Failed,
            _ => {
                return Err(codec::Error::UnsupportedValue {
                    kind: "lookup type",
                    value,
                })
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct LookupResponse {
    pub request_id: u64,
    pub response: LookupType,
    pub broker_url: Option<String>,
    pub message: Option<String>,
}
