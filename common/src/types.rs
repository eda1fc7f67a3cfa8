use std::fmt::Display;

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::{self, get_u8, Codec};

/// one-byte enums: `TryFrom<u8>` for decoding, `as u8` for encoding
macro_rules! byte_enum_codec {
    ($($ty: ty),+ $(,)?) => {
        $(
            impl $crate::codec::Codec for $ty {
                fn decode(buf: &mut bytes::Bytes) -> $crate::codec::Result<Self> {
                    $crate::codec::get_u8(buf)?.try_into()
                }

                fn encode(&self, buf: &mut bytes::BytesMut) {
                    bytes::BufMut::put_u8(buf, *self as u8)
                }

                fn size(&self) -> usize {
                    1
                }
            }
        )+
    };
}

pub(crate) use byte_enum_codec;

byte_enum_codec!(
    SubType,
    InitialPosition,
    AckType,
    ValidationError,
    CompressionType
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SubType {
    /// Each subscription is only allowed to contain one consumer
    Exclusive = 0,
    /// Messages are distributed round-robin across all consumers
    Shared,
    /// One active consumer, the others take over when it leaves
    Failover,
    /// Messages with the same key go to the same consumer
    KeyShared,
}

impl Display for SubType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubType::Exclusive => write!(f, "Exclusive"),
            SubType::Shared => write!(f, "Shared"),
            SubType::Failover => write!(f, "Failover"),
            SubType::KeyShared => write!(f, "Key_Shared"),
        }
    }
}

impl TryFrom<u8> for SubType {
    type Error = codec::Error;

    fn try_from(value: u8) -> codec::Result<Self> {
        Ok(match value {
            0 => Self::Exclusive,
            1 => Self::Shared,
            2 => Self::Failover,
            3 => Self::KeyShared,
            _ => {
                return Err(codec::Error::UnsupportedValue {
                    kind: "subscription type",
                    value,
                })
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum InitialPosition {
    #[default]
    Latest = 0,
    Earliest,
}

impl TryFrom<u8> for InitialPosition {
    type Error = codec::Error;

    fn try_from(value: u8) -> codec::Result<Self> {
        Ok(match value {
            0 => Self::Latest,
            1 => Self::Earliest,
            _ => {
                return Err(codec::Error::UnsupportedValue {
                    kind: "initial position",
                    value,
                })
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AckType {
    /// ack a single message
    Individual = 0,
    /// ack this message and every earlier unacknowledged one in the subscription
    Cumulative,
}

impl TryFrom<u8> for AckType {
    type Error = codec::Error;

    fn try_from(value: u8) -> codec::Result<Self> {
        Ok(match value {
            0 => Self::Individual,
            1 => Self::Cumulative,
            _ => {
                return Err(codec::Error::UnsupportedValue {
                    kind: "ack type",
                    value,
                })
            }
        })
    }
}

/// reason attached to a negative ack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ValidationError {
    UncompressedSizeCorruption = 0,
    DecompressionError,
    ChecksumMismatch,
    BatchDeSerializeError,
    DecryptionError,
}

impl TryFrom<u8> for ValidationError {
    type Error = codec::Error;

    fn try_from(value: u8) -> codec::Result<Self> {
        Ok(match value {
            0 => Self::UncompressedSizeCorruption,
            1 => Self::DecompressionError,
            2 => Self::ChecksumMismatch,
            3 => Self::BatchDeSerializeError,
            4 => Self::DecryptionError,
            _ => {
                return Err(codec::Error::UnsupportedValue {
                    kind: "validation error",
                    value,
                })
            }
        })
    }
}

/// Compression kind recorded in batch metadata. The payload bytes are sent as
/// given, compressing them is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionType {
    #[default]
    None = 0,
    Lz4,
    Zlib,
    Zstd,
    Snappy,
}

impl TryFrom<u8> for CompressionType {
    type Error = codec::Error;

    fn try_from(value: u8) -> codec::Result<Self> {
        Ok(match value {
            0 => Self::None,
            1 => Self::Lz4,
            2 => Self::Zlib,
            3 => Self::Zstd,
            4 => Self::Snappy,
            _ => {
                return Err(codec::Error::UnsupportedValue {
                    kind: "compression type",
                    value,
                })
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, pylon_derive::Codec)]
pub struct MessageIdData {
    pub ledger_id: u64,
    pub entry_id: u64,
    /// position inside a batch, if the message was published in one
    pub batch_index: Option<u32>,
}

impl Display for MessageIdData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.batch_index {
            Some(index) => write!(f, "{}:{}:{}", self.ledger_id, self.entry_id, index),
            None => write!(f, "{}:{}", self.ledger_id, self.entry_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, pylon_derive::Codec)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for KeyValue {
    fn from((key, value): (K, V)) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, pylon_derive::Codec)]
pub struct MessageMetadata {
    pub producer_name: String,
    pub sequence_id: u64,
    /// seconds since the unix epoch
    pub publish_time: u64,
    pub properties: Vec<KeyValue>,
    /// batch mode only
    pub compression: Option<CompressionType>,
    /// batch mode only
    pub num_messages_in_batch: Option<u32>,
}

impl MessageMetadata {
    pub fn is_batch(&self) -> bool {
        self.num_messages_in_batch.is_some()
    }
}

/// Payloads published and sequenced together as one message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchMessage(Vec<Bytes>);

impl BatchMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, payload: impl Into<Bytes>) {
        self.0.push(payload.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bytes> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<Bytes> {
        self.0
    }
}

impl From<Vec<Bytes>> for BatchMessage {
    fn from(entries: Vec<Bytes>) -> Self {
        Self(entries)
    }
}

impl<T: Into<Bytes>> FromIterator<T> for BatchMessage {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Codec for BatchMessage {
    fn decode(buf: &mut Bytes) -> codec::Result<Self> {
        Ok(Self(Vec::decode(buf)?))
    }

    fn encode(&self, buf: &mut BytesMut) {
        self.0.encode(buf)
    }

    fn size(&self) -> usize {
        self.0.size()
    }
}

/// Body of a SEND or MESSAGE command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Single(Bytes),
    Batch(BatchMessage),
}

impl Payload {
    const SINGLE: u8 = 1;
    const BATCH: u8 = 2;

    /// number of application messages carried
    pub fn num_messages(&self) -> usize {
        match self {
            Payload::Single(_) => 1,
            Payload::Batch(batch) => batch.len(),
        }
    }
}

impl Codec for Payload {
    fn decode(buf: &mut Bytes) -> codec::Result<Self> {
        match get_u8(buf)? {
            Self::SINGLE => Ok(Self::Single(Bytes::decode(buf)?)),
            Self::BATCH => Ok(Self::Batch(BatchMessage::decode(buf)?)),
            value => Err(codec::Error::UnsupportedValue {
                kind: "payload",
                value,
            }),
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        match self {
            Payload::Single(bytes) => {
                buf.put_u8(Self::SINGLE);
                bytes.encode(buf);
            }
            Payload::Batch(batch) => {
                buf.put_u8(Self::BATCH);
                batch.encode(buf);
            }
        }
    }

    fn size(&self) -> usize {
        1 + match self {
            Payload::Single(bytes) => bytes.size(),
            Payload::Batch(batch) => batch.size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_display() {
        let id = MessageIdData {
            ledger_id: 12,
            entry_id: 7,
            batch_index: None,
        };
        assert_eq!(id.to_string(), "12:7");
        let id = MessageIdData {
            batch_index: Some(3),
            ..id
        };
        assert_eq!(id.to_string(), "12:7:3");
    }

    #[test]
    fn batch_payload_codec() {
        let batch: BatchMessage = ["a", "bb", "ccc"].into_iter().collect();
        let payload = Payload::Batch(batch);
        assert_eq!(payload.num_messages(), 3);

        let mut bytes = BytesMut::new();
        payload.encode(&mut bytes);
        assert_eq!(bytes.len(), payload.size());
        assert_eq!(payload, Payload::decode(&mut bytes.freeze()).unwrap());
    }

    #[test]
    fn unsupported_sub_type() {
        assert!(matches!(
            SubType::try_from(9),
            Err(codec::Error::UnsupportedValue { value: 9, .. })
        ));
    }
}
