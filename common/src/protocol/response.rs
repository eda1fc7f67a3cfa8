use crate::codec;

crate::types::byte_enum_codec!(ErrorCode);

/// Generic reply to SUBSCRIBE/UNSUBSCRIBE
#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct Success {
    pub request_id: u64,
}

/// Generic failure reply, correlated by request id
#[derive(Debug, Clone, PartialEq, pylon_derive::Codec)]
pub struct ServerError {
    pub request_id: u64,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    UnknownError = 0,
    MetadataError = 1,
    PersistenceError = 2,
    AuthenticationError = 3,
    AuthorizationError = 4,
    ConsumerBusy = 5,
    ServiceNotReady = 6,
    ProducerBlockedQuotaExceeded = 7,
    ChecksumError = 8,
    UnsupportedVersion = 9,
    TopicNotFound = 10,
    SubscriptionNotFound = 11,
    ConsumerNotFound = 12,
    TooManyRequests = 13,
    TopicTerminated = 14,
    ProducerBusy = 15,
    InvalidTopicName = 16,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::UnknownError => write!(f, "UnknownError"),
            ErrorCode::MetadataError => write!(f, "MetadataError"),
            ErrorCode::PersistenceError => write!(f, "PersistenceError"),
            ErrorCode::AuthenticationError => write!(f, "AuthenticationError"),
            ErrorCode::AuthorizationError => write!(f, "AuthorizationError"),
            ErrorCode::ConsumerBusy => write!(f, "ConsumerBusy"),
            ErrorCode::ServiceNotReady => write!(f, "ServiceNotReady"),
            ErrorCode::ProducerBlockedQuotaExceeded => write!(f, "ProducerBlockedQuotaExceeded"),
            ErrorCode::ChecksumError => write!(f, "ChecksumError"),
            ErrorCode::UnsupportedVersion => write!(f, "UnsupportedVersion"),
            ErrorCode::TopicNotFound => write!(f, "TopicNotFound"),
            ErrorCode::SubscriptionNotFound => write!(f, "SubscriptionNotFound"),
            ErrorCode::ConsumerNotFound => write!(f, "ConsumerNotFound"),
            ErrorCode::TooManyRequests => write!(f, "TooManyRequests"),
            ErrorCode::TopicTerminated => write!(f, "TopicTerminated"),
            ErrorCode::ProducerBusy => write!(f, "ProducerBusy"),
            ErrorCode::InvalidTopicName => write!(f, "InvalidTopicName"),
        }
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = codec::Error;

    fn try_from(value: u8) -> codec::Result<Self> {
        Ok(match value {
            0 => Self::UnknownError,
            1 => Self::MetadataError,
            2 => Self::PersistenceError,
            3 => Self::AuthenticationError,
            4 => Self::AuthorizationError,
            5 => Self::ConsumerBusy,
            6 => Self::ServiceNotReady,
            7 => Self::ProducerBlockedQuotaExceeded,
            8 => Self::ChecksumError,
            9 => Self::UnsupportedVersion,
            10 => Self::TopicNotFound,
            11 => Self::SubscriptionNotFound,
            12 => Self::ConsumerNotFound,
            13 => Self::TooManyRequests,
            14 => Self::TopicTerminated,
            15 => Self::ProducerBusy,
            16 => Self::InvalidTopicName,
            _ => {
                return Err(codec::Error::UnsupportedValue {
                    kind: "error code",
                    value,
                })
            }
        })
    }
}
