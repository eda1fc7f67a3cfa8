mod ack;
mod connect;
mod flow;
mod lookup;
mod message;
mod producer;
mod response;
mod send;
mod subscribe;

use std::{io, slice::Iter};

use bytes::{BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    codec::{self, Codec},
    types::{MessageMetadata, Payload},
};

pub use self::{
    ack::Ack,
    connect::{Connect, Connected},
    flow::Flow,
    lookup::{Lookup, LookupResponse, LookupType},
    message::Message,
    producer::{CloseProducer, CreateProducer, ProducerSuccess},
    response::{ErrorCode, ServerError, Success},
    send::{Send, SendError, SendReceipt},
    subscribe::{CloseConsumer, Subscribe, Unsubscribe},
};

pub type Result<T> = std::result::Result<T, Error>;

/// remaining length is at most 4 varint bytes
pub const MAX_REMAIN_LEN: usize = 268_435_455;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] codec::Error),
    #[error("malformed packet")]
    MalformedPacket,
    #[error("unknown packet type: {0}")]
    UnknownPacketType(u8),
    #[error("packet too large: {0} bytes")]
    PacketTooLarge(usize),
}

pub struct PacketCodec;

impl Decoder for PacketCodec {
    type Item = Packet;

    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let Some((header, header_len)) = Header::read(src.iter())? else {
            return Ok(None);
        };
        let frame_len = header_len + header.remain_len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }
        // header + body + other
        let mut bytes = src
            .split_to(frame_len) // header + body
            .split_off(header_len) // body
            .freeze();
        let packet = Packet::read(header.command_type()?, &mut bytes)?;
        if !bytes.is_empty() {
            return Err(Error::MalformedPacket);
        }
        Ok(Some(packet))
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = Error;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<()> {
        let header = packet.header()?;
        dst.reserve(header.remain_len + 5);
        header.write(dst);
        packet.write(dst);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Connect = 1,
    Connected,
    Lookup,
    LookupResponse,
    CreateProducer,
    ProducerSuccess,
    Send,
    SendReceipt,
    SendError,
    CloseProducer,
    Subscribe,
    Unsubscribe,
    Flow,
    Message,
    Ack,
    CloseConsumer,
    Success,
    Error,
    Ping,
    Pong,
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CommandType::Connect => "CONNECT",
            CommandType::Connected => "CONNECTED",
            CommandType::Lookup => "LOOKUP",
            CommandType::LookupResponse => "LOOKUP_RESPONSE",
            CommandType::CreateProducer => "PRODUCER",
            CommandType::ProducerSuccess => "PRODUCER_SUCCESS",
            CommandType::Send => "SEND",
            CommandType::SendReceipt => "SEND_RECEIPT",
            CommandType::SendError => "SEND_ERROR",
            CommandType::CloseProducer => "CLOSE_PRODUCER",
            CommandType::Subscribe => "SUBSCRIBE",
            CommandType::Unsubscribe => "UNSUBSCRIBE",
            CommandType::Flow => "FLOW",
            CommandType::Message => "MESSAGE",
            CommandType::Ack => "ACK",
            CommandType::CloseConsumer => "CLOSE_CONSUMER",
            CommandType::Success => "SUCCESS",
            CommandType::Error => "ERROR",
            CommandType::Ping => "PING",
            CommandType::Pong => "PONG",
        };
        write!(f, "{s}")
    }
}

impl TryFrom<u8> for CommandType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            1 => CommandType::Connect,
            2 => CommandType::Connected,
            3 => CommandType::Lookup,
            4 => CommandType::LookupResponse,
            5 => CommandType::CreateProducer,
            6 => CommandType::ProducerSuccess,
            7 => CommandType::Send,
            8 => CommandType::SendReceipt,
            9 => CommandType::SendError,
            10 => CommandType::CloseProducer,
            11 => CommandType::Subscribe,
            12 => CommandType::Unsubscribe,
            13 => CommandType::Flow,
            14 => CommandType::Message,
            15 => CommandType::Ack,
            16 => CommandType::CloseConsumer,
            17 => CommandType::Success,
            18 => CommandType::Error,
            19 => CommandType::Ping,
            20 => CommandType::Pong,
            _ => return Err(Error::UnknownPacketType(value)),
        })
    }
}

/// Every command exchanged with the broker, in both directions.
///
/// `Send` and `Message` are the only commands carrying message metadata and a
/// payload; all the others are plain control commands.
#[derive(Debug, PartialEq, Clone)]
pub enum Packet {
    Connect(Connect),
    Connected(Connected),
    Lookup(Lookup),
    LookupResponse(LookupResponse),
    CreateProducer(CreateProducer),
    ProducerSuccess(ProducerSuccess),
    Send {
        command: Send,
        metadata: MessageMetadata,
        payload: Payload,
    },
    SendReceipt(SendReceipt),
    SendError(SendError),
    CloseProducer(CloseProducer),
    Subscribe(Subscribe),
    Unsubscribe(Unsubscribe),
    Flow(Flow),
    Message {
        command: Message,
        metadata: MessageMetadata,
        payload: Payload,
    },
    Ack(Ack),
    CloseConsumer(CloseConsumer),
    Success(Success),
    Error(ServerError),
    Ping,
    Pong,
}

impl Packet {
    fn header(&self) -> Result<Header> {
        let remain_len = self.size();
        if remain_len > MAX_REMAIN_LEN {
            return Err(Error::PacketTooLarge(remain_len));
        }
        Ok(Header::new(self.command_type(), remain_len))
    }

    fn size(&self) -> usize {
        match self {
            Packet::Connect(p) => p.size(),
            Packet::Connected(p) => p.size(),
            Packet::Lookup(p) => p.size(),
            Packet::LookupResponse(p) => p.size(),
            Packet::CreateProducer(p) => p.size(),
            Packet::ProducerSuccess(p) => p.size(),
            Packet::Send {
                command,
                metadata,
                payload,
            } => command.size() + metadata.size() + payload.size(),
            Packet::SendReceipt(p) => p.size(),
            Packet::SendError(p) => p.size(),
            Packet::CloseProducer(p) => p.size(),
            Packet::Subscribe(p) => p.size(),
            Packet::Unsubscribe(p) => p.size(),
            Packet::Flow(p) => p.size(),
            Packet::Message {
                command,
                metadata,
                payload,
            } => command.size() + metadata.size() + payload.size(),
            Packet::Ack(p) => p.size(),
            Packet::CloseConsumer(p) => p.size(),
            Packet::Success(p) => p.size(),
            Packet::Error(p) => p.size(),
            Packet::Ping | Packet::Pong => 0,
        }
    }

    fn write(&self, buf: &mut BytesMut) {
        match self {
            Packet::Connect(p) => p.encode(buf),
            Packet::Connected(p) => p.encode(buf),
            Packet::Lookup(p) => p.encode(buf),
            Packet::LookupResponse(p) => p.encode(buf),
            Packet::CreateProducer(p) => p.encode(buf),
            Packet::ProducerSuccess(p) => p.encode(buf),
            Packet::Send {
                command,
                metadata,
                payload,
            } => {
                command.encode(buf);
                metadata.encode(buf);
                payload.encode(buf);
            }
            Packet::SendReceipt(p) => p.encode(buf),
            Packet::SendError(p) => p.encode(buf),
            Packet::CloseProducer(p) => p.encode(buf),
            Packet::Subscribe(p) => p.encode(buf),
            Packet::Unsubscribe(p) => p.encode(buf),
            Packet::Flow(p) => p.encode(buf),
            Packet::Message {
                command,
                metadata,
                payload,
            } => {
                command.encode(buf);
                metadata.encode(buf);
                payload.encode(buf);
            }
            Packet::Ack(p) => p.encode(buf),
            Packet::CloseConsumer(p) => p.encode(buf),
            Packet::Success(p) => p.encode(buf),
            Packet::Error(p) => p.encode(buf),
            Packet::Ping => {}
            Packet::Pong => {}
        }
    }

    fn read(command_type: CommandType, buf: &mut Bytes) -> Result<Self> {
        Ok(match command_type {
            CommandType::Connect => Packet::Connect(Connect::decode(buf)?),
            CommandType::Connected => Packet::Connected(Connected::decode(buf)?),
            CommandType::Lookup => Packet::Lookup(Lookup::decode(buf)?),
            CommandType::LookupResponse => Packet::LookupResponse(LookupResponse::decode(buf)?),
            CommandType::CreateProducer => Packet::CreateProducer(CreateProducer::decode(buf)?),
            CommandType::ProducerSuccess => {
                Packet::ProducerSuccess(ProducerSuccess::decode(buf)?)
            }
            CommandType::Send => Packet::Send {
                command: Send::decode(buf)?,
                metadata: MessageMetadata::decode(buf)?,
                payload: Payload::decode(buf)?,
            },
            CommandType::SendReceipt => Packet::SendReceipt(SendReceipt::decode(buf)?),
            CommandType::SendError => Packet::SendError(SendError::decode(buf)?),
            CommandType::CloseProducer => Packet::CloseProducer(CloseProducer::decode(buf)?),
            CommandType::Subscribe => Packet::Subscribe(Subscribe::decode(buf)?),
            CommandType::Unsubscribe => Packet::Unsubscribe(Unsubscribe::decode(buf)?),
            CommandType::Flow => Packet::Flow(Flow::decode(buf)?),
            CommandType::Message => Packet::Message {
                command: Message::decode(buf)?,
                metadata: MessageMetadata::decode(buf)?,
                payload: Payload::decode(buf)?,
            },
            CommandType::Ack => Packet::Ack(Ack::decode(buf)?),
            CommandType::CloseConsumer => Packet::CloseConsumer(CloseConsumer::decode(buf)?),
            CommandType::Success => Packet::Success(Success::decode(buf)?),
            CommandType::Error => Packet::Error(ServerError::decode(buf)?),
            CommandType::Ping => Packet::Ping,
            CommandType::Pong => Packet::Pong,
        })
    }

    pub fn command_type(&self) -> CommandType {
        match self {
            Packet::Connect(_) => CommandType::Connect,
            Packet::Connected(_) => CommandType::Connected,
            Packet::Lookup(_) => CommandType::Lookup,
            Packet::LookupResponse(_) => CommandType::LookupResponse,
            Packet::CreateProducer(_) => CommandType::CreateProducer,
            Packet::ProducerSuccess(_) => CommandType::ProducerSuccess,
            Packet::Send { .. } => CommandType::Send,
            Packet::SendReceipt(_) => CommandType::SendReceipt,
            Packet::SendError(_) => CommandType::SendError,
            Packet::CloseProducer(_) => CommandType::CloseProducer,
            Packet::Subscribe(_) => CommandType::Subscribe,
            Packet::Unsubscribe(_) => CommandType::Unsubscribe,
            Packet::Flow(_) => CommandType::Flow,
            Packet::Message { .. } => CommandType::Message,
            Packet::Ack(_) => CommandType::Ack,
            Packet::CloseConsumer(_) => CommandType::CloseConsumer,
            Packet::Success(_) => CommandType::Success,
            Packet::Error(_) => CommandType::Error,
            Packet::Ping => CommandType::Ping,
            Packet::Pong => CommandType::Pong,
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Header {
    /// 8 bits
    type_byte: u8,
    /// mqtt remain len algorithm
    remain_len: usize,
}

impl Header {
    fn new(command_type: CommandType, remain_len: usize) -> Self {
        Self {
            type_byte: command_type as u8,
            remain_len,
        }
    }

    /// `None` until the whole header is buffered
    fn read(mut buf: Iter<u8>) -> Result<Option<(Self, usize)>> {
        let Some(type_byte) = buf.next().copied() else {
            return Ok(None);
        };

        let mut remain_len = 0usize;
        let mut header_len = 1; // init with type_byte bit
        let mut done = false;
        let mut shift = 0;

        for byte in buf.map(|b| *b as usize) {
            header_len += 1;
            remain_len += (byte & 0x7F) << shift;

            done = (byte & 0x80) == 0;
            if done {
                break;
            }
            shift += 7;

            if shift > 21 {
                return Err(Error::MalformedPacket);
            }
        }

        if !done {
            return Ok(None);
        }

        Ok(Some((
            Header {
                remain_len,
                type_byte,
            },
            header_len,
        )))
    }

    fn write(&self, buf: &mut BytesMut) {
        buf.put_u8(self.type_byte);

        let mut done = false;
        let mut x = self.remain_len;

        while !done {
            let mut byte = (x % 128) as u8;
            x /= 128;
            if x > 0 {
                byte |= 128;
            }

            buf.put_u8(byte);
            done = x == 0;
        }
    }

    fn command_type(&self) -> Result<CommandType> {
        self.type_byte.try_into()
    }
}
