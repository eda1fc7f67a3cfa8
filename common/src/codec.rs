use bytes::{Buf, BufMut, Bytes, BytesMut};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("insufficient bytes")]
    InsufficientBytes,
    #[error("malformed packet")]
    Malformed,
    #[error("unsupported {kind} value: {value}")]
    UnsupportedValue { kind: &'static str, value: u8 },
}

pub trait Codec {
    fn decode(buf: &mut Bytes) -> Result<Self>
    where
        Self: Sized;

    fn encode(&self, buf: &mut BytesMut);

    /// encoded length in bytes
    fn size(&self) -> usize;
}

impl Codec for u8 {
    fn decode(buf: &mut Bytes) -> Result<Self> {
        get_u8(buf)
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(*self)
    }

    fn size(&self) -> usize {
        1
    }
}

impl Codec for bool {
    fn decode(buf: &mut Bytes) -> Result<Self> {
        match get_u8(buf)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(Error::UnsupportedValue {
                kind: "bool",
                value,
            }),
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(*self as u8)
    }

    fn size(&self) -> usize {
        1
    }
}

impl Codec for u16 {
    fn decode(buf: &mut Bytes) -> Result<Self> {
        get_u16(buf)
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(*self)
    }

    fn size(&self) -> usize {
        2
    }
}

impl Codec for u32 {
    fn decode(buf: &mut Bytes) -> Result<Self> {
        get_u32(buf)
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(*self)
    }

    fn size(&self) -> usize {
        4
    }
}

impl Codec for u64 {
    fn decode(buf: &mut Bytes) -> Result<Self> {
        get_u64(buf)
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u64(*self)
    }

    fn size(&self) -> usize {
        8
    }
}

impl Codec for String {
    fn decode(buf: &mut Bytes) -> Result<Self> {
        read_string(buf)
    }

    fn encode(&self, buf: &mut BytesMut) {
        write_string(buf, self)
    }

    fn size(&self) -> usize {
        4 + self.len()
    }
}

impl Codec for Bytes {
    fn decode(buf: &mut Bytes) -> Result<Self> {
        read_bytes(buf)
    }

    fn encode(&self, buf: &mut BytesMut) {
        write_bytes(buf, self)
    }

    fn size(&self) -> usize {
        4 + self.len()
    }
}

/// one presence byte, followed by the value if present
impl<T: Codec> Codec for Option<T> {
    fn decode(buf: &mut Bytes) -> Result<Self> {
        if bool::decode(buf)? {
            Ok(Some(T::decode(buf)?))
        } else {
            Ok(None)
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        match self {
            Some(value) => {
                buf.put_u8(1);
                value.encode(buf);
            }
            None => buf.put_u8(0),
        }
    }

    fn size(&self) -> usize {
        1 + self.as_ref().map(Codec::size).unwrap_or(0)
    }
}

/// u32 count, followed by entries
impl<T: Codec> Codec for Vec<T> {
    fn decode(buf: &mut Bytes) -> Result<Self> {
        let count = get_u32(buf)? as usize;
        // every entry takes at least one byte
        assert_len(buf, count)?;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(T::decode(buf)?);
        }
        Ok(entries)
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.len() as u32);
        for entry in self {
            entry.encode(buf);
        }
    }

    fn size(&self) -> usize {
        4 + self.iter().map(Codec::size).sum::<usize>()
    }
}

fn assert_len(buf: &Bytes, len: usize) -> Result<()> {
    if buf.len() < len {
        return Err(Error::InsufficientBytes);
    }

    Ok(())
}

pub fn read_bytes(buf: &mut Bytes) -> Result<Bytes> {
    let len = get_u32(buf)? as usize;
    assert_len(buf, len)?;
    Ok(buf.split_to(len))
}

pub fn read_string(buf: &mut Bytes) -> Result<String> {
    let len = get_u32(buf)? as usize;
    assert_len(buf, len)?;
    let bytes = buf.split_to(len);
    String::from_utf8(bytes.to_vec()).map_err(|_| Error::Malformed)
}

pub fn write_bytes(buf: &mut BytesMut, bytes: &[u8]) {
    buf.put_u32(bytes.len() as u32);
    buf.extend_from_slice(bytes);
}

/// u32 length prefix, same as byte blobs
pub fn write_string(buf: &mut BytesMut, string: &str) {
    buf.put_u32(string.len() as u32);
    buf.extend_from_slice(string.as_bytes());
}

pub fn get_u8(buf: &mut Bytes) -> Result<u8> {
    assert_len(buf, 1)?;
    Ok(buf.get_u8())
}

pub fn get_u16(buf: &mut Bytes) -> Result<u16> {
    assert_len(buf, 2)?;
    Ok(buf.get_u16())
}

pub fn get_u32(buf: &mut Bytes) -> Result<u32> {
    assert_len(buf, 4)?;
    Ok(buf.get_u32())
}

pub fn get_u64(buf: &mut Bytes) -> Result<u64> {
    assert_len(buf, 8)?;
    Ok(buf.get_u64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_string() {
        let test_string = "test_string".to_string();
        let mut bytes = BytesMut::new();
        test_string.encode(&mut bytes);
        assert_eq!(bytes.len(), 11 + 4);
        assert_eq!(bytes.len(), test_string.size());
        assert_eq!(test_string, read_string(&mut bytes.freeze()).unwrap());
    }

    #[test]
    fn codec_long_string() {
        let long = "x".repeat(u16::MAX as usize + 2);
        let mut bytes = BytesMut::new();
        long.encode(&mut bytes);
        assert_eq!(bytes.len(), long.size());
        let mut bytes = bytes.freeze();
        assert_eq!(String::decode(&mut bytes).unwrap(), long);
        assert!(bytes.is_empty());
    }

    #[test]
    fn codec_option_and_vec() {
        let values: Vec<Option<u32>> = vec![Some(7), None, Some(u32::MAX)];
        let mut bytes = BytesMut::new();
        values.encode(&mut bytes);
        assert_eq!(bytes.len(), values.size());
        let decoded = Vec::<Option<u32>>::decode(&mut bytes.freeze()).unwrap();
        assert_eq!(values, decoded);
    }

    #[test]
    fn truncated_input() {
        let mut bytes = BytesMut::new();
        Bytes::from_static(b"hello, world").encode(&mut bytes);
        let mut truncated = bytes.freeze().slice(..8);
        assert_eq!(
            Bytes::decode(&mut truncated),
            Err(Error::InsufficientBytes)
        );
    }

    #[test]
    fn invalid_bool() {
        let mut bytes = Bytes::from_static(&[2]);
        assert_eq!(
            bool::decode(&mut bytes),
            Err(Error::UnsupportedValue {
                kind: "bool",
                value: 2
            })
        );
    }
}
