//! Compound key encoding and decoding.
//!
//! A compound key packs an object type and an ordered tuple of string
//! fields into one physical key:
//!
//! ```text
//! | version (u8) | record_tag (u8) | seg(object_type) | count | seg(field_1) | ... | seg(field_n) |
//!
//! seg(x) = | len(x) as 4 ASCII digits, zero padded | bytes of x |
//! count  = | number of fields as 4 ASCII digits, zero padded |
//! ```
//!
//! Every length prefix has the same width, so two keys that differ in some
//! segment differ at a byte both of them contain: either inside the length
//! digits or inside the segment body. No key is a byte-prefix of another key,
//! and keys for different object types never interleave. The field count
//! keeps tuples of different arity apart for the same reason.
//!
//! A prefix key is the same encoding cut off after the last supplied field;
//! [`crate::planner`] turns it into a scan range.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Key format version.
pub const KEY_VERSION: u8 = 0x01;

/// Record tag: type 0x1 in high 4 bits, reserved 0x0 in low 4 bits.
pub const RECORD_TAG: u8 = 0x10;

/// Number of decimal digits in every length prefix.
pub const LENGTH_WIDTH: usize = 4;

/// Largest segment, in bytes, a length prefix can describe.
pub const MAX_SEGMENT_LEN: usize = 9999;

const HEADER_LEN: usize = 2;

/// A physical key split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedKey {
    pub object_type: String,
    pub fields: Vec<String>,
}

/// Encodes the physical key for a full tuple of fields.
///
/// # Errors
///
/// - [`Error::EmptyTuple`] if `fields` is empty
/// - [`Error::FieldTooLong`] if the object type or any field exceeds
///   [`MAX_SEGMENT_LEN`] bytes
/// - [`Error::InvalidInput`] if the object type is empty
pub fn encode_key<S: AsRef<str>>(object_type: &str, fields: &[S]) -> Result<Bytes> {
    encode_prefix(object_type, fields.len(), fields)
}

/// Encodes the key prefix shared by every full tuple of `arity` fields whose
/// leading fields equal `prefix`.
///
/// With `prefix.len() == arity` this is exactly [`encode_key`]; with an empty
/// prefix it covers every record of the object type.
///
/// # Errors
///
/// - [`Error::EmptyTuple`] if `arity` is zero
/// - [`Error::PrefixLength`] if `prefix` has more than `arity` fields
/// - [`Error::FieldTooLong`] / [`Error::InvalidInput`] as for [`encode_key`]
pub fn encode_prefix<S: AsRef<str>>(object_type: &str, arity: usize, prefix: &[S]) -> Result<Bytes> {
    if arity == 0 {
        return Err(Error::EmptyTuple);
    }
    if prefix.len() > arity {
        return Err(Error::PrefixLength {
            supplied: prefix.len(),
            arity,
        });
    }
    if object_type.is_empty() {
        return Err(Error::InvalidInput("object type must not be empty".to_string()));
    }
    if arity > MAX_SEGMENT_LEN {
        return Err(Error::InvalidInput(format!(
            "{} key fields exceed the limit of {}",
            arity, MAX_SEGMENT_LEN
        )));
    }

    let body: usize = prefix
        .iter()
        .map(|f| LENGTH_WIDTH + f.as_ref().len())
        .sum();
    let mut buf = BytesMut::with_capacity(
        HEADER_LEN + 2 * LENGTH_WIDTH + object_type.len() + body,
    );
    buf.put_u8(KEY_VERSION);
    buf.put_u8(RECORD_TAG);
    put_segment(&mut buf, object_type.as_bytes())?;
    put_length(&mut buf, arity);
    for field in prefix {
        put_segment(&mut buf, field.as_ref().as_bytes())?;
    }
    Ok(buf.freeze())
}

/// Decodes a physical key produced by [`encode_key`].
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the header is wrong, a length prefix is
/// truncated or not decimal, a segment is cut short, the field count does
/// not match the segments present, or a segment is not UTF-8.
pub fn decode_key(key: &[u8]) -> Result<DecodedKey> {
    if key.len() < HEADER_LEN {
        return Err(Error::Encoding(format!(
            "key too short: expected at least {} bytes, got {}",
            HEADER_LEN,
            key.len()
        )));
    }
    if key[0] != KEY_VERSION {
        return Err(Error::Encoding(format!(
            "invalid key version: expected 0x{:02x}, got 0x{:02x}",
            KEY_VERSION, key[0]
        )));
    }
    if key[1] != RECORD_TAG {
        return Err(Error::Encoding(format!(
            "invalid record tag: expected 0x{:02x}, got 0x{:02x}",
            RECORD_TAG, key[1]
        )));
    }

    let mut rest = &key[HEADER_LEN..];
    let object_type = segment_text(read_segment(&mut rest)?)?;
    let count = read_length(&mut rest)?;
    if count == 0 {
        return Err(Error::Encoding("key declares zero fields".to_string()));
    }

    let mut fields = Vec::with_capacity(count);
    while !rest.is_empty() {
        fields.push(segment_text(read_segment(&mut rest)?)?);
    }
    if fields.len() != count {
        return Err(Error::Encoding(format!(
            "key declares {} fields but holds {}",
            count,
            fields.len()
        )));
    }

    Ok(DecodedKey {
        object_type,
        fields,
    })
}

fn put_segment(buf: &mut BytesMut, segment: &[u8]) -> Result<()> {
    if segment.len() > MAX_SEGMENT_LEN {
        return Err(Error::FieldTooLong {
            len: segment.len(),
            max: MAX_SEGMENT_LEN,
        });
    }
    put_length(buf, segment.len());
    buf.put_slice(segment);
    Ok(())
}

/// Writes `len` as zero-padded decimal digits. Callers ensure `len` fits.
fn put_length(buf: &mut BytesMut, len: usize) {
    let mut divisor = 10usize.pow(LENGTH_WIDTH as u32 - 1);
    while divisor > 0 {
        buf.put_u8(b'0' + ((len / divisor) % 10) as u8);
        divisor /= 10;
    }
}

fn read_length(buf: &mut &[u8]) -> Result<usize> {
    if buf.len() < LENGTH_WIDTH {
        return Err(Error::Encoding(format!(
            "truncated length prefix: need {} bytes, got {}",
            LENGTH_WIDTH,
            buf.len()
        )));
    }
    let (digits, rest) = buf.split_at(LENGTH_WIDTH);
    let mut len = 0usize;
    for &digit in digits {
        if !digit.is_ascii_digit() {
            return Err(Error::Encoding(format!(
                "invalid length prefix byte 0x{:02x}",
                digit
            )));
        }
        len = len * 10 + usize::from(digit - b'0');
    }
    *buf = rest;
    Ok(len)
}

fn read_segment<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = read_length(buf)?;
    if buf.len() < len {
        return Err(Error::Encoding(format!(
            "truncated segment: need {} bytes, got {}",
            len,
            buf.len()
        )));
    }
    let (segment, rest) = buf.split_at(len);
    *buf = rest;
    Ok(segment)
}

fn segment_text(segment: &[u8]) -> Result<String> {
    std::str::from_utf8(segment)
        .map(str::to_owned)
        .map_err(|e| Error::Encoding(format!("segment is not valid UTF-8: {}", e)))
}
