//! Encoding: `Value` → bytes.

use bytes::{BufMut, Bytes, BytesMut};

use super::estimate::estimate;
use super::header::{self, info, major};
use crate::error::CodecError;
use crate::types::{Map, Value};

/// Encodes a value tree into a freshly allocated byte buffer.
///
/// The buffer is sized up front from [`estimate`] and every write is
/// bounds-checked against that budget; only the written prefix is
/// returned.
pub fn encode_value(value: &Value) -> Result<Bytes, CodecError> {
    let capacity = estimate(value);
    let mut out = Output::with_capacity(capacity);
    write_value(&mut out, value)?;
    tracing::trace!(capacity, written = out.len(), "encoded value tree");
    Ok(out.finish())
}

/// Bounds-checked write cursor over a pre-sized buffer.
struct Output {
    buf: BytesMut,
    capacity: usize,
}

impl Output {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn check(&self, needed: usize) -> Result<(), CodecError> {
        let remaining = self.capacity - self.buf.len();
        if needed > remaining {
            return Err(CodecError::CapacityExceeded { needed, remaining });
        }
        Ok(())
    }

    fn put_u8(&mut self, value: u8) -> Result<(), CodecError> {
        self.check(1)?;
        self.buf.put_u8(value);
        Ok(())
    }

    fn put_u32(&mut self, value: u32) -> Result<(), CodecError> {
        self.check(4)?;
        self.buf.put_u32(value);
        Ok(())
    }

    fn put_u64(&mut self, value: u64) -> Result<(), CodecError> {
        self.check(8)?;
        self.buf.put_u64(value);
        Ok(())
    }

    fn put_f64(&mut self, value: f64) -> Result<(), CodecError> {
        self.check(8)?;
        self.buf.put_f64(value);
        Ok(())
    }

    fn put_slice(&mut self, slice: &[u8]) -> Result<(), CodecError> {
        self.check(slice.len())?;
        self.buf.put_slice(slice);
        Ok(())
    }

    fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

fn write_value(out: &mut Output, value: &Value) -> Result<(), CodecError> {
    match value {
        // Null has no wire representation; absent and null are
        // equivalent to the peer.
        Value::Null => Ok(()),
        Value::Bool(b) => write_bool(out, *b),
        Value::Int(i) => write_int(out, *i),
        Value::Double(d) => write_double(out, *d),
        Value::Text(s) => write_text(out, s),
        Value::Binary(b) => write_binary(out, b),
        Value::Sequence(items) => write_sequence(out, items),
        Value::Map(map) => write_map(out, map),
    }
}

/// Booleans ride the numeric dispatch: a single header byte carrying
/// the inline unsigned value 0 or 1.
fn write_bool(out: &mut Output, value: bool) -> Result<(), CodecError> {
    out.put_u8(header::compose(major::UNSIGNED, u8::from(value)))
}

/// Encodes an integer in the fixed 4-byte form, never a minimal width.
/// Magnitudes beyond 32 bits take the 8-byte wide form.
fn write_int(out: &mut Output, value: i64) -> Result<(), CodecError> {
    let (major, magnitude) = if value < 0 {
        (major::NEGATIVE, (-1 - value) as u64)
    } else {
        (major::UNSIGNED, value as u64)
    };

    if magnitude <= u64::from(u32::MAX) {
        out.put_u8(header::compose(major, info::WIDTH_4))?;
        out.put_u32(magnitude as u32)
    } else {
        out.put_u8(header::compose(major, info::WIDTH_8))?;
        out.put_u64(magnitude)
    }
}

fn write_double(out: &mut Output, value: f64) -> Result<(), CodecError> {
    out.put_u8(header::compose(major::FLOAT, info::WIDTH_8))?;
    out.put_f64(value)
}

/// Encodes a text string, one byte per character.
fn write_text(out: &mut Output, value: &str) -> Result<(), CodecError> {
    let len = value.chars().count();
    if len <= info::MAX_INLINE as usize {
        out.put_u8(header::compose(major::TEXT, len as u8))?;
    } else {
        out.put_u8(header::compose(major::TEXT, info::WIDTH_4))?;
        out.put_u32(len as u32)?;
    }

    for ch in value.chars() {
        let code = u32::from(ch);
        if code > 0xFF {
            return Err(CodecError::WideCharacter(ch));
        }
        out.put_u8(code as u8)?;
    }
    Ok(())
}

fn write_binary(out: &mut Output, value: &[u8]) -> Result<(), CodecError> {
    out.put_u8(header::compose(major::BINARY, info::WIDTH_4))?;
    out.put_u32(value.len() as u32)?;
    out.put_slice(value)
}

/// Sequences are always emitted indefinite-length and closed with the
/// break marker.
fn write_sequence(out: &mut Output, items: &[Value]) -> Result<(), CodecError> {
    out.put_u8(header::SEQUENCE_BEGIN)?;
    for item in items {
        write_value(out, item)?;
    }
    out.put_u8(header::BREAK)
}

/// Map entries flatten to alternating key, value on the wire; length
/// information lives only in the container markers.
fn write_map(out: &mut Output, map: &Map) -> Result<(), CodecError> {
    out.put_u8(header::MAP_BEGIN)?;
    for (key, value) in map.iter() {
        if matches!(value, Value::Null) {
            continue;
        }
        write_text(out, key)?;
        write_value(out, value)?;
    }
    out.put_u8(header::BREAK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Map;

    fn encoded(value: &Value) -> Vec<u8> {
        encode_value(value).expect("encode failed").to_vec()
    }

    #[test]
    fn encode_int_fixed_four_byte_form() {
        assert_eq!(encoded(&Value::Int(42)), [0x1A, 0x00, 0x00, 0x00, 0x2A]);
        // Small magnitudes still take the long form.
        assert_eq!(encoded(&Value::Int(0)), [0x1A, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(encoded(&Value::Int(1)), [0x1A, 0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn encode_negative_int_magnitude() {
        // -1 - (-5) = 4
        assert_eq!(encoded(&Value::Int(-5)), [0x3A, 0x00, 0x00, 0x00, 0x04]);
        assert_eq!(encoded(&Value::Int(-1)), [0x3A, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn encode_int_wide_form() {
        let value = i64::from(u32::MAX) + 1;
        assert_eq!(
            encoded(&Value::Int(value)),
            [0x1B, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
        );

        let negative = -2 - i64::from(u32::MAX);
        assert_eq!(
            encoded(&Value::Int(negative)),
            [0x3B, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn encode_booleans() {
        assert_eq!(encoded(&Value::Bool(false)), [0x00]);
        assert_eq!(encoded(&Value::Bool(true)), [0x01]);
    }

    #[test]
    fn encode_double() {
        let mut expected = vec![0xFB];
        expected.extend_from_slice(&1.5f64.to_be_bytes());
        assert_eq!(encoded(&Value::Double(1.5)), expected);
    }

    #[test]
    fn encode_short_text() {
        assert_eq!(encoded(&Value::Text("hi".into())), [0x62, 0x68, 0x69]);
        assert_eq!(encoded(&Value::Text(String::new())), [0x60]);
    }

    #[test]
    fn encode_long_text() {
        let s = "x".repeat(24);
        let mut expected = vec![0x7A, 0x00, 0x00, 0x00, 0x18];
        expected.extend_from_slice(s.as_bytes());
        assert_eq!(encoded(&Value::Text(s)), expected);
    }

    #[test]
    fn encode_single_byte_characters() {
        // U+00E9 fits in one byte.
        assert_eq!(encoded(&Value::Text("é".into())), [0x61, 0xE9]);
    }

    #[test]
    fn encode_rejects_wide_characters() {
        let err = encode_value(&Value::Text("€".into())).unwrap_err();
        assert!(matches!(err, CodecError::WideCharacter('€')));
    }

    #[test]
    fn encode_binary_payload() {
        assert_eq!(
            encoded(&Value::Binary(vec![0xDE, 0xAD])),
            [0x5A, 0x00, 0x00, 0x00, 0x02, 0xDE, 0xAD]
        );
    }

    #[test]
    fn encode_empty_sequence() {
        assert_eq!(encoded(&Value::Sequence(vec![])), [0x9F, 0xFF]);
    }

    #[test]
    fn encode_single_entry_map() {
        let map = Map::from([("a", Value::Int(1))]);
        assert_eq!(
            encoded(&Value::Map(map)),
            [0xBF, 0x61, 0x61, 0x1A, 0x00, 0x00, 0x00, 0x01, 0xFF]
        );
    }

    #[test]
    fn encode_null_root_is_empty() {
        assert_eq!(encoded(&Value::Null), Vec::<u8>::new());
    }

    #[test]
    fn encode_omits_null_map_entries() {
        let map = Map::from([("gone", Value::Null), ("kept", Value::Int(2))]);
        assert_eq!(
            encoded(&Value::Map(map)),
            [
                0xBF, // map begin
                0x64, 0x6B, 0x65, 0x70, 0x74, // "kept"
                0x1A, 0x00, 0x00, 0x00, 0x02, // 2
                0xFF, // break
            ]
        );
    }

    #[test]
    fn encode_skips_null_sequence_elements() {
        let seq = Value::Sequence(vec![Value::Null, Value::Int(7), Value::Null]);
        assert_eq!(encoded(&seq), [0x9F, 0x1A, 0x00, 0x00, 0x00, 0x07, 0xFF]);
    }

    #[test]
    fn encode_nested_containers() {
        let tree = Value::Sequence(vec![
            Value::Int(1),
            Value::Sequence(vec![Value::Text("a".into())]),
        ]);
        assert_eq!(
            encoded(&tree),
            [
                0x9F, // outer begin
                0x1A, 0x00, 0x00, 0x00, 0x01, // 1
                0x9F, 0x61, 0x61, 0xFF, // inner ["a"]
                0xFF, // outer break
            ]
        );
    }

    #[test]
    fn output_reports_capacity_exceeded() {
        let mut out = Output::with_capacity(2);
        out.put_u8(0xAA).unwrap();
        let err = out.put_u32(1).unwrap_err();
        assert!(matches!(
            err,
            CodecError::CapacityExceeded {
                needed: 4,
                remaining: 1
            }
        ));
    }
}
