//! Decoding: bytes → `Value`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::header::{Header, info, major};
use crate::config::Capabilities;
use crate::error::CodecError;
use crate::types::{Map, Value};

/// Decodes a single value tree from `data` with detected capabilities.
pub fn decode_value(data: &[u8]) -> Result<Value, CodecError> {
    decode_value_with(data, Capabilities::detect())
}

/// Decodes a single value tree from `data`.
///
/// The first value in the buffer becomes the root; a scalar root is
/// returned directly. Empty input decodes to `Null`, mirroring the
/// encoder's zero-byte output for a null root.
pub fn decode_value_with(data: &[u8], caps: Capabilities) -> Result<Value, CodecError> {
    tracing::trace!(len = data.len(), "decoding value tree");
    let mut decoder = Decoder::new(data, caps);
    let Some(header) = decoder.read_header() else {
        return Ok(Value::Null);
    };
    decoder.decode(header)
}

/// Single-pass cursor over an encoded byte buffer.
struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    caps: Capabilities,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8], caps: Capabilities) -> Self {
        Self { data, pos: 0, caps }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Reads the next header byte, or `None` at end of input.
    fn read_header(&mut self) -> Option<Header> {
        if self.pos >= self.data.len() {
            return None;
        }
        let header = Header::parse(self.data[self.pos]);
        self.pos += 1;
        Some(header)
    }

    /// Like `read_header`, where running out of input is an error.
    fn require_header(&mut self) -> Result<Header, CodecError> {
        self.read_header().ok_or(CodecError::BufferUnderrun {
            needed: 1,
            remaining: 0,
        })
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], CodecError> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(CodecError::BufferUnderrun { needed, remaining });
        }
        let slice = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn decode(&mut self, header: Header) -> Result<Value, CodecError> {
        match header.major {
            major::UNSIGNED => Ok(Value::Int(self.read_magnitude(header)?)),
            major::NEGATIVE => {
                let magnitude = self.read_magnitude(header)?;
                Ok(Value::Int((-1i64).wrapping_sub(magnitude)))
            }
            major::BINARY => self.decode_binary(header),
            major::TEXT => Ok(Value::Text(self.read_text(header)?)),
            major::SEQUENCE => self.decode_sequence(header),
            major::MAP => self.decode_map(header),
            major::FLOAT => self.decode_float(header),
            _ => Err(CodecError::UnsupportedMajorType {
                major: header.major,
                info: header.info,
            }),
        }
    }

    /// Reads the unsigned magnitude selected by the header's info bits:
    /// inline below 24, else 1/2/4/8 following big-endian bytes. The
    /// 8-byte form is read as a signed wide integer and is gated on
    /// `Capabilities::wide_ints`.
    fn read_magnitude(&mut self, header: Header) -> Result<i64, CodecError> {
        match header.info {
            n if n <= info::MAX_INLINE => Ok(i64::from(n)),
            info::WIDTH_1 => Ok(i64::from(self.take(1)?[0])),
            info::WIDTH_2 => {
                let b = self.take(2)?;
                Ok(i64::from(u16::from_be_bytes([b[0], b[1]])))
            }
            info::WIDTH_4 => {
                let b = self.take(4)?;
                Ok(i64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]])))
            }
            info::WIDTH_8 => {
                if !self.caps.wide_ints {
                    return Err(CodecError::UnsupportedWidth {
                        major: header.major,
                        info: header.info,
                    });
                }
                let b = self.take(8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(b);
                Ok(i64::from_be_bytes(raw))
            }
            _ => Err(CodecError::UnsupportedWidth {
                major: header.major,
                info: header.info,
            }),
        }
    }

    /// Reads a length field; a wide magnitude that cannot index the
    /// buffer is rejected rather than wrapped.
    fn read_length(&mut self, header: Header) -> Result<usize, CodecError> {
        let magnitude = self.read_magnitude(header)?;
        usize::try_from(magnitude).map_err(|_| CodecError::UnsupportedWidth {
            major: header.major,
            info: header.info,
        })
    }

    /// Reads text, one byte per character (U+0000..=U+00FF).
    fn read_text(&mut self, header: Header) -> Result<String, CodecError> {
        let len = self.read_length(header)?;
        let payload = self.take(len)?;
        Ok(payload.iter().map(|&b| char::from(b)).collect())
    }

    /// Binary payloads are surfaced as base64 text rather than raw
    /// bytes: the encoder takes bytes in, the decoder hands portable
    /// text back. Deliberately not a byte-exact round trip.
    fn decode_binary(&mut self, header: Header) -> Result<Value, CodecError> {
        let len = self.read_length(header)?;
        let payload = self.take(len)?;
        Ok(Value::Text(BASE64.encode(payload)))
    }

    fn decode_sequence(&mut self, header: Header) -> Result<Value, CodecError> {
        let mut items = Vec::new();
        if header.info == info::INDEFINITE {
            loop {
                let element = self.require_header()?;
                if element.is_break() {
                    break;
                }
                items.push(self.decode(element)?);
            }
        } else {
            let count = self.read_length(header)?;
            // Every element needs at least a header byte, so the input
            // length caps any honest count.
            items.reserve(count.min(self.remaining()));
            for _ in 0..count {
                let element = self.require_header()?;
                items.push(self.decode(element)?);
            }
        }
        Ok(Value::Sequence(items))
    }

    fn decode_map(&mut self, header: Header) -> Result<Value, CodecError> {
        let mut map = Map::new();
        if header.info == info::INDEFINITE {
            loop {
                let key = self.require_header()?;
                if key.is_break() {
                    break;
                }
                self.decode_entry(key, &mut map)?;
            }
        } else {
            let count = self.read_length(header)?;
            for _ in 0..count {
                let key = self.require_header()?;
                self.decode_entry(key, &mut map)?;
            }
        }
        Ok(Value::Map(map))
    }

    /// Decodes one key-value pair; `key` is the entry's first header,
    /// which must be a text string.
    fn decode_entry(&mut self, key: Header, map: &mut Map) -> Result<(), CodecError> {
        if key.major != major::TEXT {
            return Err(CodecError::MalformedKey { major: key.major });
        }
        let name = self.read_text(key)?;
        let value_header = self.require_header()?;
        let value = self.decode(value_header)?;
        map.insert(name, value);
        Ok(())
    }

    fn decode_float(&mut self, header: Header) -> Result<Value, CodecError> {
        match header.info {
            // Inline simple value.
            n if n <= info::MAX_INLINE => Ok(Value::Double(f64::from(n))),
            // Legacy placeholder width: consumed, no numeric meaning.
            info::WIDTH_1 => {
                self.take(1)?;
                Ok(Value::Double(0.0))
            }
            // Half-precision is not supported; the payload is skipped.
            info::WIDTH_2 => {
                self.take(2)?;
                Ok(Value::Double(0.0))
            }
            info::WIDTH_4 => {
                let b = self.take(4)?;
                let mut raw = [0u8; 4];
                raw.copy_from_slice(b);
                Ok(Value::Double(f64::from(f32::from_be_bytes(raw))))
            }
            info::WIDTH_8 => {
                let b = self.take(8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(b);
                Ok(Value::Double(f64::from_be_bytes(raw)))
            }
            info::INDEFINITE => Err(CodecError::UnexpectedBreak),
            _ => Err(CodecError::UnsupportedWidth {
                major: header.major,
                info: header.info,
            }),
        }
    }
}
