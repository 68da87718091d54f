//! Tagged binary encoding format for value trees.
//!
//! Every value is introduced by a single header byte whose top 3 bits
//! select a major type and whose bottom 5 bits refine it. Multi-byte
//! integers and floats are big-endian. Containers are written
//! indefinite-length and closed with a break marker, though the decoder
//! accepts definite-length containers from other producers.

pub mod decode;
pub mod encode;
pub mod estimate;
pub mod header;

pub use decode::{decode_value, decode_value_with};
pub use encode::encode_value;
pub use estimate::estimate;
