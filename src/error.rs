//! Error types for the codec.

/// Errors that can occur while encoding or decoding a value tree.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The size estimate under-shot the actual encoded size.
    #[error("encode capacity exceeded: needed {needed} bytes, {remaining} remaining")]
    CapacityExceeded { needed: usize, remaining: usize },

    /// The decoder attempted to read past the end of input.
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    BufferUnderrun { needed: usize, remaining: usize },

    /// A map entry's key header was not a text string.
    #[error("map key has major type {major}, expected a text string")]
    MalformedKey { major: u8 },

    /// The header names a major type the decoder does not handle.
    #[error("unsupported major type {major} (info {info})")]
    UnsupportedMajorType { major: u8, info: u8 },

    /// The header names a width code the decoder does not handle.
    #[error("unsupported width code {info} for major type {major}")]
    UnsupportedWidth { major: u8, info: u8 },

    /// Text contains a character outside the single-byte range.
    #[error("character {0:?} exceeds the single-byte text range")]
    WideCharacter(char),

    /// A break marker appeared outside an indefinite-length container.
    #[error("break marker outside an indefinite-length container")]
    UnexpectedBreak,
}
