//! Decoder capability configuration.

/// Capability flags consulted by the decoder.
///
/// Resolved once at startup and injected, rather than read from global
/// state. Peers built on constrained hosts may lack 64-bit integer
/// reads; a decoder can be configured to match such a peer by clearing
/// `wide_ints`, in which case width-code-27 magnitudes are rejected as
/// unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether 8-byte (width code 27) integer magnitudes are decoded.
    pub wide_ints: bool,
}

impl Capabilities {
    /// Detects the capabilities of the current host.
    ///
    /// Every supported Rust target has 64-bit integer reads, so
    /// detection is trivially positive; the flag stays injectable for
    /// interoperating with peers that lack them.
    pub fn detect() -> Self {
        Self { wide_ints: true }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}
