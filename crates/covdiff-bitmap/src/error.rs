/// Errors raised while decoding a raw coverage bitmap.
///
/// Every byte value is meaningful in both encodings (a bit field for
/// blocks, a counter slot for edges), so these errors describe buffers
/// whose overall length the decoder cannot accept.
///
/// ```text
/// ┌────────────────┬────────────────────────────────────────────────┐
/// │ Variant        │ Cause                                          │
/// ├────────────────┼────────────────────────────────────────────────┤
/// │ TooLarge       │ Positions overflow a u32 location id           │
/// │ LengthMismatch │ Length differs from the declared shape         │
/// └────────────────┴────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitmapError {
    /// The buffer holds more positions than a `u32` location id can name.
    #[error("{map} bitmap of {len} bytes exceeds the u32 location space")]
    TooLarge { map: &'static str, len: usize },

    /// The caller declared the expected buffer length and it did not match:
    /// the file was truncated or produced by a different build.
    #[error("{map} bitmap length mismatch: expected {expected} bytes, found {found}")]
    LengthMismatch {
        map: &'static str,
        expected: usize,
        found: usize,
    },
}
