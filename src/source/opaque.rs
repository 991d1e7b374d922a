//! Non-inspectable candidate bytes.

use std::fmt;

/// Bytes produced by a candidate source, passed through untouched.
///
/// The only way to look inside is [`OpaqueBytes::into_inner`], which consumes
/// the wrapper. There is deliberately no equality, length, iteration, or
/// `Display`; `Debug` never prints the content.
pub struct OpaqueBytes(Vec<u8>);

impl OpaqueBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Give up the wrapper and take the raw bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for OpaqueBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OpaqueBytes(..)")
    }
}
