//! Finalization hash: doubly-masked points to 128-bit comparison tokens.
//!
//! Tokens are BLAKE3 of the point's canonical encoding, truncated to the
//! first 16 bytes. They are only ever compared for equality. With `n` items
//! per side the chance of any spurious match is about `n^2 / 2^128`, which is
//! negligible for sets well under 2^32 entries.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Fixed-width equality key derived from a doubly-masked point.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u128);

impl Token {
    pub const LEN: usize = 16;

    pub fn to_bytes(self) -> [u8; Self::LEN] {
        self.0.to_le_bytes()
    }

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Token(u128::from_le_bytes(bytes))
    }
}

/// Reduce an encoded point to its token.
pub fn finalize_to_token(encoded_point: &[u8]) -> Token {
    let digest = blake3::hash(encoded_point);
    let mut bytes = [0u8; Token::LEN];
    bytes.copy_from_slice(&digest.as_bytes()[..Token::LEN]);
    Token::from_bytes(bytes)
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({self})")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut bytes = [0u8; Token::LEN];
        hex::decode_to_slice(&s, &mut bytes).map_err(D::Error::custom)?;
        Ok(Token::from_bytes(bytes))
    }
}
