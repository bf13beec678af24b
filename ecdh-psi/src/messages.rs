//! Message types exchanged between PSI peers.
//!
//! Messages are plain serde types; callers pick the wire format. Encoded
//! points serialize as hex strings and tokens as 32-character hex strings.

use crate::config::CurveId;
use crate::error::{PsiError, Result};
use crate::token::Token;
use serde::{Deserialize, Serialize};

/// Masked points for all of the sender's items, in the sender's item order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskedPointsMessage {
    /// Curve the points were masked on
    pub curve: CurveId,
    /// Encoded masked points, one per item
    #[serde(with = "hex_points")]
    pub points: Vec<Vec<u8>>,
}

impl MaskedPointsMessage {
    pub fn new(curve: CurveId, points: Vec<Vec<u8>>) -> Self {
        Self { curve, points }
    }

    /// Check that the message was produced on `expected`.
    ///
    /// # Errors
    /// Returns `PsiError::CurveMismatch` if the curves differ.
    pub fn ensure_curve(&self, expected: CurveId) -> Result<()> {
        if self.curve != expected {
            return Err(PsiError::CurveMismatch {
                local: expected,
                peer: self.curve,
            });
        }
        Ok(())
    }

    /// Returns the number of points in this message.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if this message contains no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Tokens the sender computed over the receiver's masked points, in the
/// receiver's item order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensMessage {
    pub tokens: Vec<Token>,
}

impl TokensMessage {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Returns the number of tokens in this message.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if this message contains no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Envelope for everything that crosses a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PsiMessage {
    MaskedPoints(MaskedPointsMessage),
    Tokens(TokensMessage),
}

impl PsiMessage {
    /// Wire name of the message variant, as used in `UnexpectedMessage` errors.
    pub fn kind(&self) -> &'static str {
        match self {
            PsiMessage::MaskedPoints(_) => "masked_points",
            PsiMessage::Tokens(_) => "tokens",
        }
    }

    /// Unwrap a masked points message.
    ///
    /// # Errors
    /// Returns `PsiError::UnexpectedMessage` for any other variant.
    pub fn into_masked_points(self) -> Result<MaskedPointsMessage> {
        match self {
            PsiMessage::MaskedPoints(message) => Ok(message),
            other => Err(PsiError::UnexpectedMessage {
                expected: "masked_points",
                actual: other.kind(),
            }),
        }
    }

    /// Unwrap a tokens message.
    ///
    /// # Errors
    /// Returns `PsiError::UnexpectedMessage` for any other variant.
    pub fn into_tokens(self) -> Result<TokensMessage> {
        match self {
            PsiMessage::Tokens(message) => Ok(message),
            other => Err(PsiError::UnexpectedMessage {
                expected: "tokens",
                actual: other.kind(),
            }),
        }
    }
}

impl From<MaskedPointsMessage> for PsiMessage {
    fn from(message: MaskedPointsMessage) -> Self {
        PsiMessage::MaskedPoints(message)
    }
}

impl From<TokensMessage> for PsiMessage {
    fn from(message: TokensMessage) -> Self {
        PsiMessage::Tokens(message)
    }
}

mod hex_points {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(points: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(points.iter().map(hex::encode))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| hex::decode(s).map_err(D::Error::custom))
            .collect()
    }
}
