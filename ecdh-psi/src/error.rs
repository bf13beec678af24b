//! Error types for the ECDH-PSI engine.

use crate::config::CurveId;
use thiserror::Error;

/// Reasons a single point is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PointError {
    /// The bytes do not encode a point of the configured curve.
    #[error("bytes are not a valid point encoding")]
    InvalidEncoding,

    /// The point is the group identity.
    #[error("point is the group identity")]
    Identity,
}

/// Errors that can occur while masking items or finalizing peer points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PsiError {
    /// A point in a batch was rejected; `index` is its position in the input.
    #[error("invalid point at index {index}: {source}")]
    InvalidPoint { index: usize, source: PointError },

    /// The secure entropy source could not produce a private scalar.
    #[error("secure randomness unavailable: {0}")]
    EntropyUnavailable(String),

    /// A caller-supplied buffer (or a peer batch) has the wrong length.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The hash-to-curve primitive rejected its input.
    #[error("hash-to-curve failed: {0}")]
    HashToCurve(String),

    /// The peer announced a different curve for this run.
    #[error("curve mismatch: local {local}, peer {peer}")]
    CurveMismatch { local: CurveId, peer: CurveId },

    /// The peer sent a message out of protocol order.
    #[error("unexpected message: expected {expected}, got {actual}")]
    UnexpectedMessage {
        expected: &'static str,
        actual: &'static str,
    },

    /// The transport collaborator failed to deliver a message.
    #[error("transport error: {0}")]
    Transport(String),

    /// The engine configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PsiError {
    pub(crate) fn invalid_point(index: usize, source: PointError) -> Self {
        PsiError::InvalidPoint { index, source }
    }

    /// Index of the offending batch entry, if this error names one.
    pub fn index(&self) -> Option<usize> {
        match self {
            PsiError::InvalidPoint { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Result type for PSI operations.
pub type Result<T> = std::result::Result<T, PsiError>;
