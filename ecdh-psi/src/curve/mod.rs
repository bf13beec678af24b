//! Curve abstraction and hash-to-curve.
//!
//! A [`MaskingCurve`] is the only place group arithmetic happens. Engines are
//! generic over it, so the curve for a run is fixed when the engine type is
//! chosen and every call is statically dispatched.

mod ristretto;
mod secp256k1;

pub use ristretto::Ristretto255;
pub use secp256k1::Secp256k1;

use crate::config::CurveId;
use crate::error::{PointError, Result};
use rand::{CryptoRng, RngCore};
use std::fmt;
use zeroize::Zeroize;

/// How many fresh draws a backend makes before giving up on a non-zero scalar.
pub(crate) const SCALAR_ATTEMPTS: usize = 8;

/// A prime-order group with a fixed-width encoding and a hash-to-curve map.
///
/// Implementations must use constant-time scalar multiplication; the
/// private scalar is the only secret that ever reaches this trait.
pub trait MaskingCurve: Default + fmt::Debug + Send + Sync + 'static {
    /// Group element.
    type Point: Copy + Eq + fmt::Debug + Send + Sync;
    /// Element of the scalar field.
    type Scalar: Zeroize + Send + Sync;

    /// Identifier announced to the peer.
    const ID: CurveId;

    /// Canonical fixed-length encoding of `point`.
    fn encode(&self, point: &Self::Point) -> Vec<u8>;

    /// Decode a point, rejecting malformed bytes and the identity.
    fn decode(&self, bytes: &[u8]) -> std::result::Result<Self::Point, PointError>;

    /// Whether `point` is the group identity.
    fn is_identity(&self, point: &Self::Point) -> bool;

    /// Scalar multiplication (the masking exponentiation).
    fn multiply(&self, point: &Self::Point, scalar: &Self::Scalar) -> Self::Point;

    /// Uniform non-zero scalar drawn from `rng`.
    ///
    /// # Errors
    /// Returns `PsiError::EntropyUnavailable` if `rng` fails.
    fn random_scalar<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> Result<Self::Scalar>;

    /// Deterministic map from `item` to a non-identity point.
    fn hash_to_curve(&self, item: &[u8]) -> Result<Self::Point>;

    /// Length of [`encode`](Self::encode) output.
    fn encoded_len(&self) -> usize {
        Self::ID.encoded_len()
    }
}
