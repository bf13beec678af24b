//! Ristretto255 backend (curve25519-dalek).

use super::{MaskingCurve, SCALAR_ATTEMPTS};
use crate::config::CurveId;
use crate::error::{PointError, PsiError, Result};
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::traits::IsIdentity;
use curve25519_dalek::Scalar;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};
use zeroize::Zeroize;

const HASH_TO_CURVE_DST: &[u8] = b"ecdh-psi-v1:ristretto255_XMD:SHA-512_R255MAP_RO_";

/// The Ristretto prime-order group over Curve25519.
///
/// Points encode to 32 bytes. The all-zero encoding is the identity and is
/// rejected by [`decode`](MaskingCurve::decode).
#[derive(Debug, Default, Clone, Copy)]
pub struct Ristretto255;

impl MaskingCurve for Ristretto255 {
    type Point = RistrettoPoint;
    type Scalar = Scalar;

    const ID: CurveId = CurveId::Ristretto255;

    fn encode(&self, point: &RistrettoPoint) -> Vec<u8> {
        point.compress().to_bytes().to_vec()
    }

    fn decode(&self, bytes: &[u8]) -> std::result::Result<RistrettoPoint, PointError> {
        let compressed =
            CompressedRistretto::from_slice(bytes).map_err(|_| PointError::InvalidEncoding)?;
        let point = compressed.decompress().ok_or(PointError::InvalidEncoding)?;
        if point.is_identity() {
            return Err(PointError::Identity);
        }
        Ok(point)
    }

    fn is_identity(&self, point: &RistrettoPoint) -> bool {
        point.is_identity()
    }

    fn multiply(&self, point: &RistrettoPoint, scalar: &Scalar) -> RistrettoPoint {
        point * scalar
    }

    fn random_scalar<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> Result<Scalar> {
        let mut wide = [0u8; 64];
        for _ in 0..SCALAR_ATTEMPTS {
            rng.try_fill_bytes(&mut wide)
                .map_err(|e| PsiError::EntropyUnavailable(e.to_string()))?;
            let scalar = Scalar::from_bytes_mod_order_wide(&wide);
            wide.zeroize();
            if scalar != Scalar::ZERO {
                return Ok(scalar);
            }
        }
        Err(PsiError::EntropyUnavailable(
            "entropy source returned only zero scalars".to_string(),
        ))
    }

    fn hash_to_curve(&self, item: &[u8]) -> Result<RistrettoPoint> {
        // The counter only moves past zero if Elligator lands on the identity.
        for counter in 0..=u8::MAX {
            let hasher = Sha512::new()
                .chain_update(HASH_TO_CURVE_DST)
                .chain_update([counter])
                .chain_update(item);
            let point = RistrettoPoint::from_hash(hasher);
            if !point.is_identity() {
                return Ok(point);
            }
        }
        Err(PsiError::HashToCurve(
            "no non-identity ristretto point for item".to_string(),
        ))
    }
}
