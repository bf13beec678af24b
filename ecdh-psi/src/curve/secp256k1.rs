//! secp256k1 backend (k256), RFC 9380 hash-to-curve.

use super::{MaskingCurve, SCALAR_ATTEMPTS};
use crate::config::CurveId;
use crate::error::{PointError, PsiError, Result};
use k256::elliptic_curve::group::Group;
use k256::elliptic_curve::hash2curve::{ExpandMsgXmd, GroupDigest};
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;
use zeroize::Zeroize;

const HASH_TO_CURVE_DST: &[u8] = b"ecdh-psi-v1:secp256k1_XMD:SHA-256_SSWU_RO_";
const COMPRESSED_LEN: usize = 33;

/// secp256k1 with compressed SEC1 point encoding (33 bytes).
#[derive(Debug, Default, Clone, Copy)]
pub struct Secp256k1;

impl MaskingCurve for Secp256k1 {
    type Point = ProjectivePoint;
    type Scalar = Scalar;

    const ID: CurveId = CurveId::Secp256k1;

    fn encode(&self, point: &ProjectivePoint) -> Vec<u8> {
        point.to_affine().to_encoded_point(true).as_bytes().to_vec()
    }

    fn decode(&self, bytes: &[u8]) -> std::result::Result<ProjectivePoint, PointError> {
        // The identity has no compressed form, so it fails the length check.
        if bytes.len() != COMPRESSED_LEN {
            return Err(PointError::InvalidEncoding);
        }
        let encoded = EncodedPoint::from_bytes(bytes).map_err(|_| PointError::InvalidEncoding)?;
        if !encoded.is_compressed() {
            return Err(PointError::InvalidEncoding);
        }
        let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .ok_or(PointError::InvalidEncoding)?;
        let point = ProjectivePoint::from(affine);
        if self.is_identity(&point) {
            return Err(PointError::Identity);
        }
        Ok(point)
    }

    fn is_identity(&self, point: &ProjectivePoint) -> bool {
        bool::from(point.is_identity())
    }

    fn multiply(&self, point: &ProjectivePoint, scalar: &Scalar) -> ProjectivePoint {
        point * scalar
    }

    fn random_scalar<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> Result<Scalar> {
        // Rejection sampling: the group order is within 2^-127 of 2^256.
        let mut bytes = [0u8; 32];
        for _ in 0..SCALAR_ATTEMPTS {
            rng.try_fill_bytes(&mut bytes)
                .map_err(|e| PsiError::EntropyUnavailable(e.to_string()))?;
            let candidate = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(bytes)));
            bytes.zeroize();
            match candidate {
                Some(scalar) if !bool::from(scalar.is_zero()) => return Ok(scalar),
                _ => continue,
            }
        }
        Err(PsiError::EntropyUnavailable(
            "entropy source returned no usable secp256k1 scalar".to_string(),
        ))
    }

    fn hash_to_curve(&self, item: &[u8]) -> Result<ProjectivePoint> {
        let dst: &[&[u8]] = &[HASH_TO_CURVE_DST];
        for counter in 0..=u8::MAX {
            let prefix = [counter];
            let msg: &[&[u8]] = &[&prefix[..], item];
            let point = k256::Secp256k1::hash_from_bytes::<ExpandMsgXmd<Sha256>>(msg, dst)
                .map_err(|e| PsiError::HashToCurve(e.to_string()))?;
            if !self.is_identity(&point) {
                return Ok(point);
            }
        }
        Err(PsiError::HashToCurve(
            "no non-identity secp256k1 point for item".to_string(),
        ))
    }
}
