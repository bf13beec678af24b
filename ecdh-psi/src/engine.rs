//! The masking engine.
//!
//! An [`EcdhPsi`] owns one private scalar `k` for the lifetime of a protocol
//! run. Masking an item `x` computes `H(x)^k`; remasking a peer point `P`
//! computes `P^k` and reduces it to a [`Token`]. Because exponentiation
//! commutes, an item held by both parties yields the same token on both
//! sides.

use crate::config::{CurveId, EngineConfig};
use crate::curve::{MaskingCurve, Ristretto255};
use crate::error::{PointError, PsiError, Result};
use crate::token::{finalize_to_token, Token};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use std::fmt;
use tracing::{debug, instrument, warn};
use zeroize::Zeroize;

/// Private scalar of one engine. Zeroed on drop and never printed.
struct PrivateScalar<S: Zeroize>(S);

impl<S: Zeroize> Drop for PrivateScalar<S> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<S: Zeroize> fmt::Debug for PrivateScalar<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateScalar(<redacted>)")
    }
}

/// One party's ECDH-PSI masking engine.
///
/// Each party builds its own engine per run. The engine is immutable after
/// construction, so it can be shared across threads and used for any number
/// of batches.
#[derive(Debug)]
pub struct EcdhPsi<C: MaskingCurve = Ristretto255> {
    curve: C,
    secret: PrivateScalar<C::Scalar>,
    config: EngineConfig,
}

impl EcdhPsi<Ristretto255> {
    /// Create a Ristretto255 engine with a fresh scalar from the OS.
    ///
    /// # Errors
    /// Returns `PsiError::EntropyUnavailable` if the OS RNG fails.
    pub fn new() -> Result<Self> {
        Self::with_config(EngineConfig::default())
    }
}

impl<C: MaskingCurve> EcdhPsi<C> {
    /// Create an engine on curve `C` with a fresh scalar from the OS.
    ///
    /// # Errors
    /// Returns `PsiError::InvalidConfig` for an unusable config and
    /// `PsiError::EntropyUnavailable` if the OS RNG fails.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        Self::from_rng(config, &mut OsRng)
    }

    /// Create an engine drawing its scalar from `rng`.
    pub fn from_rng<R: RngCore + CryptoRng + ?Sized>(config: EngineConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let curve = C::default();
        let secret = PrivateScalar(curve.random_scalar(rng)?);
        debug!(curve = %C::ID, parallel = config.parallel, "created ecdh-psi engine");
        Ok(Self {
            curve,
            secret,
            config,
        })
    }

    /// Identifier of the curve this engine masks on.
    pub fn curve_id(&self) -> CurveId {
        C::ID
    }

    /// The curve backend.
    pub fn curve(&self) -> &C {
        &self.curve
    }

    /// The configuration the engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mask each item: `HashToCurve(item) * k`, index for index.
    #[instrument(level = "debug", skip_all, fields(curve = %C::ID, count = items.len()))]
    pub fn mask_items<I>(&self, items: &[I]) -> Result<Vec<C::Point>>
    where
        I: AsRef<[u8]> + Sync,
    {
        self.map_batch(items, |_, item| self.mask_one(item.as_ref()))
            .into_iter()
            .collect()
    }

    /// Like [`mask_items`](Self::mask_items), writing into a pre-sized buffer.
    ///
    /// # Errors
    /// Returns `PsiError::LengthMismatch` if `out.len() != items.len()`.
    pub fn mask_items_into<I>(&self, items: &[I], out: &mut [C::Point]) -> Result<()>
    where
        I: AsRef<[u8]> + Sync,
    {
        check_len(items.len(), out.len())?;
        let masked = self.mask_items(items)?;
        out.copy_from_slice(&masked);
        Ok(())
    }

    /// Mask each item and encode it for the wire.
    #[instrument(level = "debug", skip_all, fields(curve = %C::ID, count = items.len()))]
    pub fn mask_items_serialized<I>(&self, items: &[I]) -> Result<Vec<Vec<u8>>>
    where
        I: AsRef<[u8]> + Sync,
    {
        self.map_batch(items, |_, item| {
            self.mask_one(item.as_ref())
                .map(|point| self.curve.encode(&point))
        })
        .into_iter()
        .collect()
    }

    /// Remask peer points with `k` and reduce each to a token.
    ///
    /// # Errors
    /// Returns `PsiError::InvalidPoint` naming the lowest index holding the
    /// identity.
    #[instrument(level = "debug", skip_all, fields(curve = %C::ID, count = points.len()))]
    pub fn remask_and_finalize(&self, points: &[C::Point]) -> Result<Vec<Token>> {
        self.map_batch(points, |index, point| self.finalize_one(index, point))
            .into_iter()
            .collect()
    }

    /// Like [`remask_and_finalize`](Self::remask_and_finalize), writing into a
    /// pre-sized buffer. `out` is left untouched on error.
    pub fn remask_and_finalize_into(&self, points: &[C::Point], out: &mut [Token]) -> Result<()> {
        check_len(points.len(), out.len())?;
        let tokens = self.remask_and_finalize(points)?;
        out.copy_from_slice(&tokens);
        Ok(())
    }

    /// Decode, remask and finalize encoded peer points, failing fast.
    ///
    /// Every entry is still checked; the error names the lowest bad index.
    pub fn remask_and_finalize_serialized<B>(&self, points: &[B]) -> Result<Vec<Token>>
    where
        B: AsRef<[u8]> + Sync,
    {
        self.remask_and_finalize_serialized_each(points)
            .into_iter()
            .collect()
    }

    /// Decode, remask and finalize encoded peer points, one result per entry.
    ///
    /// A bad entry yields `PsiError::InvalidPoint` at its own index and does
    /// not affect the tokens of the other entries.
    #[instrument(level = "debug", skip_all, fields(curve = %C::ID, count = points.len()))]
    pub fn remask_and_finalize_serialized_each<B>(&self, points: &[B]) -> Vec<Result<Token>>
    where
        B: AsRef<[u8]> + Sync,
    {
        self.map_batch(points, |index, bytes| {
            let point = self
                .curve
                .decode(bytes.as_ref())
                .map_err(|source| reject(index, source))?;
            self.finalize_one(index, &point)
        })
    }

    fn mask_one(&self, item: &[u8]) -> Result<C::Point> {
        let point = self.curve.hash_to_curve(item)?;
        Ok(self.curve.multiply(&point, &self.secret.0))
    }

    fn finalize_one(&self, index: usize, point: &C::Point) -> Result<Token> {
        if self.curve.is_identity(point) {
            return Err(reject(index, PointError::Identity));
        }
        let remasked = self.curve.multiply(point, &self.secret.0);
        Ok(finalize_to_token(&self.curve.encode(&remasked)))
    }

    /// Apply `f` to every entry, in parallel when the config allows it.
    /// Output order always matches input order.
    fn map_batch<T, U, F>(&self, inputs: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(usize, &T) -> U + Sync + Send,
    {
        if self.config.runs_parallel(inputs.len()) {
            inputs
                .par_iter()
                .enumerate()
                .map(|(index, input)| f(index, input))
                .collect()
        } else {
            inputs
                .iter()
                .enumerate()
                .map(|(index, input)| f(index, input))
                .collect()
        }
    }
}

fn reject(index: usize, source: PointError) -> PsiError {
    warn!(index, %source, "rejected peer point");
    PsiError::invalid_point(index, source)
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(PsiError::LengthMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::test_rng::FailingRng;
    use crate::curve::Secp256k1;
    use curve25519_dalek::ristretto::RistrettoPoint;
    use curve25519_dalek::traits::Identity;

    fn items(range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_engine_new() {
        let engine = EcdhPsi::new().unwrap();
        assert_eq!(engine.curve_id(), CurveId::Ristretto255);
        assert_eq!(engine.config(), &EngineConfig::default());
    }

    #[test]
    fn test_engine_debug_redacts_scalar() {
        let engine = EcdhPsi::new().unwrap();
        let debug = format!("{engine:?}");
        assert!(debug.contains("PrivateScalar(<redacted>)"));
    }

    #[test]
    fn test_engine_entropy_unavailable() {
        let result = EcdhPsi::<Ristretto255>::from_rng(EngineConfig::default(), &mut FailingRng);
        assert!(matches!(result, Err(PsiError::EntropyUnavailable(_))));
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let config = EngineConfig {
            parallel: true,
            parallel_threshold: 0,
        };
        assert!(matches!(
            EcdhPsi::<Ristretto255>::with_config(config),
            Err(PsiError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_engines_have_independent_scalars() {
        let alice = EcdhPsi::new().unwrap();
        let bob = EcdhPsi::new().unwrap();
        assert_ne!(
            alice.mask_items(&["x"]).unwrap(),
            bob.mask_items(&["x"]).unwrap()
        );
    }

    #[test]
    fn test_mask_items_one_to_one() {
        let engine = EcdhPsi::new().unwrap();
        let input = items(0..5);
        let masked = engine.mask_items(&input).unwrap();
        assert_eq!(masked.len(), input.len());
        assert_eq!(masked, engine.mask_items(&input).unwrap());
        assert!(engine.mask_items::<&[u8]>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_mask_items_empty_item() {
        let engine = EcdhPsi::new().unwrap();
        let masked = engine.mask_items(&[b""]).unwrap();
        assert_eq!(masked.len(), 1);
        assert!(!engine.curve().is_identity(&masked[0]));
    }

    #[test]
    fn test_mask_items_serialized_matches_points() {
        let engine = EcdhPsi::new().unwrap();
        let input = items(0..4);
        let points = engine.mask_items(&input).unwrap();
        let bytes = engine.mask_items_serialized(&input).unwrap();
        for (point, encoded) in points.iter().zip(&bytes) {
            assert_eq!(encoded.len(), 32);
            assert_eq!(&engine.curve().encode(point), encoded);
            assert_eq!(&engine.curve().decode(encoded).unwrap(), point);
        }
    }

    #[test]
    fn test_mask_items_into() {
        let engine = EcdhPsi::new().unwrap();
        let input = items(0..3);
        let mut out = vec![RistrettoPoint::identity(); 3];
        engine.mask_items_into(&input, &mut out).unwrap();
        assert_eq!(out, engine.mask_items(&input).unwrap());

        let mut short = vec![RistrettoPoint::identity(); 2];
        assert_eq!(
            engine.mask_items_into(&input, &mut short),
            Err(PsiError::LengthMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_remask_and_finalize_rejects_identity() {
        let alice = EcdhPsi::new().unwrap();
        let bob = EcdhPsi::new().unwrap();
        let mut points = bob.mask_items(&items(0..4)).unwrap();
        points[2] = RistrettoPoint::identity();

        let err = alice.remask_and_finalize(&points).unwrap_err();
        assert_eq!(err, PsiError::invalid_point(2, PointError::Identity));
    }

    #[test]
    fn test_remask_and_finalize_into() {
        let alice = EcdhPsi::new().unwrap();
        let bob = EcdhPsi::new().unwrap();
        let points = bob.mask_items(&items(0..4)).unwrap();

        let mut out = vec![Token(0); 4];
        alice.remask_and_finalize_into(&points, &mut out).unwrap();
        assert_eq!(out, alice.remask_and_finalize(&points).unwrap());

        let mut long = vec![Token(0); 5];
        assert!(matches!(
            alice.remask_and_finalize_into(&points, &mut long),
            Err(PsiError::LengthMismatch {
                expected: 4,
                actual: 5
            })
        ));
        assert!(long.iter().all(|token| *token == Token(0)));
    }

    #[test]
    fn test_serialized_matches_point_typed() {
        let alice = EcdhPsi::new().unwrap();
        let bob = EcdhPsi::new().unwrap();
        let input = items(0..6);
        let points = bob.mask_items(&input).unwrap();
        let bytes = bob.mask_items_serialized(&input).unwrap();
        assert_eq!(
            alice.remask_and_finalize(&points).unwrap(),
            alice.remask_and_finalize_serialized(&bytes).unwrap()
        );
    }

    #[test]
    fn test_serialized_fail_fast_reports_lowest_index() {
        let alice = EcdhPsi::new().unwrap();
        let bob = EcdhPsi::new().unwrap();
        let mut bytes = bob.mask_items_serialized(&items(0..5)).unwrap();
        bytes[1] = vec![0u8; 32];
        bytes[3] = vec![0xffu8; 7];

        let err = alice.remask_and_finalize_serialized(&bytes).unwrap_err();
        assert_eq!(err, PsiError::invalid_point(1, PointError::Identity));
        assert_eq!(err.index(), Some(1));
    }

    #[test]
    fn test_serialized_each_keeps_valid_entries() {
        let alice = EcdhPsi::new().unwrap();
        let bob = EcdhPsi::new().unwrap();
        let input = items(0..5);
        let valid = bob.mask_items_serialized(&input).unwrap();
        let expected = alice.remask_and_finalize_serialized(&valid).unwrap();

        let mut bytes = valid.clone();
        bytes[0] = vec![0xffu8; 32];
        bytes[4] = vec![];
        let results = alice.remask_and_finalize_serialized_each(&bytes);

        assert_eq!(results.len(), 5);
        assert_eq!(
            results[0],
            Err(PsiError::invalid_point(0, PointError::InvalidEncoding))
        );
        assert_eq!(
            results[4],
            Err(PsiError::invalid_point(4, PointError::InvalidEncoding))
        );
        for i in 1..4 {
            assert_eq!(results[i], Ok(expected[i]), "entry {i} should be unaffected");
        }
    }

    #[test]
    fn test_commutativity_both_orders() {
        let alice = EcdhPsi::new().unwrap();
        let bob = EcdhPsi::new().unwrap();
        let input = items(0..8);

        let alice_tokens = alice
            .remask_and_finalize(&bob.mask_items(&input).unwrap())
            .unwrap();
        let bob_tokens = bob
            .remask_and_finalize(&alice.mask_items(&input).unwrap())
            .unwrap();
        assert_eq!(alice_tokens, bob_tokens);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let mut rng = OsRng;
        let parallel = EngineConfig {
            parallel: true,
            parallel_threshold: 1,
        };
        let alice = EcdhPsi::<Ristretto255>::from_rng(parallel, &mut rng).unwrap();
        let bob = EcdhPsi::<Ristretto255>::from_rng(EngineConfig::sequential(), &mut rng).unwrap();
        let input = items(0..200);

        let via_parallel = bob
            .remask_and_finalize_serialized(&alice.mask_items_serialized(&input).unwrap())
            .unwrap();
        let via_sequential = alice
            .remask_and_finalize_serialized(&bob.mask_items_serialized(&input).unwrap())
            .unwrap();
        assert_eq!(via_parallel, via_sequential);
    }

    #[test]
    fn test_secp256k1_engine() {
        let alice = EcdhPsi::<Secp256k1>::with_config(EngineConfig::default()).unwrap();
        let bob = EcdhPsi::<Secp256k1>::with_config(EngineConfig::default()).unwrap();
        assert_eq!(alice.curve_id(), CurveId::Secp256k1);

        let x = items(0..4);
        let y = items(3..7);
        let x_bytes = alice.mask_items_serialized(&x).unwrap();
        let y_bytes = bob.mask_items_serialized(&y).unwrap();
        assert_eq!(alice.curve().encoded_len(), 33);
        assert!(x_bytes.iter().all(|b| b.len() == alice.curve().encoded_len()));

        let x_final = bob.remask_and_finalize_serialized(&x_bytes).unwrap();
        let y_final = alice.remask_and_finalize_serialized(&y_bytes).unwrap();
        assert_eq!(x_final[3], y_final[0]);
        assert!(!y_final.contains(&x_final[0]));
    }

    #[test]
    fn test_cross_curve_bytes_rejected() {
        let ristretto = EcdhPsi::new().unwrap();
        let secp = EcdhPsi::<Secp256k1>::with_config(EngineConfig::default()).unwrap();
        let bytes = ristretto.mask_items_serialized(&["a"]).unwrap();
        assert_eq!(
            secp.remask_and_finalize_serialized(&bytes),
            Err(PsiError::invalid_point(0, PointError::InvalidEncoding))
        );
    }
}
