//! Engine configuration.
//!
//! Both types deserialize with `serde`, and missing fields fall back to
//! their defaults, so a partial document such as `{"parallel": false}` is a
//! complete configuration.

use crate::error::{PsiError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Curves an engine can be bound to.
///
/// Both parties of a run must use the same curve; the choice is announced in
/// every [`MaskedPointsMessage`](crate::MaskedPointsMessage).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveId {
    /// Ristretto prime-order group over Curve25519.
    #[default]
    Ristretto255,
    /// secp256k1 with RFC 9380 hash-to-curve.
    Secp256k1,
}

impl CurveId {
    /// Length in bytes of an encoded point on this curve.
    pub const fn encoded_len(self) -> usize {
        match self {
            CurveId::Ristretto255 => 32,
            CurveId::Secp256k1 => 33,
        }
    }

    /// Lowercase name used in configuration files and on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            CurveId::Ristretto255 => "ristretto255",
            CurveId::Secp256k1 => "secp256k1",
        }
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurveId {
    type Err = PsiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ristretto255" => Ok(CurveId::Ristretto255),
            "secp256k1" => Ok(CurveId::Secp256k1),
            other => Err(PsiError::InvalidConfig(format!("unknown curve: {other}"))),
        }
    }
}

/// Batch scheduling knobs for an [`EcdhPsi`](crate::EcdhPsi) engine.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Spread batches over the rayon thread pool.
    pub parallel: bool,
    /// Batches shorter than this run on the calling thread.
    pub parallel_threshold: usize,
}

impl EngineConfig {
    pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

    /// Configuration that never leaves the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    /// Returns `PsiError::InvalidConfig` if `parallel_threshold` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.parallel_threshold == 0 {
            return Err(PsiError::InvalidConfig(
                "parallel_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn runs_parallel(&self, batch_len: usize) -> bool {
        self.parallel && batch_len >= self.parallel_threshold
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: Self::DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}
