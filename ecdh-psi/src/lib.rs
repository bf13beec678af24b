//! # ECDH Private Set Intersection
//!
//! This library implements the masking engine of two-party Private Set
//! Intersection (PSI) using Elliptic Curve Diffie-Hellman: each party raises
//! the hash of every item to its own secret scalar, and because
//! exponentiation commutes, items both parties hold end up as identical
//! 128-bit tokens once each side has applied its scalar.
//!
//! ## Features
//!
//! - **Two curves**: Ristretto255 (curve25519-dalek, the default) and
//!   secp256k1 (k256, RFC 9380 hash-to-curve). The curve is a type parameter
//!   of the engine, so a run cannot mix them.
//! - **Points or bytes**: every operation has a point-typed form and an
//!   encoded-bytes form for transports that only move byte strings.
//! - **Parallel batches**: large batches are spread over the rayon pool;
//!   results always keep input order.
//! - **Index-exact errors**: a rejected peer point is reported with its
//!   position, and is never silently dropped.
//!
//! ## Protocol Overview
//!
//! 1. **Mask**: each party masks its items with
//!    [`EcdhPsi::mask_items_serialized`] and sends them to the peer.
//! 2. **Remask**: each party applies its own scalar to the peer's points with
//!    [`EcdhPsi::remask_and_finalize_serialized`], producing tokens.
//! 3. **Match**: one party sends its tokens to the other, which calls
//!    [`intersect`]. [`run_party`] drives all three steps over a
//!    [`Transport`].
//!
//! ## Example Usage
//!
//! ```
//! use ecdh_psi::{intersect, EcdhPsi, PsiError};
//!
//! let x = ["0", "1", "2", "3"];
//! let y = ["3", "4", "5", "6"];
//!
//! let alice = EcdhPsi::new()?;
//! let bob = EcdhPsi::new()?;
//!
//! // Step 1: each side masks its own items (these bytes cross the channel)
//! let x_points = alice.mask_items_serialized(&x)?;
//! let y_points = bob.mask_items_serialized(&y)?;
//!
//! // Step 2: each side remasks what it received
//! let y_final = alice.remask_and_finalize_serialized(&y_points)?;
//! let x_final = bob.remask_and_finalize_serialized(&x_points)?;
//!
//! // Step 3: match tokens
//! let result = intersect(&x_final, &y_final);
//! assert_eq!(result.pairs, vec![(3, 0)]);
//! # Ok::<(), PsiError>(())
//! ```
//!
//! ## Security Considerations
//!
//! - Semi-honest model only: both parties are assumed to follow the protocol.
//! - The channel carrying masked points MUST be confidential and
//!   authenticated (e.g. TLS); this crate neither encrypts nor authenticates.
//! - Use a fresh engine per run; the scalar is zeroed when the engine drops.
//! - Tokens are 128 bits; spurious matches are negligible for sets well
//!   under 2^32 items.
//!
//! ## Modules
//!
//! - [`curve`] - Curve abstraction and hash-to-curve
//! - `engine` - The masking engine
//! - `token` - Finalization hash
//! - `messages` - Wire messages
//! - `transport` - Transport seam
//! - `intersection` - Token matching
//! - `protocol` - Two-party driver
//! - `config` - Engine configuration
//! - `error` - Error types

pub use config::{CurveId, EngineConfig};
pub use curve::{MaskingCurve, Ristretto255, Secp256k1};
pub use engine::EcdhPsi;
pub use error::{PointError, PsiError, Result};
pub use intersection::{intersect, Intersection};
pub use messages::{MaskedPointsMessage, PsiMessage, TokensMessage};
pub use protocol::{run_party, Role};
pub use token::{finalize_to_token, Token};
pub use transport::{MemoryTransport, Transport};

mod config;
pub mod curve;
mod engine;
mod error;
mod intersection;
mod messages;
mod protocol;
mod token;
mod transport;

#[cfg(test)]
mod proptests;
