//! Two-party protocol driver.
//!
//! Message order is fixed by role so that no party ever writes while its
//! peer is also writing; a transport with bounded (or zero) buffering
//! cannot deadlock.
//!
//! | step | [`Role::Receiver`]            | [`Role::Sender`]                  |
//! |------|-------------------------------|-----------------------------------|
//! | 1    | send own masked points        | receive receiver's masked points  |
//! | 2    | receive sender's masked points| send own masked points            |
//! | 3    | receive tokens of own items   | send tokens of receiver's points  |
//!
//! The sender learns nothing. The receiver remasks the sender's points and
//! matches them against the tokens of its own items to learn which of its
//! items the sender also holds.

use crate::curve::MaskingCurve;
use crate::engine::EcdhPsi;
use crate::error::{PsiError, Result};
use crate::intersection::{intersect, Intersection};
use crate::messages::{MaskedPointsMessage, TokensMessage};
use crate::transport::Transport;
use tracing::{info, instrument};

/// Which side of the run learns the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Learns the intersection, indexed by its own items.
    Receiver,
    /// Helps the receiver and learns nothing.
    Sender,
}

/// Run one party of the protocol over `transport`.
///
/// Returns `Some(intersection)` for the receiver and `None` for the sender.
///
/// # Errors
/// Fails on any invalid peer point, a curve or length mismatch, an
/// out-of-order message, or a transport failure.
#[instrument(level = "info", skip_all, fields(curve = %C::ID, ?role, items = items.len()))]
pub fn run_party<C, I, T>(
    engine: &EcdhPsi<C>,
    items: &[I],
    role: Role,
    mut transport: T,
) -> Result<Option<Intersection>>
where
    C: MaskingCurve,
    I: AsRef<[u8]> + Sync,
    T: Transport,
{
    match role {
        Role::Sender => {
            run_sender(engine, items, &mut transport)?;
            Ok(None)
        }
        Role::Receiver => run_receiver(engine, items, &mut transport).map(Some),
    }
}

fn run_sender<C, I, T>(engine: &EcdhPsi<C>, items: &[I], transport: &mut T) -> Result<()>
where
    C: MaskingCurve,
    I: AsRef<[u8]> + Sync,
    T: Transport,
{
    let peer = receive_masked_points::<C, T>(transport)?;
    // Reject a bad batch before revealing anything of our own.
    let peer_tokens = engine.remask_and_finalize_serialized(&peer.points)?;

    let masked = engine.mask_items_serialized(items)?;
    transport.send(MaskedPointsMessage::new(C::ID, masked).into())?;
    transport.send(TokensMessage::new(peer_tokens).into())?;
    info!(peer_items = peer.len(), "sent tokens to receiver");
    Ok(())
}

fn run_receiver<C, I, T>(engine: &EcdhPsi<C>, items: &[I], transport: &mut T) -> Result<Intersection>
where
    C: MaskingCurve,
    I: AsRef<[u8]> + Sync,
    T: Transport,
{
    let masked = engine.mask_items_serialized(items)?;
    transport.send(MaskedPointsMessage::new(C::ID, masked).into())?;

    let peer = receive_masked_points::<C, T>(transport)?;
    let own = transport.receive()?.into_tokens()?;
    if own.len() != items.len() {
        return Err(PsiError::LengthMismatch {
            expected: items.len(),
            actual: own.len(),
        });
    }

    let peer_tokens = engine.remask_and_finalize_serialized(&peer.points)?;
    let intersection = intersect(&own.tokens, &peer_tokens);
    info!(
        peer_items = peer.len(),
        matches = intersection.len(),
        "computed intersection"
    );
    Ok(intersection)
}

fn receive_masked_points<C: MaskingCurve, T: Transport>(transport: &mut T) -> Result<MaskedPointsMessage> {
    let peer = transport.receive()?.into_masked_points()?;
    peer.ensure_curve(C::ID)?;
    Ok(peer)
}
