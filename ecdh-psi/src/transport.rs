//! Transport seam between the two parties.
//!
//! The engine assumes an ordered, lossless, confidential and authenticated
//! point-to-point channel. Implementations own framing and security; this
//! crate only ships an in-process pair for tests and demos.

use crate::error::{PsiError, Result};
use crate::messages::PsiMessage;
use std::sync::mpsc::{channel, Receiver, Sender};

/// An ordered, reliable channel to exactly one peer.
pub trait Transport {
    /// Deliver `message` to the peer.
    ///
    /// # Errors
    /// Returns [`PsiError::Transport`] when the peer cannot be reached.
    fn send(&mut self, message: PsiMessage) -> Result<()>;

    /// Block until the next message from the peer arrives.
    ///
    /// # Errors
    /// Returns [`PsiError::Transport`] when the channel is closed or the
    /// bytes do not form a message.
    fn receive(&mut self) -> Result<PsiMessage>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, message: PsiMessage) -> Result<()> {
        (**self).send(message)
    }

    fn receive(&mut self) -> Result<PsiMessage> {
        (**self).receive()
    }
}

/// One end of an in-process channel.
#[derive(Debug)]
pub struct MemoryTransport {
    outgoing: Sender<PsiMessage>,
    incoming: Receiver<PsiMessage>,
}

impl MemoryTransport {
    /// Two connected endpoints.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = channel();
        let (b_tx, a_rx) = channel();
        (
            Self {
                outgoing: a_tx,
                incoming: a_rx,
            },
            Self {
                outgoing: b_tx,
                incoming: b_rx,
            },
        )
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, message: PsiMessage) -> Result<()> {
        self.outgoing
            .send(message)
            .map_err(|_| PsiError::Transport("peer endpoint dropped".to_string()))
    }

    fn receive(&mut self) -> Result<PsiMessage> {
        self.incoming
            .recv()
            .map_err(|_| PsiError::Transport("peer endpoint closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::TokensMessage;

    #[test]
    fn test_pair_delivers_in_order() {
        let (mut a, mut b) = MemoryTransport::pair();
        a.send(TokensMessage::new(vec![]).into()).unwrap();
        a.send(TokensMessage::new(vec![crate::Token(1)]).into()).unwrap();
        assert_eq!(b.receive().unwrap().into_tokens().unwrap().len(), 0);
        assert_eq!(b.receive().unwrap().into_tokens().unwrap().len(), 1);

        b.send(TokensMessage::new(vec![]).into()).unwrap();
        assert!(a.receive().is_ok());
    }

    #[test]
    fn test_closed_peer() {
        let (mut a, b) = MemoryTransport::pair();
        drop(b);
        assert!(matches!(
            a.send(TokensMessage::new(vec![]).into()),
            Err(PsiError::Transport(_))
        ));
        assert!(matches!(a.receive(), Err(PsiError::Transport(_))));
    }
}
