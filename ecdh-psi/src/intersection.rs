//! Matching two token sequences.

use crate::token::Token;
use std::collections::HashMap;

/// Matched index pairs, ordered by local index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intersection {
    /// `(local_index, peer_index)` for every local token the peer also holds
    pub pairs: Vec<(usize, usize)>,
}

impl Intersection {
    /// Local indices of matched items, ascending.
    pub fn local_indices(&self) -> Vec<usize> {
        self.pairs.iter().map(|(local, _)| *local).collect()
    }

    /// Peer indices, in local-index order.
    pub fn peer_indices(&self) -> Vec<usize> {
        self.pairs.iter().map(|(_, peer)| *peer).collect()
    }

    /// Returns the number of matches.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if nothing matched.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Pair every local token with the first peer position holding the same
/// token. Duplicated local tokens each produce a pair.
pub fn intersect(local: &[Token], peer: &[Token]) -> Intersection {
    let mut positions: HashMap<Token, usize> = HashMap::with_capacity(peer.len());
    for (index, token) in peer.iter().enumerate() {
        positions.entry(*token).or_insert(index);
    }

    let pairs = local
        .iter()
        .enumerate()
        .filter_map(|(index, token)| positions.get(token).map(|peer_index| (index, *peer_index)))
        .collect();
    Intersection { pairs }
}
