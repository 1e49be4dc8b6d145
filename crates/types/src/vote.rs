//! Votes and vote aggregation.

use crate::{BlockHeader, ValidatorId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A vote cast by a validator in an epoch.
///
/// `block == None` is a nil-vote: it signals participation in the epoch
/// without endorsing a new block, keeping the epoch-advancement path live
/// when the proposer is silent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Header of the endorsed block, or `None` for a nil-vote.
    pub block: Option<BlockHeader>,
    /// The voting validator.
    pub voter: ValidatorId,
    /// Epoch the vote was cast in.
    pub epoch: u64,
}

impl Vote {
    pub fn is_nil(&self) -> bool {
        self.block.is_none()
    }
}

/// A set of votes keyed by voter.
///
/// At most one vote per voter: re-inserting for the same voter replaces the
/// previous vote (last-writer-wins). Iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSet {
    votes: BTreeMap<ValidatorId, Vote>,
}

impl VoteSet {
    pub fn new() -> Self {
        VoteSet::default()
    }

    /// Insert a vote, replacing any prior vote from the same voter.
    pub fn add_vote(&mut self, vote: Vote) {
        self.votes.insert(vote.voter.clone(), vote);
    }

    pub fn contains(&self, voter: &ValidatorId) -> bool {
        self.votes.contains_key(voter)
    }

    pub fn get(&self, voter: &ValidatorId) -> Option<&Vote> {
        self.votes.get(voter)
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Votes in deterministic (voter id) order.
    pub fn votes(&self) -> impl Iterator<Item = &Vote> {
        self.votes.values()
    }

    /// Voter ids in deterministic order.
    pub fn voters(&self) -> impl Iterator<Item = &ValidatorId> {
        self.votes.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Block, Hash};

    fn block_vote(voter: &str, epoch: u64, payload: u8) -> Vote {
        let block = Block::new("test", epoch, 1, Hash::ZERO, vec![payload]);
        Vote {
            block: Some(block.header),
            voter: ValidatorId::from(voter),
            epoch,
        }
    }

    #[test]
    fn duplicate_voter_counts_once() {
        let mut set = VoteSet::new();
        set.add_vote(block_vote("a", 0, 1));
        set.add_vote(block_vote("a", 0, 1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn reinsert_replaces_prior_vote() {
        let mut set = VoteSet::new();
        set.add_vote(block_vote("a", 0, 1));
        let second = block_vote("a", 0, 2);
        set.add_vote(second.clone());

        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&ValidatorId::from("a")), Some(&second));
    }

    #[test]
    fn nil_vote_has_no_block() {
        let vote = Vote {
            block: None,
            voter: ValidatorId::from("a"),
            epoch: 3,
        };
        assert!(vote.is_nil());
        assert!(!block_vote("a", 0, 1).is_nil());
    }
}
