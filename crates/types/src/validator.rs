//! Validators and the quorum predicate.

use crate::{ValidatorId, VoteSet};
use serde::{Deserialize, Serialize};

/// A validator: identity plus voting weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub id: ValidatorId,
    pub voting_power: u64,
}

impl Validator {
    /// Create a validator. Voting power must be positive.
    pub fn new(id: impl Into<ValidatorId>, voting_power: u64) -> Self {
        assert!(voting_power > 0, "validator voting power must be positive");
        Validator {
            id: id.into(),
            voting_power,
        }
    }
}

/// An ordered, immutable set of validators.
///
/// The order is significant: proposer rotation indexes into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSet {
    validators: Vec<Validator>,
}

impl ValidatorSet {
    pub fn new(validators: Vec<Validator>) -> Self {
        ValidatorSet { validators }
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Validator> {
        self.validators.get(index)
    }

    pub fn contains(&self, id: &ValidatorId) -> bool {
        self.validators.iter().any(|v| &v.id == id)
    }

    /// Voting power of a validator, 0 if not a member.
    pub fn voting_power_of(&self, id: &ValidatorId) -> u64 {
        self.validators
            .iter()
            .find(|v| &v.id == id)
            .map(|v| v.voting_power)
            .unwrap_or(0)
    }

    pub fn total_voting_power(&self) -> u64 {
        self.validators.iter().map(|v| v.voting_power).sum()
    }

    /// The BFT quorum predicate: true iff the voters in `votes` hold
    /// strictly more than 2/3 of the set's total voting power.
    ///
    /// Voters outside the set contribute nothing.
    pub fn has_majority(&self, votes: &VoteSet) -> bool {
        let power: u64 = votes.voters().map(|id| self.voting_power_of(id)).sum();
        3 * power > 2 * self.total_voting_power()
    }
}
