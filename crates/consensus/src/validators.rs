//! Proposer election.

use kestrel_types::{Validator, ValidatorSet};

/// Deterministic validator rotation policy.
///
/// `proposer_for_epoch` must be a pure function of `(epoch, validator set)`
/// that every node agrees on. The validator set is parameterized by epoch to
/// leave room for validator-set changes at commit boundaries; the rotating
/// implementation below serves one static set for every epoch.
pub trait ValidatorManager: Send + Sync {
    /// The proposer slot for an epoch.
    fn proposer_for_epoch(&self, epoch: u64) -> &Validator;

    /// The active validator set for an epoch.
    fn validator_set_for_epoch(&self, epoch: u64) -> &ValidatorSet;
}

/// Round-robin rotation over a static validator set.
pub struct RotatingValidatorManager {
    validators: ValidatorSet,
}

impl RotatingValidatorManager {
    pub fn new(validators: ValidatorSet) -> Self {
        assert!(
            !validators.is_empty(),
            "validator set must not be empty"
        );
        Self { validators }
    }
}

impl ValidatorManager for RotatingValidatorManager {
    fn proposer_for_epoch(&self, epoch: u64) -> &Validator {
        let index = (epoch % self.validators.len() as u64) as usize;
        self.validators.get(index).expect("index is reduced mod len")
    }

    fn validator_set_for_epoch(&self, _epoch: u64) -> &ValidatorSet {
        &self.validators
    }
}
