//! Commit certificates.

use crate::{Hash, VoteSet};
use serde::{Deserialize, Serialize};

/// A bundle of votes for one block that meets quorum.
///
/// Its presence certifies that a supermajority of the validator set saw the
/// block. Immutable once formed; quorum is checked by the producer against
/// the active validator set before construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitCertificate {
    /// The certified block.
    pub block_hash: Hash,
    /// The quorum of votes backing it.
    pub votes: VoteSet,
}

impl CommitCertificate {
    pub fn new(block_hash: Hash, votes: VoteSet) -> Self {
        CommitCertificate { block_hash, votes }
    }
}
