//! Block proposals.

use crate::{Block, CommitCertificate, ValidatorId};
use serde::{Deserialize, Serialize};

/// A proposer's block for an epoch.
///
/// Carries a copy of the commit certificate for the highest committed block
/// the proposer knows of, so peers that missed the certificate can catch up
/// from the proposal alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub block: Block,
    /// Must match the deterministic proposer for `block.header.epoch`.
    pub proposer: ValidatorId,
    pub commit_certificate: Option<CommitCertificate>,
}
