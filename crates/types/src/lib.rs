//! Core types for Kestrel consensus.
//!
//! This crate provides the foundational types used throughout the consensus
//! implementation:
//!
//! - **Primitives**: Hash, validator identifiers
//! - **Consensus types**: Block, ExtendedBlock, Vote, VoteSet,
//!   CommitCertificate, Proposal
//! - **Network types**: message channels, the broadcast envelope, and the
//!   [`Network`] trait consumed by the engine
//!
//! # Design Philosophy
//!
//! This crate is self-contained with minimal dependencies. It does not depend
//! on any other workspace crates, making it the foundation layer.

mod block;
mod certificate;
mod hash;
mod identifiers;
mod message;
mod network;
mod proposal;
mod validator;
mod vote;

pub use block::{Block, BlockHeader, ExtendedBlock};
pub use certificate::CommitCertificate;
pub use hash::{Hash, HexError};
pub use identifiers::ValidatorId;
pub use message::{ChannelId, ConsensusMessage, NetworkMessage};
pub use network::Network;
pub use proposal::Proposal;
pub use validator::{Validator, ValidatorSet};
pub use vote::{Vote, VoteSet};
