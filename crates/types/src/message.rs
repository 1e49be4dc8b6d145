//! Consensus message types and the broadcast envelope.

use crate::{Block, CommitCertificate, Proposal, Vote};
use serde::{Deserialize, Serialize};

/// Logical broadcast channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelId {
    /// Reserved for header sync.
    Header,
    /// Proposals, blocks, and commit certificates.
    Block,
    /// Votes.
    Vote,
}

/// All message kinds the engine consumes from its incoming queue.
///
/// Messages are **passive data** — they describe something that arrived.
/// The engine dispatches on the tag; an unknown kind is a programming error,
/// not a runtime case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusMessage {
    Proposal(Proposal),
    Vote(Vote),
    Block(Block),
    CommitCertificate(CommitCertificate),
}

impl ConsensusMessage {
    /// The channel this message travels on.
    pub fn channel(&self) -> ChannelId {
        match self {
            ConsensusMessage::Vote(_) => ChannelId::Vote,
            ConsensusMessage::Proposal(_)
            | ConsensusMessage::Block(_)
            | ConsensusMessage::CommitCertificate(_) => ChannelId::Block,
        }
    }

    /// The message kind name for telemetry.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConsensusMessage::Proposal(_) => "Proposal",
            ConsensusMessage::Vote(_) => "Vote",
            ConsensusMessage::Block(_) => "Block",
            ConsensusMessage::CommitCertificate(_) => "CommitCertificate",
        }
    }
}

/// The broadcast envelope handed to the network layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMessage {
    pub channel: ChannelId,
    pub content: ConsensusMessage,
}

impl NetworkMessage {
    /// Wrap a message, deriving its channel.
    pub fn new(content: ConsensusMessage) -> Self {
        NetworkMessage {
            channel: content.channel(),
            content,
        }
    }
}
