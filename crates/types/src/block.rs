//! Block and block header types.

use crate::{CommitCertificate, Hash};
use serde::{Deserialize, Serialize};

/// Consensus metadata for a block.
///
/// The `hash` field is a content hash over the remaining fields plus the
/// block payload, so block identity is stable under replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Chain this block belongs to.
    pub chain_id: String,
    /// Epoch in which the block was proposed.
    pub epoch: u64,
    /// Position in the chain; parent height + 1.
    pub height: u64,
    /// Hash of the parent block.
    pub parent: Hash,
    /// Content hash identifying this block.
    pub hash: Hash,
}

/// A block: consensus header plus an opaque payload.
///
/// Transaction semantics are outside the consensus core; the payload is
/// carried and hashed but never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub payload: Vec<u8>,
}

impl Block {
    /// Build a block, computing its content hash.
    pub fn new(
        chain_id: impl Into<String>,
        epoch: u64,
        height: u64,
        parent: Hash,
        payload: Vec<u8>,
    ) -> Self {
        let chain_id = chain_id.into();
        let hash = Self::content_hash(&chain_id, epoch, height, &parent, &payload);
        Block {
            header: BlockHeader {
                chain_id,
                epoch,
                height,
                parent,
                hash,
            },
            payload,
        }
    }

    /// The genesis block for a chain: height 0, epoch 0, zero parent.
    pub fn genesis(chain_id: impl Into<String>) -> Self {
        Block::new(chain_id, 0, 0, Hash::ZERO, Vec::new())
    }

    /// Content hash over (chain id, epoch, height, parent, payload).
    fn content_hash(
        chain_id: &str,
        epoch: u64,
        height: u64,
        parent: &Hash,
        payload: &[u8],
    ) -> Hash {
        let mut data = Vec::with_capacity(chain_id.len() + 48 + payload.len());
        data.extend_from_slice(chain_id.as_bytes());
        data.extend_from_slice(&epoch.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data.extend_from_slice(parent.as_bytes());
        data.extend_from_slice(payload);
        Hash::digest("kestrel.block", &data)
    }

    pub fn hash(&self) -> Hash {
        self.header.hash
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn epoch(&self) -> u64 {
        self.header.epoch
    }

    pub fn parent(&self) -> Hash {
        self.header.parent
    }
}

/// A block as stored in the chain index: the block itself, the commit
/// certificate once one forms, and links to its children in the DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedBlock {
    pub block: Block,
    /// Quorum proof for this block, attached when one forms or arrives.
    pub commit_certificate: Option<CommitCertificate>,
    /// Child block hashes in insertion order.
    pub children: Vec<Hash>,
}

impl ExtendedBlock {
    pub fn new(block: Block) -> Self {
        ExtendedBlock {
            block,
            commit_certificate: None,
            children: Vec::new(),
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.block.header
    }

    pub fn hash(&self) -> Hash {
        self.block.hash()
    }

    pub fn height(&self) -> u64 {
        self.block.height()
    }

    pub fn epoch(&self) -> u64 {
        self.block.epoch()
    }

    pub fn parent(&self) -> Hash {
        self.block.parent()
    }
}
