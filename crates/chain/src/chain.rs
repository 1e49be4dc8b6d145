//! The in-memory block-DAG index.

use kestrel_types::{Block, ExtendedBlock, Hash};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use tracing::trace;

/// Errors from chain index operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// The block is already in the index.
    #[error("block {0} already exists")]
    Duplicate(Hash),

    /// The block's parent is not in the index.
    #[error("parent {0} not found")]
    UnknownParent(Hash),

    /// No block with the given hash.
    #[error("block {0} not found")]
    NotFound(Hash),
}

/// Interior index state behind the lock.
struct ChainIndex {
    blocks: HashMap<Hash, ExtendedBlock>,
}

/// The block-DAG store, rooted at a genesis/checkpoint anchor.
///
/// Shared between the engine task and observers via `Arc`; lookups return
/// clones of the stored record, and mutations flow back through
/// [`Chain::save_block`].
pub struct Chain {
    chain_id: String,
    root: Hash,
    inner: RwLock<ChainIndex>,
}

impl Chain {
    /// Create a chain anchored at the given genesis block.
    pub fn new(chain_id: impl Into<String>, genesis: Block) -> Self {
        let root = genesis.hash();
        let mut blocks = HashMap::new();
        blocks.insert(root, ExtendedBlock::new(genesis));
        Chain {
            chain_id: chain_id.into(),
            root,
            inner: RwLock::new(ChainIndex { blocks }),
        }
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// The root anchor block.
    pub fn root(&self) -> ExtendedBlock {
        self.find_block(&self.root)
            .expect("chain root must always be present")
    }

    pub fn root_hash(&self) -> Hash {
        self.root
    }

    /// Insert a block into the DAG, linking it under its parent.
    ///
    /// The parent must already be present; insertion order of siblings is
    /// preserved (it is the deepest-descendant tie-break).
    pub fn add_block(&self, block: Block) -> Result<ExtendedBlock, ChainError> {
        let hash = block.hash();
        let parent = block.parent();
        let mut inner = self.inner.write().expect("lock poisoned");

        if inner.blocks.contains_key(&hash) {
            return Err(ChainError::Duplicate(hash));
        }
        if !inner.blocks.contains_key(&parent) {
            return Err(ChainError::UnknownParent(parent));
        }

        let extended = ExtendedBlock::new(block);
        inner.blocks.insert(hash, extended.clone());
        inner
            .blocks
            .get_mut(&parent)
            .expect("parent checked above")
            .children
            .push(hash);

        trace!(block = ?hash, parent = ?parent, "Block added to chain");
        Ok(extended)
    }

    /// Look a block up by hash.
    pub fn find_block(&self, hash: &Hash) -> Result<ExtendedBlock, ChainError> {
        let inner = self.inner.read().expect("lock poisoned");
        inner
            .blocks
            .get(hash)
            .cloned()
            .ok_or(ChainError::NotFound(*hash))
    }

    /// Persist mutated block metadata (e.g. an attached commit certificate).
    ///
    /// Child links are owned by the index; the stored links win over
    /// whatever the caller's clone carries.
    pub fn save_block(&self, block: ExtendedBlock) {
        let hash = block.hash();
        let mut inner = self.inner.write().expect("lock poisoned");
        let children = inner
            .blocks
            .get(&hash)
            .map(|stored| stored.children.clone())
            .unwrap_or_default();
        let mut block = block;
        block.children = children;
        inner.blocks.insert(hash, block);
    }

    /// The deepest block reachable from `hash`, including `hash` itself.
    ///
    /// Ties at equal depth are broken first-seen: siblings are explored in
    /// insertion order and a strictly greater height is required to replace
    /// the current best.
    pub fn find_deepest_descendant(&self, hash: &Hash) -> Option<ExtendedBlock> {
        let inner = self.inner.read().expect("lock poisoned");
        let start = inner.blocks.get(hash)?;

        let mut best = start.clone();
        let mut queue: VecDeque<Hash> = start.children.iter().copied().collect();
        while let Some(next) = queue.pop_front() {
            if let Some(block) = inner.blocks.get(&next) {
                if block.height() > best.height() {
                    best = block.clone();
                }
                queue.extend(block.children.iter().copied());
            }
        }
        Some(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_with_genesis() -> (Chain, Block) {
        let genesis = Block::genesis("test");
        (Chain::new("test", genesis.clone()), genesis)
    }

    fn child_of(parent: &Block, epoch: u64, payload: u8) -> Block {
        Block::new(
            "test",
            epoch,
            parent.height() + 1,
            parent.hash(),
            vec![payload],
        )
    }

    #[test]
    fn add_and_find() {
        let (chain, genesis) = chain_with_genesis();
        let b1 = child_of(&genesis, 1, 1);

        chain.add_block(b1.clone()).unwrap();
        assert_eq!(chain.find_block(&b1.hash()).unwrap().block, b1);

        let root = chain.root();
        assert_eq!(root.children, vec![b1.hash()]);
    }

    #[test]
    fn duplicate_rejected() {
        let (chain, genesis) = chain_with_genesis();
        let b1 = child_of(&genesis, 1, 1);

        chain.add_block(b1.clone()).unwrap();
        assert_eq!(
            chain.add_block(b1.clone()),
            Err(ChainError::Duplicate(b1.hash()))
        );
    }

    #[test]
    fn orphan_rejected() {
        let (chain, _genesis) = chain_with_genesis();
        let orphan = Block::new("test", 1, 5, Hash::from_bytes(b"nowhere"), vec![]);
        assert!(matches!(
            chain.add_block(orphan),
            Err(ChainError::UnknownParent(_))
        ));
    }

    #[test]
    fn save_block_preserves_children() {
        let (chain, genesis) = chain_with_genesis();
        let b1 = child_of(&genesis, 1, 1);
        chain.add_block(b1.clone()).unwrap();

        // A stale clone without child links must not erase them.
        let stale_root = ExtendedBlock::new(genesis);
        chain.save_block(stale_root);
        assert_eq!(chain.root().children, vec![b1.hash()]);
    }

    #[test]
    fn deepest_descendant_prefers_longer_branch() {
        let (chain, genesis) = chain_with_genesis();

        // Short branch: genesis -> a1.
        let a1 = child_of(&genesis, 1, 1);
        chain.add_block(a1.clone()).unwrap();

        // Long branch: genesis -> b1 -> b2 -> b3.
        let b1 = child_of(&genesis, 2, 2);
        let b2 = child_of(&b1, 3, 3);
        let b3 = child_of(&b2, 4, 4);
        chain.add_block(b1).unwrap();
        chain.add_block(b2).unwrap();
        chain.add_block(b3.clone()).unwrap();

        let tip = chain.find_deepest_descendant(&genesis.hash()).unwrap();
        assert_eq!(tip.hash(), b3.hash());
    }

    #[test]
    fn deepest_descendant_tie_breaks_first_seen() {
        let (chain, genesis) = chain_with_genesis();

        let first = child_of(&genesis, 1, 1);
        let second = child_of(&genesis, 1, 2);
        chain.add_block(first.clone()).unwrap();
        chain.add_block(second).unwrap();

        let tip = chain.find_deepest_descendant(&genesis.hash()).unwrap();
        assert_eq!(tip.hash(), first.hash());
    }

    #[test]
    fn deepest_descendant_of_leaf_is_itself() {
        let (chain, genesis) = chain_with_genesis();
        let b1 = child_of(&genesis, 1, 1);
        chain.add_block(b1.clone()).unwrap();

        let tip = chain.find_deepest_descendant(&b1.hash()).unwrap();
        assert_eq!(tip.hash(), b1.hash());
    }

    #[test]
    fn deepest_descendant_unknown_start() {
        let (chain, _genesis) = chain_with_genesis();
        assert!(chain
            .find_deepest_descendant(&Hash::from_bytes(b"missing"))
            .is_none());
    }
}
