//! Block-DAG index for Kestrel consensus.
//!
//! The chain stores every block the node has seen, keyed by hash, with
//! parent/child links forming a DAG rooted at a genesis (or checkpoint)
//! anchor. The consensus engine consumes it through four operations:
//!
//! - [`Chain::add_block`] — insert a block and link it under its parent
//! - [`Chain::find_block`] — look a block up by hash
//! - [`Chain::save_block`] — persist mutated metadata (a commit certificate
//!   attached after the fact)
//! - [`Chain::find_deepest_descendant`] — fork-choice helper: the deepest
//!   block reachable from a hash, ties broken first-seen
//!
//! State derivation never depends on `add_block` side effects alone, so
//! duplicate and orphan insertions are errors the caller can log and drop.

mod chain;

pub use chain::{Chain, ChainError};
