//! Chained-BFT consensus engine.
//!
//! This crate drives a validator through a sequence of monotonically
//! increasing epochs. In each epoch a deterministic proposer extends the
//! current tip, validators vote, and a quorum of votes forms a commit
//! certificate (CC). Two consecutive certified blocks finalize the older
//! one (the two-chain rule).
//!
//! # Architecture
//!
//! All consensus state lives on a single driving task that selects over
//! three inputs:
//!
//! - **Cancellation** → cooperative shutdown
//! - **Incoming message** → dispatch on the tagged variant
//!   ([`ConsensusMessage`](kestrel_types::ConsensusMessage))
//! - **Epoch deadline** → cast a (possibly nil) vote and re-enter the epoch
//!
//! Message handlers run to completion; the only suspension point is the
//! select itself. The engine's own proposals and votes are fed back through
//! the same queue, so every state change — including ours — passes through
//! the dispatch path.
//!
//! # Safety and liveness
//!
//! - **Vote rule**: at most one non-nil vote per height; a non-advancing tip
//!   yields a nil-vote.
//! - **Quorum**: strict two-thirds of the validator set's voting power, by
//!   weight.
//! - **Two-chain commit**: a CC on a block whose parent also carries a CC
//!   finalizes the parent.
//! - **Epoch advancement**: a CC at an epoch ≥ ours, or a quorum of peers
//!   voting at an epoch ≥ ours, moves us forward; the epoch timer alone only
//!   triggers a nil-vote and a repeat of the same epoch.

mod config;
mod engine;
mod state;
mod validators;

pub use config::ConsensusConfig;
pub use engine::Engine;
pub use validators::{RotatingValidatorManager, ValidatorManager};
