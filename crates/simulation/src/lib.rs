//! Deterministic in-process simulation for Kestrel consensus.
//!
//! Provides an in-memory network hub that fans broadcasts out to every
//! registered engine's incoming queue, and a [`Cluster`] helper that wires
//! up N validators over per-node chains sharing one genesis. Together with
//! tokio's paused test time, multi-node consensus scenarios run
//! deterministically and without wall-clock delays: timers only fire when
//! every task is idle.

mod cluster;
mod network;

pub use cluster::Cluster;
pub use network::{NetworkConfig, NetworkHub, SimulatedNetwork};
