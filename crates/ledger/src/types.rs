//! Ledger record types.
//!
//! Business semantics (coinbase rules, slashing proofs, split payouts) live
//! above the consensus core; these are the containers the state manager
//! stores and drains.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// An account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub sequence: u64,
    pub balance: u64,
}

/// One payee's share of a split contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub address: Address,
    /// Share of the payment, in percent.
    pub percentage: u32,
}

/// A revenue-splitting contract bound to a resource.
///
/// Each resource id carries at most one contract; contracts expire at
/// `end_block_height` and are swept by the state manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitContract {
    pub resource_id: Vec<u8>,
    pub initiator: Address,
    pub splits: Vec<Split>,
    pub end_block_height: u64,
}

/// Intent to slash a misbehaving validator, accumulated during block
/// execution and drained by the block-assembly layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashIntent {
    pub address: Address,
    pub reserve_sequence: u64,
    pub proof: Vec<u8>,
}
