//! Height-tagged, root-anchored views over the snapshot store.

use crate::database::{Database, Snapshot};
use crate::types::{Account, Address, SplitContract};
use kestrel_types::Hash;
use std::collections::BTreeMap;
use std::sync::Arc;

const CHAIN_ID_KEY: &[u8] = b"chainid";
const ACCOUNT_PREFIX: &[u8] = b"ls/a/";
const SPLIT_CONTRACT_PREFIX: &[u8] = b"ls/ssc/";

fn account_key(address: &Address) -> Vec<u8> {
    let mut key = ACCOUNT_PREFIX.to_vec();
    key.extend_from_slice(address.as_bytes());
    key
}

fn split_contract_key(resource_id: &[u8]) -> Vec<u8> {
    let mut key = SPLIT_CONTRACT_PREFIX.to_vec();
    key.extend_from_slice(resource_id);
    key
}

/// Errors constructing a store view.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The root hash does not resolve in the underlying store.
    #[error("state root {0} not found")]
    UnknownRoot(Hash),
}

/// A mutable overlay on one committed snapshot.
///
/// Writes land in the overlay (`None` marks a deletion); `save` folds the
/// overlay into a fresh snapshot, computes its content root, and persists
/// it. `copy` forks an independent view sharing the committed base
/// structurally.
pub struct StoreView {
    height: u64,
    root: Hash,
    db: Arc<dyn Database>,
    base: Snapshot,
    overlay: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl StoreView {
    /// Open a view at `(height, root)`. The root must exist in the store.
    pub fn new(height: u64, root: Hash, db: Arc<dyn Database>) -> Result<Self, StoreError> {
        let base = db.snapshot(&root).ok_or(StoreError::UnknownRoot(root))?;
        Ok(StoreView {
            height,
            root,
            db,
            base,
            overlay: BTreeMap::new(),
        })
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    /// Root of the last saved (or opening) snapshot. Pending overlay writes
    /// are not reflected until `save`.
    pub fn root(&self) -> Hash {
        self.root
    }

    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.overlay.get(key) {
            Some(entry) => entry.clone(),
            None => self.base.get(key).cloned(),
        }
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.overlay.insert(key, Some(value));
    }

    /// Delete a key. Returns whether it was present.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        let existed = self.get(key).is_some();
        self.overlay.insert(key.to_vec(), None);
        existed
    }

    /// All live entries under a prefix, overlay winning over base.
    pub fn iter_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: BTreeMap<Vec<u8>, Option<Vec<u8>>> = self
            .base
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), Some(v.clone())))
            .collect();
        for (k, v) in self
            .overlay
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            merged.insert(k.clone(), v.clone());
        }
        merged
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect()
    }

    /// Fold the overlay into a new snapshot, persist it, and re-anchor the
    /// view at the resulting content root.
    pub fn save(&mut self) -> Hash {
        let mut next: BTreeMap<Vec<u8>, Vec<u8>> = (*self.base).clone();
        for (key, entry) in std::mem::take(&mut self.overlay) {
            match entry {
                Some(value) => {
                    next.insert(key, value);
                }
                None => {
                    next.remove(&key);
                }
            }
        }

        let root = Self::content_root(&next);
        let snapshot: Snapshot = Arc::new(next);
        self.db.put_snapshot(root, snapshot.clone());
        self.base = snapshot;
        self.root = root;
        root
    }

    pub fn increment_height(&mut self) {
        self.height += 1;
    }

    /// Fork an independent view rooted at the same state. The committed
    /// base is shared structurally; the pending overlay is cloned.
    pub fn copy(&self) -> Result<StoreView, StoreError> {
        Ok(StoreView {
            height: self.height,
            root: self.root,
            db: self.db.clone(),
            base: self.base.clone(),
            overlay: self.overlay.clone(),
        })
    }

    /// Content root over the full sorted key space.
    fn content_root(entries: &BTreeMap<Vec<u8>, Vec<u8>>) -> Hash {
        let mut data = Vec::new();
        for (key, value) in entries {
            data.extend_from_slice(&(key.len() as u64).to_le_bytes());
            data.extend_from_slice(key);
            data.extend_from_slice(&(value.len() as u64).to_le_bytes());
            data.extend_from_slice(value);
        }
        Hash::digest("kestrel.state", &data)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Typed accessors
    // ═══════════════════════════════════════════════════════════════════════

    pub fn get_chain_id(&self) -> Option<String> {
        self.get(CHAIN_ID_KEY)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn set_chain_id(&mut self, chain_id: &str) {
        self.set(CHAIN_ID_KEY.to_vec(), chain_id.as_bytes().to_vec());
    }

    pub fn get_account(&self, address: &Address) -> Option<Account> {
        self.get(&account_key(address)).map(|bytes| {
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                panic!("corrupt account record for {address}: {e}");
            })
        })
    }

    pub fn set_account(&mut self, address: &Address, account: &Account) {
        let bytes = serde_json::to_vec(account).expect("account record serializes");
        self.set(account_key(address), bytes);
    }

    pub fn get_split_contract(&self, resource_id: &[u8]) -> Option<SplitContract> {
        self.get(&split_contract_key(resource_id)).map(|bytes| {
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                panic!(
                    "corrupt split contract record for resource {}: {e}",
                    hex::encode(resource_id)
                );
            })
        })
    }

    pub fn set_split_contract(&mut self, contract: &SplitContract) {
        let bytes = serde_json::to_vec(contract).expect("split contract record serializes");
        self.set(split_contract_key(&contract.resource_id), bytes);
    }

    pub fn delete_split_contract(&mut self, resource_id: &[u8]) -> bool {
        self.delete(&split_contract_key(resource_id))
    }

    /// Sweep split contracts whose `end_block_height` has passed.
    pub fn delete_expired_split_contracts(&mut self, current_height: u64) -> bool {
        let expired: Vec<Vec<u8>> = self
            .iter_prefix(SPLIT_CONTRACT_PREFIX)
            .into_iter()
            .filter_map(|(key, bytes)| {
                let contract: SplitContract = serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                    panic!("corrupt split contract record: {e}");
                });
                (contract.end_block_height < current_height).then_some(key)
            })
            .collect();
        for key in expired {
            self.overlay.insert(key, None);
        }
        true
    }
}
