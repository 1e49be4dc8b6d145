//! The snapshot store contract.

use kestrel_types::Hash;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// One committed state snapshot: the full key space at a root.
///
/// Shared behind `Arc` — a snapshot is immutable once stored, and store
/// views fork from it structurally.
pub type Snapshot = Arc<BTreeMap<Vec<u8>, Vec<u8>>>;

/// Content-addressed snapshot store.
///
/// [`Hash::ZERO`] denotes the empty state and always resolves.
pub trait Database: Send + Sync {
    /// Fetch the snapshot at a root, if present.
    fn snapshot(&self, root: &Hash) -> Option<Snapshot>;

    /// Persist a snapshot under its content root.
    fn put_snapshot(&self, root: Hash, snapshot: Snapshot);
}

/// In-memory snapshot store.
#[derive(Default)]
pub struct MemoryDatabase {
    snapshots: RwLock<HashMap<Hash, Snapshot>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Database for MemoryDatabase {
    fn snapshot(&self, root: &Hash) -> Option<Snapshot> {
        if *root == Hash::ZERO {
            return Some(Arc::new(BTreeMap::new()));
        }
        self.snapshots
            .read()
            .expect("lock poisoned")
            .get(root)
            .cloned()
    }

    fn put_snapshot(&self, root: Hash, snapshot: Snapshot) {
        self.snapshots
            .write()
            .expect("lock poisoned")
            .insert(root, snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_root_always_resolves_empty() {
        let db = MemoryDatabase::new();
        let snapshot = db.snapshot(&Hash::ZERO).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn unknown_root_is_absent() {
        let db = MemoryDatabase::new();
        assert!(db.snapshot(&Hash::from_bytes(b"nope")).is_none());
    }

    #[test]
    fn snapshots_round_trip() {
        let db = MemoryDatabase::new();
        let mut map = BTreeMap::new();
        map.insert(b"k".to_vec(), b"v".to_vec());
        let root = Hash::from_bytes(b"root");

        db.put_snapshot(root, Arc::new(map));
        assert_eq!(
            db.snapshot(&root).unwrap().get(b"k".as_slice()),
            Some(&b"v".to_vec())
        );
    }
}
