//! The triple-view ledger state container.

use crate::database::Database;
use crate::store_view::StoreView;
use crate::types::{Account, Address, SlashIntent, SplitContract};
use kestrel_types::{Hash, Validator};
use std::sync::Arc;
use tracing::debug;

/// Ledger state: three coexisting views over one committed state, plus
/// per-block scratch collections.
///
/// After [`LedgerState::reset_state`] or [`LedgerState::commit`] the three
/// views are fresh independent copies of the same base. Scratch state
/// (slash intents, validator diff, coinbase flag) survives `commit` — the
/// outer block-assembly layer consumes it afterwards through the explicit
/// accessors — and is cleared by `reset_state`.
pub struct LedgerState {
    chain_id: String,
    db: Arc<dyn Database>,

    coinbase_processed: bool,
    slash_intents: Vec<SlashIntent>,
    validators_diff: Vec<Validator>,

    delivered: StoreView,
    checked: StoreView,
    screened: StoreView,
}

impl LedgerState {
    /// Create a ledger state over the empty root at height 0. Call
    /// [`LedgerState::reset_state`] to anchor it at a real height and root.
    pub fn new(chain_id: impl Into<String>, db: Arc<dyn Database>) -> Self {
        let delivered = StoreView::new(0, Hash::ZERO, db.clone())
            .expect("empty root must resolve");
        let checked = delivered.copy().expect("copy of fresh view");
        let screened = delivered.copy().expect("copy of fresh view");
        LedgerState {
            chain_id: chain_id.into(),
            db,
            coinbase_processed: false,
            slash_intents: Vec::new(),
            validators_diff: Vec::new(),
            delivered,
            checked,
            screened,
        }
    }

    /// Re-anchor all three views at `(height, root)` and clear the scratch
    /// state.
    ///
    /// # Panics
    ///
    /// If the root does not resolve in the store — that is storage
    /// corruption, not a recoverable condition.
    pub fn reset_state(&mut self, height: u64, root: Hash) {
        self.delivered = StoreView::new(height, root, self.db.clone())
            .unwrap_or_else(|e| panic!("failed to reset ledger state: {e}"));
        self.checked = self
            .delivered
            .copy()
            .unwrap_or_else(|e| panic!("failed to copy to the checked view: {e}"));
        self.screened = self
            .delivered
            .copy()
            .unwrap_or_else(|e| panic!("failed to copy to the screened view: {e}"));

        self.coinbase_processed = false;
        self.slash_intents.clear();
        self.validators_diff.clear();
        debug!(height, root = ?root, "Ledger state reset");
    }

    /// Persist the delivered view as committed, advance its height, and
    /// re-clone it into the checked and screened views. Returns the new
    /// root.
    ///
    /// Scratch state is *not* cleared: the block-assembly layer drains it
    /// after commit returns.
    pub fn commit(&mut self) -> Hash {
        let root = self.delivered.save();
        self.delivered.increment_height();

        self.checked = self
            .delivered
            .copy()
            .unwrap_or_else(|e| panic!("commit: failed to copy to the checked view: {e}"));
        self.screened = self
            .delivered
            .copy()
            .unwrap_or_else(|e| panic!("commit: failed to copy to the screened view: {e}"));

        debug!(height = self.delivered.height(), root = ?root, "Ledger state committed");
        root
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// Block height the ledger state corresponds to.
    pub fn height(&self) -> u64 {
        self.delivered.height()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Views
    // ═══════════════════════════════════════════════════════════════════════

    /// The authoritative view holding committed plus delivered writes.
    pub fn delivered(&mut self) -> &mut StoreView {
        &mut self.delivered
    }

    /// Scratch view for candidate-block validation.
    pub fn checked(&mut self) -> &mut StoreView {
        &mut self.checked
    }

    /// Scratch view for mempool screening.
    pub fn screened(&mut self) -> &mut StoreView {
        &mut self.screened
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Scratch state
    // ═══════════════════════════════════════════════════════════════════════

    pub fn add_slash_intent(&mut self, intent: SlashIntent) {
        self.slash_intents.push(intent);
    }

    pub fn slash_intents(&self) -> &[SlashIntent] {
        &self.slash_intents
    }

    pub fn clear_slash_intents(&mut self) {
        self.slash_intents.clear();
    }

    pub fn coinbase_processed(&self) -> bool {
        self.coinbase_processed
    }

    pub fn set_coinbase_processed(&mut self, processed: bool) {
        self.coinbase_processed = processed;
    }

    /// Drain the pending validator-set diff.
    pub fn get_and_clear_validator_diff(&mut self) -> Vec<Validator> {
        std::mem::take(&mut self.validators_diff)
    }

    pub fn set_validator_diff(&mut self, diff: Vec<Validator>) {
        self.validators_diff = diff;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors proxying to the delivered view
    // ═══════════════════════════════════════════════════════════════════════

    pub fn get_account(&self, address: &Address) -> Option<Account> {
        self.delivered.get_account(address)
    }

    pub fn set_account(&mut self, address: &Address, account: &Account) {
        self.delivered.set_account(address, account);
    }

    pub fn split_contract_exists(&self, resource_id: &[u8]) -> bool {
        self.delivered.get_split_contract(resource_id).is_some()
    }

    pub fn get_split_contract(&self, resource_id: &[u8]) -> Option<SplitContract> {
        self.delivered.get_split_contract(resource_id)
    }

    pub fn set_split_contract(&mut self, contract: &SplitContract) {
        self.delivered.set_split_contract(contract);
    }

    /// Add a split contract. Each resource id carries at most one; a
    /// duplicate is rejected.
    pub fn add_split_contract(&mut self, contract: &SplitContract) -> bool {
        if self.split_contract_exists(&contract.resource_id) {
            return false;
        }
        self.set_split_contract(contract);
        true
    }

    /// Update an existing split contract. Rejected if absent.
    pub fn update_split_contract(&mut self, contract: &SplitContract) -> bool {
        if !self.split_contract_exists(&contract.resource_id) {
            return false;
        }
        self.set_split_contract(contract);
        true
    }

    pub fn delete_split_contract(&mut self, resource_id: &[u8]) -> bool {
        self.delivered.delete_split_contract(resource_id)
    }

    pub fn delete_expired_split_contracts(&mut self, current_height: u64) -> bool {
        self.delivered.delete_expired_split_contracts(current_height)
    }
}
