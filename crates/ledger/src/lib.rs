//! Ledger state management for Kestrel.
//!
//! Maintains three independent views over the same committed state so that
//! three streams of transaction execution can proceed without interference:
//!
//! - `delivered` — the authoritative overlay where transactions included in
//!   a block are applied
//! - `checked` — a scratch overlay for validating a candidate block before
//!   proposing or voting
//! - `screened` — a scratch overlay for admitting transactions into the
//!   mempool
//!
//! Views are [`StoreView`]s: height-tagged, root-anchored copy-on-write
//! overlays on a content-addressed snapshot store ([`Database`]). `copy()`
//! shares the committed base structurally — no deep copies — so forking a
//! fresh view is cheap.
//!
//! Storage-integrity failures (an unknown root at reset, a failed clone at
//! commit) are fatal: they indicate corruption, and the process aborts.

mod database;
mod state;
mod store_view;
mod types;

pub use database::{Database, MemoryDatabase, Snapshot};
pub use state::LedgerState;
pub use store_view::{StoreError, StoreView};
pub use types::{Account, Address, SlashIntent, Split, SplitContract};
