//! Cached EVM state access on top of a point-read/write ledger.

mod ledger;
mod ledger_key;
mod state_manager;
mod storage_error;

pub use ledger::InMemoryLedger;
pub use ledger::Ledger;
pub use ledger_key::LedgerKey;
pub use state_manager::PendingWrite;
pub use state_manager::StateManager;
pub use state_manager::StateManagerConfig;
pub use storage_error::StorageError;
