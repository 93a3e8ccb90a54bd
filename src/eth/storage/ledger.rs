use std::collections::HashMap;

use parking_lot::RwLock;
use parking_lot::RwLockReadGuard;
use parking_lot::RwLockWriteGuard;

use crate::eth::primitives::Bytes;
use crate::eth::storage::LedgerKey;

/// Point read/write capability consumed from the underlying ledger.
///
/// Every call may block on I/O and may fail; errors are surfaced to the caller
/// verbatim and are never retried by this crate. Timeouts and cancellation are
/// the implementor's responsibility.
pub trait Ledger: Send + Sync + 'static {
    /// Reads the value stored under the key. Returns None when the key is absent.
    ///
    /// An error means the read could not be completed and must not be treated
    /// as absence.
    fn read(&self, key: &LedgerKey) -> anyhow::Result<Option<Bytes>>;

    /// Stores the value under the key, replacing any previous value.
    fn write(&self, key: LedgerKey, value: Bytes) -> anyhow::Result<()>;

    /// Removes the key. Deleting an absent key succeeds.
    fn delete(&self, key: &LedgerKey) -> anyhow::Result<()>;
}

// -----------------------------------------------------------------------------
// InMemoryLedger
// -----------------------------------------------------------------------------

/// In-process ledger implementation backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    entries: RwLock<HashMap<LedgerKey, Bytes>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks inner state for reading.
    pub fn lock_read(&self) -> RwLockReadGuard<'_, HashMap<LedgerKey, Bytes>> {
        self.entries.read()
    }

    /// Locks inner state for writing.
    pub fn lock_write(&self) -> RwLockWriteGuard<'_, HashMap<LedgerKey, Bytes>> {
        self.entries.write()
    }
}

impl Ledger for InMemoryLedger {
    fn read(&self, key: &LedgerKey) -> anyhow::Result<Option<Bytes>> {
        Ok(self.lock_read().get(key).cloned())
    }

    fn write(&self, key: LedgerKey, value: Bytes) -> anyhow::Result<()> {
        self.lock_write().insert(key, value);
        Ok(())
    }

    fn delete(&self, key: &LedgerKey) -> anyhow::Result<()> {
        self.lock_write().remove(key);
        Ok(())
    }
}
