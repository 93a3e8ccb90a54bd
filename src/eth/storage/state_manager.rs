use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use clap::Parser;
use display_json::DebugAsJson;
use indexmap::IndexMap;
use parking_lot::RwLock;
use parking_lot::RwLockReadGuard;
use parking_lot::RwLockWriteGuard;

use crate::eth::primitives::Account;
use crate::eth::primitives::Address;
use crate::eth::primitives::Bytes;
use crate::eth::primitives::Slot;
use crate::eth::primitives::SlotIndex;
use crate::eth::primitives::SlotValue;
use crate::eth::storage::Ledger;
use crate::eth::storage::LedgerKey;
use crate::eth::storage::StorageError;
use crate::ext::not;
#[cfg(feature = "metrics")]
use crate::infra::metrics;

// -----------------------------------------------------------------------------
// Config
// -----------------------------------------------------------------------------

/// State manager configuration.
#[derive(DebugAsJson, Clone, Parser, serde::Serialize)]
pub struct StateManagerConfig {
    /// Populate the slot cache on reads, not only on writes.
    ///
    /// Enabling saves ledger reads for repeatedly read slots at the cost of a
    /// wider staleness window when the ledger is mutated by someone else
    /// during the transaction.
    #[arg(long = "state-cache-slot-reads", env = "STATE_CACHE_SLOT_READS", default_value = "false")]
    pub cache_slot_reads: bool,
}

impl StateManagerConfig {
    /// Initializes a state manager for a new transaction on top of the given ledger.
    pub fn init(&self, ledger: Arc<dyn Ledger>) -> StateManager {
        tracing::info!(config = ?self, "creating state manager");
        StateManager::new(ledger, self.cache_slot_reads)
    }
}

// -----------------------------------------------------------------------------
// StateManager
// -----------------------------------------------------------------------------

/// Per-transaction cached view of accounts and storage slots.
///
/// Reads are served from memory when possible, falling back to the ledger on a
/// miss. Writes mutate only the in-memory state and are buffered until
/// [`flush`](Self::flush) applies them to the ledger in one pass. One instance
/// belongs to exactly one in-flight transaction; hosts must construct a fresh
/// instance (or [`reset`](Self::reset)) per transaction.
pub struct StateManager {
    ledger: Arc<dyn Ledger>,
    cache_slot_reads: bool,
    state: RwLock<StateManagerState>,
}

/// Inner state. Account, slot and tombstone maps are guarded by a single lock
/// because tombstones and cached code are read together in `read_account`.
#[derive(Debug, Default)]
struct StateManagerState {
    /// Account code cache, keyed by address.
    accounts: HashMap<Address, Bytes>,

    /// Storage slot cache. Populated by writes, and by reads when enabled.
    slots: HashMap<(Address, SlotIndex), SlotValue>,

    /// Addresses deleted in the current transaction.
    deleted: HashSet<Address>,

    /// Ledger writes buffered for the next flush, in first-touch order.
    /// One entry per key, so the last write to a key wins.
    pending: IndexMap<LedgerKey, PendingWrite>,
}

/// A buffered ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
    Put(Bytes),
    Delete,
}

impl StateManager {
    pub fn new(ledger: Arc<dyn Ledger>, cache_slot_reads: bool) -> Self {
        Self {
            ledger,
            cache_slot_reads,
            state: RwLock::new(StateManagerState::default()),
        }
    }

    /// Locks inner state for reading.
    fn lock_read(&self) -> RwLockReadGuard<'_, StateManagerState> {
        self.state.read()
    }

    /// Locks inner state for writing.
    fn lock_write(&self) -> RwLockWriteGuard<'_, StateManagerState> {
        self.state.write()
    }

    // -------------------------------------------------------------------------
    // Accounts
    // -------------------------------------------------------------------------

    /// Retrieves an account. Returns the canonical empty account for deleted
    /// and absent addresses.
    pub fn read_account(&self, address: Address) -> anyhow::Result<Account, StorageError> {
        #[cfg(feature = "metrics")]
        let start = metrics::now();

        let result = self.do_read_account(address);

        #[cfg(feature = "metrics")]
        metrics::inc_storage_read_account(start.elapsed(), result.is_ok());
        result
    }

    fn do_read_account(&self, address: Address) -> anyhow::Result<Account, StorageError> {
        // tombstone takes precedence over any cached code
        {
            let state = self.lock_read();
            if state.deleted.contains(&address) {
                tracing::trace!(%address, "account is deleted");
                return Ok(Account::new_empty(address));
            }
            if let Some(code) = state.accounts.get(&address) {
                tracing::trace!(%address, "account found in cache");
                return Ok(Account::new(address, code.clone()));
            }
        }

        // cache miss
        let key = LedgerKey::account(address);
        match self.ledger.read(&key)? {
            Some(code) if not(code.is_empty()) => {
                tracing::trace!(%address, %key, "account found in ledger");
                let mut state = self.lock_write();
                // the address may have been tombstoned while the ledger read was in flight
                if not(state.deleted.contains(&address)) {
                    state.accounts.insert(address, code.clone());
                }
                Ok(Account::new(address, code))
            }
            _ => {
                tracing::trace!(%address, %key, "account not found");
                Ok(Account::new_empty(address))
            }
        }
    }

    /// Saves an account, buffering the ledger write and reviving the address
    /// if it was deleted in this transaction.
    pub fn update_account(&self, account: Account) -> anyhow::Result<(), StorageError> {
        #[cfg(feature = "metrics")]
        let start = metrics::now();

        let result = self.do_update_account(account);

        #[cfg(feature = "metrics")]
        metrics::inc_storage_update_account(start.elapsed(), result.is_ok());
        result
    }

    fn do_update_account(&self, account: Account) -> anyhow::Result<(), StorageError> {
        let Account { address, code } = account;
        tracing::debug!(%address, code_len = code.len(), "updating account");

        let mut state = self.lock_write();
        state.deleted.remove(&address);
        state.accounts.insert(address, code.clone());
        state.pending.insert(LedgerKey::account(address), PendingWrite::Put(code));
        Ok(())
    }

    /// Marks an account as deleted for the remainder of the transaction and
    /// buffers the ledger delete. Removing an absent or already-removed
    /// account succeeds silently.
    ///
    /// Storage slots of the account are NOT purged or tombstoned: an account
    /// recreated after removal observes its pre-deletion storage.
    pub fn remove_account(&self, address: Address) -> anyhow::Result<(), StorageError> {
        #[cfg(feature = "metrics")]
        let start = metrics::now();

        let result = self.do_remove_account(address);

        #[cfg(feature = "metrics")]
        metrics::inc_storage_remove_account(start.elapsed(), result.is_ok());
        result
    }

    fn do_remove_account(&self, address: Address) -> anyhow::Result<(), StorageError> {
        tracing::debug!(%address, "removing account");

        let mut state = self.lock_write();
        state.deleted.insert(address);
        state.accounts.remove(&address);
        state.pending.insert(LedgerKey::account(address), PendingWrite::Delete);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Slots
    // -------------------------------------------------------------------------

    /// Retrieves a storage slot. Absent slots read as the zero word.
    ///
    /// Deletion tombstones are never consulted for slots, so slots of a
    /// deleted account remain readable.
    pub fn read_slot(&self, address: Address, index: SlotIndex) -> anyhow::Result<Slot, StorageError> {
        #[cfg(feature = "metrics")]
        let start = metrics::now();

        let result = self.do_read_slot(address, index);

        #[cfg(feature = "metrics")]
        metrics::inc_storage_read_slot(start.elapsed(), result.is_ok());
        result
    }

    fn do_read_slot(&self, address: Address, index: SlotIndex) -> anyhow::Result<Slot, StorageError> {
        {
            let state = self.lock_read();
            if let Some(&value) = state.slots.get(&(address, index)) {
                tracing::trace!(%address, %index, %value, "slot found in cache");
                return Ok(Slot::new(index, value));
            }
        }

        // cache miss
        let key = LedgerKey::slot(address, index);
        match self.ledger.read(&key)? {
            Some(bytes) if bytes.len() > 32 => Err(StorageError::ValueTooLarge { key, len: bytes.len() }),
            Some(bytes) => {
                let value = SlotValue::left_padded(&bytes)?;
                tracing::trace!(%address, %index, %value, "slot found in ledger");
                if self.cache_slot_reads {
                    self.lock_write().slots.insert((address, index), value);
                }
                Ok(Slot::new(index, value))
            }
            None => {
                tracing::trace!(%address, %index, "slot not found");
                Ok(Slot::new_empty(index))
            }
        }
    }

    /// Saves a storage slot, buffering the ledger write.
    pub fn set_slot(&self, address: Address, slot: Slot) -> anyhow::Result<(), StorageError> {
        #[cfg(feature = "metrics")]
        let start = metrics::now();

        let result = self.do_set_slot(address, slot);

        #[cfg(feature = "metrics")]
        metrics::inc_storage_set_slot(start.elapsed(), result.is_ok());
        result
    }

    fn do_set_slot(&self, address: Address, slot: Slot) -> anyhow::Result<(), StorageError> {
        tracing::debug!(%address, %slot, "updating slot");

        let mut state = self.lock_write();
        state.slots.insert((address, slot.index), slot.value);
        state
            .pending
            .insert(LedgerKey::slot(address, slot.index), PendingWrite::Put(Vec::<u8>::from(slot.value).into()));
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Flush
    // -------------------------------------------------------------------------

    /// Applies all buffered writes to the ledger in one pass, returning how
    /// many ledger calls were issued. A flush with no buffered writes is a
    /// successful no-op.
    ///
    /// Flush is not transactional across keys: on the first ledger error the
    /// writes applied so far stay committed, while the failed write and every
    /// write after it remain buffered, so calling `flush` again retries only
    /// what is still pending.
    pub fn flush(&self) -> anyhow::Result<usize, StorageError> {
        #[cfg(feature = "metrics")]
        let start = metrics::now();

        let result = self.do_flush();

        #[cfg(feature = "metrics")]
        metrics::inc_storage_flush(start.elapsed(), result.is_ok());
        result
    }

    fn do_flush(&self) -> anyhow::Result<usize, StorageError> {
        let mut state = self.lock_write();
        if state.pending.is_empty() {
            return Ok(0);
        }

        let writes: Vec<(LedgerKey, PendingWrite)> = state.pending.drain(..).collect();
        let mut writes = writes.into_iter();
        let mut flushed = 0;

        while let Some((key, write)) = writes.next() {
            let result = match &write {
                PendingWrite::Put(value) => self.ledger.write(key.clone(), value.clone()),
                PendingWrite::Delete => self.ledger.delete(&key),
            };
            if let Err(e) = result {
                tracing::warn!(%key, flushed, reason = ?e, "ledger write failed during flush");

                // keep the failed write and everything after it for retry
                state.pending.insert(key, write);
                state.pending.extend(writes);
                return Err(e.into());
            }
            flushed += 1;
        }

        tracing::debug!(flushed, "flushed buffered writes to ledger");
        #[cfg(feature = "metrics")]
        metrics::inc_n_storage_flush_writes(flushed as u64);
        Ok(flushed)
    }

    // -------------------------------------------------------------------------
    // General state
    // -------------------------------------------------------------------------

    /// Number of ledger writes waiting for the next flush.
    pub fn pending_writes_len(&self) -> usize {
        self.lock_read().pending.len()
    }

    /// Resets to default empty state, as if freshly constructed for a new
    /// transaction. Buffered writes are discarded, not flushed.
    pub fn reset(&self) {
        tracing::debug!("resetting state manager");
        let mut state = self.lock_write();
        state.accounts.clear();
        state.slots.clear();
        state.deleted.clear();
        state.pending.clear();
    }
}
