use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use anyhow::anyhow;
use hex_literal::hex;
use ledgerstate::eth::primitives::Account;
use ledgerstate::eth::primitives::Address;
use ledgerstate::eth::primitives::Bytes;
use ledgerstate::eth::primitives::Slot;
use ledgerstate::eth::primitives::SlotIndex;
use ledgerstate::eth::primitives::SlotValue;
use ledgerstate::eth::storage::InMemoryLedger;
use ledgerstate::eth::storage::Ledger;
use ledgerstate::eth::storage::LedgerKey;
use ledgerstate::eth::storage::StateManager;
use parking_lot::Mutex;

const ALICE: Address = Address::new(hex!("0000000000000000000000000000000000000001"));
const BOB: Address = Address::new(hex!("0000000000000000000000000000000000000002"));

// -----------------------------------------------------------------------------
// Ledger doubles
// -----------------------------------------------------------------------------

/// Ledger that counts calls per key and can be told to fail.
#[derive(Default)]
struct InstrumentedLedger {
    inner: InMemoryLedger,
    reads: Mutex<HashMap<LedgerKey, usize>>,
    writes: Mutex<HashMap<LedgerKey, usize>>,
    deletes: Mutex<HashMap<LedgerKey, usize>>,
    fail_reads: AtomicBool,
    fail_key: Mutex<Option<LedgerKey>>,
}

impl InstrumentedLedger {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn seed(&self, key: LedgerKey, value: impl Into<Bytes>) {
        self.inner.lock_write().insert(key, value.into());
    }

    fn stored(&self, key: &LedgerKey) -> Option<Bytes> {
        self.inner.lock_read().get(key).cloned()
    }

    fn reads_of(&self, key: &LedgerKey) -> usize {
        self.reads.lock().get(key).copied().unwrap_or(0)
    }

    fn writes_of(&self, key: &LedgerKey) -> usize {
        self.writes.lock().get(key).copied().unwrap_or(0)
    }

    fn deletes_of(&self, key: &LedgerKey) -> usize {
        self.deletes.lock().get(key).copied().unwrap_or(0)
    }

    fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    /// Makes writes and deletes of the given key fail until cleared.
    fn fail_writes_of(&self, key: Option<LedgerKey>) {
        *self.fail_key.lock() = key;
    }

    fn should_fail_write(&self, key: &LedgerKey) -> bool {
        self.fail_key.lock().as_ref() == Some(key)
    }
}

impl Ledger for InstrumentedLedger {
    fn read(&self, key: &LedgerKey) -> anyhow::Result<Option<Bytes>> {
        *self.reads.lock().entry(key.clone()).or_default() += 1;
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(anyhow!("ledger read unavailable"));
        }
        self.inner.read(key)
    }

    fn write(&self, key: LedgerKey, value: Bytes) -> anyhow::Result<()> {
        *self.writes.lock().entry(key.clone()).or_default() += 1;
        if self.should_fail_write(&key) {
            return Err(anyhow!("ledger write unavailable"));
        }
        self.inner.write(key, value)
    }

    fn delete(&self, key: &LedgerKey) -> anyhow::Result<()> {
        *self.deletes.lock().entry(key.clone()).or_default() += 1;
        if self.should_fail_write(key) {
            return Err(anyhow!("ledger delete unavailable"));
        }
        self.inner.delete(key)
    }
}

fn state_manager(ledger: &Arc<InstrumentedLedger>) -> StateManager {
    StateManager::new(Arc::clone(ledger) as Arc<dyn Ledger>, false)
}

// -----------------------------------------------------------------------------
// Accounts
// -----------------------------------------------------------------------------

#[test]
fn read_account_on_empty_ledger_returns_empty_account() {
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);

    let account = sm.read_account(ALICE).unwrap();
    assert_eq!(account, Account::new_empty(ALICE));
}

#[test]
fn read_account_with_empty_code_returns_empty_account() {
    let ledger = InstrumentedLedger::new();
    ledger.seed(LedgerKey::account(ALICE), Bytes::default());
    let sm = state_manager(&ledger);

    let account = sm.read_account(ALICE).unwrap();
    assert_eq!(account, Account::new_empty(ALICE));
}

#[test]
fn read_account_populates_cache_from_ledger() {
    let ledger = InstrumentedLedger::new();
    let key = LedgerKey::account(ALICE);
    ledger.seed(key.clone(), vec![0x60, 0xfe]);
    let sm = state_manager(&ledger);

    assert_eq!(sm.read_account(ALICE).unwrap().code, Bytes::from(vec![0x60, 0xfe]));
    assert_eq!(sm.read_account(ALICE).unwrap().code, Bytes::from(vec![0x60, 0xfe]));
    assert_eq!(ledger.reads_of(&key), 1);
}

#[test]
fn updated_account_is_read_back_without_ledger_read() {
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);

    sm.update_account(Account::new(ALICE, vec![0x60, 0xfe])).unwrap();

    let account = sm.read_account(ALICE).unwrap();
    assert_eq!(account, Account::new(ALICE, vec![0x60, 0xfe]));
    assert_eq!(ledger.reads_of(&LedgerKey::account(ALICE)), 0);
}

#[test]
fn read_account_error_is_propagated_and_nothing_is_cached() {
    let ledger = InstrumentedLedger::new();
    let key = LedgerKey::account(ALICE);
    ledger.seed(key.clone(), vec![0x01]);
    let sm = state_manager(&ledger);

    ledger.fail_reads(true);
    assert!(sm.read_account(ALICE).is_err());

    ledger.fail_reads(false);
    assert_eq!(sm.read_account(ALICE).unwrap().code, Bytes::from(vec![0x01]));
    assert_eq!(ledger.reads_of(&key), 2);
}

// -----------------------------------------------------------------------------
// Tombstones
// -----------------------------------------------------------------------------

#[test]
fn tombstone_takes_precedence_over_cached_code() {
    let ledger = InstrumentedLedger::new();
    ledger.seed(LedgerKey::account(ALICE), vec![0x60, 0xfe]);
    let sm = state_manager(&ledger);

    // populate cache, then delete
    assert!(sm.read_account(ALICE).unwrap().is_contract());
    sm.remove_account(ALICE).unwrap();

    assert_eq!(sm.read_account(ALICE).unwrap(), Account::new_empty(ALICE));
}

#[test]
fn removed_account_stays_gone_even_if_ledger_still_has_it() {
    let ledger = InstrumentedLedger::new();
    let key = LedgerKey::account(ALICE);
    ledger.seed(key.clone(), vec![0x60, 0xfe]);
    let sm = state_manager(&ledger);

    sm.remove_account(ALICE).unwrap();

    // the ledger delete has not been flushed yet, but the address must read as gone
    assert_eq!(sm.read_account(ALICE).unwrap(), Account::new_empty(ALICE));
    assert_eq!(ledger.reads_of(&key), 0);
}

#[test]
fn remove_account_is_idempotent() {
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);

    sm.remove_account(ALICE).unwrap();
    sm.remove_account(ALICE).unwrap();

    assert_eq!(sm.read_account(ALICE).unwrap(), Account::new_empty(ALICE));
    assert_eq!(sm.pending_writes_len(), 1);

    sm.flush().unwrap();
    assert_eq!(ledger.deletes_of(&LedgerKey::account(ALICE)), 1);
}

#[test]
fn update_account_revives_deleted_address() {
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);

    sm.update_account(Account::new(ALICE, vec![0x01])).unwrap();
    sm.remove_account(ALICE).unwrap();
    sm.update_account(Account::new(ALICE, vec![0x02])).unwrap();

    assert_eq!(sm.read_account(ALICE).unwrap().code, Bytes::from(vec![0x02]));

    // last write to the address key wins at flush time
    sm.flush().unwrap();
    assert_eq!(ledger.stored(&LedgerKey::account(ALICE)), Some(Bytes::from(vec![0x02])));
}

// -----------------------------------------------------------------------------
// Slots
// -----------------------------------------------------------------------------

#[test]
fn absent_slot_reads_as_zero_word() {
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);

    let slot = sm.read_slot(ALICE, SlotIndex::ONE).unwrap();
    assert_eq!(slot, Slot::new_empty(SlotIndex::ONE));
}

#[test]
fn slot_read_left_pads_short_ledger_values() {
    let ledger = InstrumentedLedger::new();
    ledger.seed(LedgerKey::slot(ALICE, SlotIndex::ONE), vec![0x12, 0x34]);
    let sm = state_manager(&ledger);

    let slot = sm.read_slot(ALICE, SlotIndex::ONE).unwrap();
    assert_eq!(slot.value, SlotValue::from(0x1234u64));
}

#[test]
fn oversized_slot_value_is_rejected() {
    let ledger = InstrumentedLedger::new();
    ledger.seed(LedgerKey::slot(ALICE, SlotIndex::ONE), vec![0xff; 33]);
    let sm = state_manager(&ledger);

    let err = sm.read_slot(ALICE, SlotIndex::ONE).unwrap_err();
    assert!(err.is_value_too_large());
}

#[test]
fn written_slot_is_read_back_from_cache_before_flush() {
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);
    let key = LedgerKey::slot(ALICE, SlotIndex::ONE);

    sm.set_slot(ALICE, Slot::new(SlotIndex::ONE, SlotValue::from(7u64))).unwrap();

    assert_eq!(sm.read_slot(ALICE, SlotIndex::ONE).unwrap().value, SlotValue::from(7u64));
    assert_eq!(ledger.reads_of(&key), 0);
}

#[test]
fn flushed_slot_is_visible_to_a_fresh_state_manager() {
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);

    sm.set_slot(ALICE, Slot::new(SlotIndex::ONE, SlotValue::from(7u64))).unwrap();
    sm.flush().unwrap();

    let fresh = state_manager(&ledger);
    assert_eq!(fresh.read_slot(ALICE, SlotIndex::ONE).unwrap().value, SlotValue::from(7u64));
}

#[test]
fn slot_reads_do_not_populate_cache_by_default() {
    let ledger = InstrumentedLedger::new();
    let key = LedgerKey::slot(ALICE, SlotIndex::ONE);
    ledger.seed(key.clone(), vec![0x01]);
    let sm = state_manager(&ledger);

    sm.read_slot(ALICE, SlotIndex::ONE).unwrap();
    sm.read_slot(ALICE, SlotIndex::ONE).unwrap();
    assert_eq!(ledger.reads_of(&key), 2);
}

#[test]
fn slot_reads_populate_cache_when_enabled() {
    let ledger = InstrumentedLedger::new();
    let key = LedgerKey::slot(ALICE, SlotIndex::ONE);
    ledger.seed(key.clone(), vec![0x01]);
    let sm = StateManager::new(Arc::clone(&ledger) as Arc<dyn Ledger>, true);

    sm.read_slot(ALICE, SlotIndex::ONE).unwrap();
    sm.read_slot(ALICE, SlotIndex::ONE).unwrap();
    assert_eq!(ledger.reads_of(&key), 1);
}

#[test]
fn deleted_account_storage_remains_readable() {
    // account deletion does not tombstone storage: a recreated account
    // observes its pre-deletion slots
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);

    sm.update_account(Account::new(ALICE, vec![0x01])).unwrap();
    sm.set_slot(ALICE, Slot::new(SlotIndex::ONE, SlotValue::from(7u64))).unwrap();
    sm.flush().unwrap();

    sm.remove_account(ALICE).unwrap();
    assert_eq!(sm.read_slot(ALICE, SlotIndex::ONE).unwrap().value, SlotValue::from(7u64));

    sm.update_account(Account::new(ALICE, vec![0x02])).unwrap();
    assert_eq!(sm.read_slot(ALICE, SlotIndex::ONE).unwrap().value, SlotValue::from(7u64));
}

// -----------------------------------------------------------------------------
// Flush
// -----------------------------------------------------------------------------

#[test]
fn flush_with_no_pending_writes_is_a_noop() {
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);

    assert_eq!(sm.flush().unwrap(), 0);
}

#[test]
fn flush_coalesces_writes_to_the_same_key() {
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);
    let key = LedgerKey::slot(ALICE, SlotIndex::ONE);

    sm.set_slot(ALICE, Slot::new(SlotIndex::ONE, SlotValue::from(1u64))).unwrap();
    sm.set_slot(ALICE, Slot::new(SlotIndex::ONE, SlotValue::from(2u64))).unwrap();

    assert_eq!(sm.flush().unwrap(), 1);
    assert_eq!(ledger.writes_of(&key), 1);
    assert_eq!(ledger.stored(&key), Some(Bytes::from(SlotValue::from(2u64).to_be_bytes().as_slice())));
}

#[test]
fn flush_issues_one_write_per_dirty_key() {
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);

    sm.update_account(Account::new(ALICE, vec![0x01])).unwrap();
    sm.set_slot(ALICE, Slot::new(SlotIndex::ONE, SlotValue::from(1u64))).unwrap();
    sm.set_slot(BOB, Slot::new(SlotIndex::ZERO, SlotValue::from(2u64))).unwrap();
    sm.remove_account(BOB).unwrap();

    assert_eq!(sm.flush().unwrap(), 4);
    assert_eq!(sm.pending_writes_len(), 0);
}

#[test]
fn failed_flush_keeps_unapplied_writes_pending_and_is_retriable() {
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);
    let alice_key = LedgerKey::slot(ALICE, SlotIndex::ONE);
    let bob_key = LedgerKey::slot(BOB, SlotIndex::ONE);
    let alice_account_key = LedgerKey::account(ALICE);

    sm.set_slot(ALICE, Slot::new(SlotIndex::ONE, SlotValue::from(1u64))).unwrap();
    sm.set_slot(BOB, Slot::new(SlotIndex::ONE, SlotValue::from(2u64))).unwrap();
    sm.update_account(Account::new(ALICE, vec![0x01])).unwrap();

    // fail the second write: the first stays committed, the rest stays pending
    ledger.fail_writes_of(Some(bob_key.clone()));
    assert!(sm.flush().is_err());
    assert!(ledger.stored(&alice_key).is_some());
    assert!(ledger.stored(&bob_key).is_none());
    assert_eq!(sm.pending_writes_len(), 2);

    // retry only issues the writes still pending
    ledger.fail_writes_of(None);
    assert_eq!(sm.flush().unwrap(), 2);
    assert!(ledger.stored(&bob_key).is_some());
    assert!(ledger.stored(&alice_account_key).is_some());
    assert_eq!(ledger.writes_of(&alice_key), 1);
}

#[test]
fn flush_applies_account_deletes_to_the_ledger() {
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);
    let key = LedgerKey::account(ALICE);

    sm.update_account(Account::new(ALICE, vec![0x01])).unwrap();
    sm.flush().unwrap();
    assert!(ledger.stored(&key).is_some());

    sm.remove_account(ALICE).unwrap();
    sm.flush().unwrap();
    assert!(ledger.stored(&key).is_none());

    let fresh = state_manager(&ledger);
    assert_eq!(fresh.read_account(ALICE).unwrap(), Account::new_empty(ALICE));
}

// -----------------------------------------------------------------------------
// General state
// -----------------------------------------------------------------------------

#[test]
fn reset_returns_to_fresh_transaction_state() {
    let ledger = InstrumentedLedger::new();
    let key = LedgerKey::account(ALICE);
    ledger.seed(key.clone(), vec![0x01]);
    let sm = state_manager(&ledger);

    sm.read_account(ALICE).unwrap();
    sm.remove_account(BOB).unwrap();
    sm.reset();

    assert_eq!(sm.pending_writes_len(), 0);
    assert_eq!(sm.read_account(BOB).unwrap(), Account::new_empty(BOB));
    sm.read_account(ALICE).unwrap();
    assert_eq!(ledger.reads_of(&key), 2);
}

#[test]
fn account_lifecycle_scenario() {
    let ledger = InstrumentedLedger::new();
    let sm = state_manager(&ledger);
    let key = LedgerKey::account(ALICE);

    // read on empty ledger
    assert_eq!(sm.read_account(ALICE).unwrap(), Account::new_empty(ALICE));

    // create
    sm.update_account(Account::new(ALICE, vec![0x60, 0xfe])).unwrap();

    // read is a cache hit
    let reads_before = ledger.reads_of(&key);
    assert_eq!(sm.read_account(ALICE).unwrap().code, Bytes::from(vec![0x60, 0xfe]));
    assert_eq!(ledger.reads_of(&key), reads_before);

    // delete
    sm.remove_account(ALICE).unwrap();
    assert_eq!(sm.read_account(ALICE).unwrap(), Account::new_empty(ALICE));
}
