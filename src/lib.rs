//! State-access layer between an EVM execution engine and a key-value ledger.
//!
//! The ledger exposes only point reads and writes (`read`/`write`/`delete` by
//! opaque key), each of which is comparatively expensive. This crate provides
//! the per-transaction [`StateManager`](eth::storage::StateManager) that caches
//! account code and storage slots in memory, tracks deleted accounts with
//! tombstones, and defers every mutation until a single batched
//! [`flush`](eth::storage::StateManager::flush).

pub mod config;
pub mod eth;
pub mod ext;
pub mod infra;
