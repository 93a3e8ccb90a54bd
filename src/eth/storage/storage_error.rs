use crate::eth::storage::LedgerKey;

#[derive(Debug, thiserror::Error, strum::EnumIs)]
pub enum StorageError {
    /// Value read from the ledger does not fit in a storage slot word.
    #[error("Value of {len} bytes under key {key} does not fit in a 256-bit word.")]
    ValueTooLarge { key: LedgerKey, len: usize },

    /// Generic error interacting with the ledger.
    #[error("Unexpected ledger error: {0}")]
    Unexpected(#[from] anyhow::Error),
}
