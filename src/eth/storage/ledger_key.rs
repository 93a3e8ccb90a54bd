use std::fmt::Display;

use crate::eth::primitives::Address;
use crate::eth::primitives::SlotIndex;

/// Key under which an entity is stored in the ledger.
///
/// Derivation is deterministic and collision-free: account keys are the 40
/// lowercase hex chars of the address, slot keys are the address hex followed
/// by the 64 hex chars of the big-endian slot index. The two key spaces have
/// different lengths, so they can never collide.
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct LedgerKey(String);

impl LedgerKey {
    /// Derives the ledger key of an account record.
    pub fn account(address: Address) -> Self {
        Self(const_hex::encode(address.0))
    }

    /// Derives the ledger key of a storage slot.
    pub fn slot(address: Address, index: SlotIndex) -> Self {
        let mut key = String::with_capacity(104);
        key.push_str(&const_hex::encode(address.0));
        key.push_str(&const_hex::encode(index.to_be_bytes()));
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Display for LedgerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
