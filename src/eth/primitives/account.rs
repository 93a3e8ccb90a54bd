use display_json::DebugAsJson;

use crate::eth::primitives::Address;
use crate::eth::primitives::Bytes;

/// Ethereum account as persisted in the ledger: its address and contract code.
///
/// Empty code means the account has no code. The ledger representation cannot
/// distinguish a codeless account from an absent one, so reads of either
/// produce the same empty account.
#[derive(DebugAsJson, Clone, Default, PartialEq, Eq, fake::Dummy, serde::Deserialize, serde::Serialize)]
pub struct Account {
    /// Immutable address of the account.
    pub address: Address,

    /// Contract bytecode. Empty if the account is not a contract.
    pub code: Bytes,
}

impl Account {
    /// Creates a new account with the given code.
    pub fn new(address: Address, code: impl Into<Bytes>) -> Self {
        Self { address, code: code.into() }
    }

    /// Creates a new empty account.
    ///
    /// This is the canonical value returned for deleted and absent accounts.
    pub fn new_empty(address: Address) -> Self {
        Self {
            address,
            code: Bytes::default(),
        }
    }

    /// Checks if the account has contract code.
    pub fn is_contract(&self) -> bool {
        !self.code.is_empty()
    }
}
