use std::fmt::Display;

use alloy_primitives::U256;
use anyhow::anyhow;
use display_json::DebugAsJson;
use fake::Dummy;
use fake::Faker;

use crate::gen_newtype_from;

/// 256-bit word stored in a contract storage slot.
#[derive(DebugAsJson, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SlotValue(pub U256);

impl SlotValue {
    pub const ZERO: SlotValue = SlotValue(U256::ZERO);

    /// Checks if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Converts itself to [`U256`].
    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Converts itself to a fixed-width big-endian byte array.
    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_be_bytes()
    }

    /// Decodes a value read from the ledger, left-padding it to 256 bits.
    ///
    /// Absent keys are read as empty bytes and decode to the zero word. Values
    /// longer than 32 bytes cannot come from a well-formed slot write and are
    /// rejected.
    pub fn left_padded(bytes: &[u8]) -> anyhow::Result<Self> {
        if bytes.len() > 32 {
            return Err(anyhow!("slot value of {} bytes does not fit in a 256-bit word", bytes.len()));
        }
        let mut padded = [0u8; 32];
        padded[32 - bytes.len()..].copy_from_slice(bytes);
        Ok(Self(U256::from_be_bytes(padded)))
    }
}

impl Display for SlotValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Dummy<Faker> for SlotValue {
    fn dummy_with_rng<R: rand::Rng + ?Sized>(_: &Faker, rng: &mut R) -> Self {
        Self(U256::random_with(rng))
    }
}

// -----------------------------------------------------------------------------
// Conversions: Other -> Self
// -----------------------------------------------------------------------------

gen_newtype_from!(self = SlotValue, other = U256);

impl From<u64> for SlotValue {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<[u8; 32]> for SlotValue {
    fn from(value: [u8; 32]) -> Self {
        Self(U256::from_be_bytes(value))
    }
}

// -----------------------------------------------------------------------------
// Conversions: Self -> Other
// -----------------------------------------------------------------------------

impl From<SlotValue> for U256 {
    fn from(value: SlotValue) -> Self {
        value.0
    }
}

impl From<SlotValue> for Vec<u8> {
    fn from(value: SlotValue) -> Self {
        value.to_be_bytes().to_vec()
    }
}
