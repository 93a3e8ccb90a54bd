use std::fmt::Debug;
use std::fmt::Display;
use std::str::FromStr;

use alloy_primitives::U256;
use fake::Dummy;
use fake::Faker;

use crate::gen_newtype_from;

/// Index of a storage slot inside a contract account.
#[derive(Clone, Copy, Default, Hash, Eq, PartialEq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct SlotIndex(pub U256);

impl SlotIndex {
    pub const ZERO: SlotIndex = SlotIndex(U256::ZERO);
    pub const ONE: SlotIndex = SlotIndex(U256::from_limbs([1, 0, 0, 0]));

    /// Converts itself to [`U256`].
    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Converts itself to a fixed-width big-endian byte array.
    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_be_bytes()
    }
}

impl Dummy<Faker> for SlotIndex {
    fn dummy_with_rng<R: rand::Rng + ?Sized>(_: &Faker, rng: &mut R) -> Self {
        rng.next_u64().into()
    }
}

impl Display for SlotIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Debug for SlotIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SlotIndex({:#x})", self.0)
    }
}

// -----------------------------------------------------------------------------
// Conversions: Other -> Self
// -----------------------------------------------------------------------------

gen_newtype_from!(self = SlotIndex, other = U256);

impl From<u64> for SlotIndex {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<[u8; 32]> for SlotIndex {
    fn from(value: [u8; 32]) -> Self {
        Self(U256::from_be_bytes(value))
    }
}

impl FromStr for SlotIndex {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self, Self::Err> {
        let inner = U256::from_str(s)?;
        Ok(SlotIndex(inner))
    }
}

// -----------------------------------------------------------------------------
// Conversions: Self -> Other
// -----------------------------------------------------------------------------

impl From<SlotIndex> for [u8; 32] {
    fn from(value: SlotIndex) -> [u8; 32] {
        value.to_be_bytes()
    }
}

impl From<SlotIndex> for U256 {
    fn from(value: SlotIndex) -> U256 {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gen_test_serde;

    gen_test_serde!(SlotIndex);
}
