mod account;
mod address;
mod bytes;
mod slot;
mod slot_index;
mod slot_value;

pub use account::Account;
pub use address::Address;
pub use bytes::Bytes;
pub use slot::Slot;
pub use slot_index::SlotIndex;
pub use slot_value::SlotValue;
