// Index module - the six denormalized wallet indices
//
// Each index namespaces its keys inside the shared WalletDb, keeps a
// validation-gated cardinality counter, and knows how to repair its own
// derived entries after an interrupted write.

mod address;
mod history;
mod nano_contract;
mod token;
mod utxo;
mod wallet;

pub use address::{AddressIndex, AddressIter};
pub use history::{HistoryIndex, HistoryIter};
pub use nano_contract::{NanoContractIndex, NanoContractIter};
pub use token::{TokenIndex, TokenIter};
pub use utxo::{LockedUtxoIter, UtxoIndex, UtxoSelectIter};
pub use wallet::WalletIndex;

/// Validation-gated cardinality counter
///
/// A cached count may only be trusted after a successful `validate()`;
/// until then every count is a linear scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountState {
    Unvalidated,
    Validated(u64),
}

impl CountState {
    /// The trusted count, if the index has been validated
    pub fn validated(&self) -> Option<u64> {
        match self {
            CountState::Validated(n) => Some(*n),
            CountState::Unvalidated => None,
        }
    }

    /// Maintain the trusted count across an insertion
    pub(crate) fn increment(&mut self) {
        if let CountState::Validated(n) = self {
            *n += 1;
        }
    }

    /// Maintain the trusted count across a deletion
    pub(crate) fn decrement(&mut self) {
        if let CountState::Validated(n) = self {
            *n = n.saturating_sub(1);
        }
    }
}
