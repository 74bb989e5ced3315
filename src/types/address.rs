// Address records - derivation info and per-address aggregates

use crate::types::token::TokenBalance;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A derived wallet address and its bip32 derivation position
///
/// Immutable once saved; exactly one entry exists per derivation index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    /// Base58 address string
    pub address: String,
    /// Sequential bip32 derivation index
    pub bip32_index: u32,
    /// Public key material, opaque to this layer
    pub public_key: Option<Vec<u8>>,
}

/// Per-address aggregate counters, mutated as transactions are saved
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AddressMetadata {
    /// Number of wallet transactions touching this address
    pub num_transactions: u64,
    /// Balance per token uid
    pub balances: HashMap<String, TokenBalance>,
}

/// Stored form of `AddressMetadata`
///
/// The balance map crosses the serialization boundary as an explicit
/// list of (token uid, balance) pairs.
#[derive(Serialize, Deserialize)]
pub(crate) struct StoredAddressMeta {
    num_transactions: u64,
    balances: Vec<(String, TokenBalance)>,
}

impl From<&AddressMetadata> for StoredAddressMeta {
    fn from(meta: &AddressMetadata) -> Self {
        let mut balances: Vec<(String, TokenBalance)> = meta
            .balances
            .iter()
            .map(|(uid, balance)| (uid.clone(), *balance))
            .collect();
        // Deterministic stored order
        balances.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            num_transactions: meta.num_transactions,
            balances,
        }
    }
}

impl From<StoredAddressMeta> for AddressMetadata {
    fn from(stored: StoredAddressMeta) -> Self {
        Self {
            num_transactions: stored.num_transactions,
            balances: stored.balances.into_iter().collect(),
        }
    }
}
