// UTXO records and the selection filter contract

use crate::types::token::NATIVE_TOKEN_UID;
use serde::{Deserialize, Serialize};

/// Identity of a UTXO: the transaction that created it and the output slot
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtxoId {
    pub tx_id: String,
    pub index: u32,
}

/// An unspent transaction output paying this wallet
///
/// Created when a transaction output pays the wallet; deleted when spent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoRecord {
    pub tx_id: String,
    /// Output slot within the creating transaction
    pub index: u32,
    /// Token uid
    pub token: String,
    /// Address the output pays to
    pub address: String,
    pub value: u64,
    /// Authority bitmask; zero for value-bearing outputs
    pub authorities: u8,
    /// Unix timestamp before which the UTXO cannot be spent
    pub timelock: Option<u64>,
    /// Block height before which the UTXO cannot be spent
    pub heightlock: Option<u64>,
}

impl UtxoRecord {
    pub fn id(&self) -> UtxoId {
        UtxoId {
            tx_id: self.tx_id.clone(),
            index: self.index,
        }
    }

    /// Whether this UTXO carries authority flags instead of plain value
    pub fn is_authority(&self) -> bool {
        self.authorities != 0
    }

    /// Whether both lock conditions have elapsed
    pub fn is_available(&self, now: u64, height: u64) -> bool {
        self.timelock.map_or(true, |t| t <= now) && self.heightlock.map_or(true, |h| h <= height)
    }
}

/// Iteration order of `select_utxos` over UTXO values
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValueOrder {
    Asc,
    #[default]
    Desc,
}

/// Filter options for `select_utxos`
///
/// `target_amount` (accumulate until reached) and `max_amount` (never
/// exceed) are mutually exclusive; setting both is an `InvalidFilter`
/// contract error.
#[derive(Clone, Debug)]
pub struct UtxoFilter {
    /// Token uid to select from
    pub token: String,
    /// Exact authority bitmask to match; zero selects value-bearing UTXOs
    pub authorities: u8,
    /// Restrict to a single address (uses the address-scoped index)
    pub address: Option<String>,
    /// Stop the scan once the accumulated value reaches this target
    pub target_amount: Option<u64>,
    /// Skip UTXOs that would push the accumulated value past this cap
    pub max_amount: Option<u64>,
    /// Yield only UTXOs with value strictly below this bound
    pub amount_smaller_than: Option<u64>,
    /// Yield only UTXOs with value strictly above this bound
    pub amount_bigger_than: Option<u64>,
    /// Exclude UTXOs whose time or height lock has not elapsed
    pub only_available: bool,
    pub order_by_value: ValueOrder,
}

impl Default for UtxoFilter {
    fn default() -> Self {
        Self {
            token: NATIVE_TOKEN_UID.to_string(),
            authorities: 0,
            address: None,
            target_amount: None,
            max_amount: None,
            amount_smaller_than: None,
            amount_bigger_than: None,
            only_available: true,
            order_by_value: ValueOrder::Desc,
        }
    }
}

impl UtxoFilter {
    /// Filter for a token with all other options at their defaults
    pub fn for_token(token: &str) -> Self {
        Self {
            token: token.to_string(),
            ..Self::default()
        }
    }
}
