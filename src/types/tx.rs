// Transaction history records

use serde::{Deserialize, Serialize};

/// No authority: a plain value-bearing output
pub const AUTHORITY_NONE: u8 = 0;
/// Mint authority flag
pub const AUTHORITY_MINT: u8 = 1;
/// Melt authority flag
pub const AUTHORITY_MELT: u8 = 2;

/// An input of a history transaction (the output it spends)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxInput {
    /// Address the spent output paid to, when decodable
    pub address: Option<String>,
    /// Token uid of the spent output
    pub token: String,
    pub value: u64,
    /// Authority bitmask (`AUTHORITY_*`)
    pub authorities: u8,
}

/// An output of a history transaction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Address the output pays to, when decodable
    pub address: Option<String>,
    pub token: String,
    pub value: u64,
    /// Authority bitmask (`AUTHORITY_*`)
    pub authorities: u8,
    /// Unix timestamp before which the output cannot be spent
    pub timelock: Option<u64>,
}

/// A transaction in the wallet's history
///
/// Append-only ledger entry, immutable once saved; indexed by id and by
/// (timestamp, id) for ordered replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryTx {
    /// Hex transaction id
    pub tx_id: String,
    /// Unix timestamp
    pub timestamp: u64,
    /// Transaction version byte
    pub version: u8,
    pub weight: f64,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl HistoryTx {
    /// Whether any input or output references the given token
    pub fn touches_token(&self, uid: &str) -> bool {
        self.inputs.iter().any(|i| i.token == uid) || self.outputs.iter().any(|o| o.token == uid)
    }

    /// Addresses referenced by this transaction's inputs and outputs
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .filter_map(|i| i.address.as_deref())
            .chain(self.outputs.iter().filter_map(|o| o.address.as_deref()))
    }
}
