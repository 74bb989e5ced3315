// Token records - definitions, balances and aggregate metadata

use serde::{Deserialize, Serialize};

/// Token uid of the chain's native token
pub const NATIVE_TOKEN_UID: &str = "00";

/// A token definition known to the wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenData {
    /// Token uid (hex transaction id that created it, `"00"` for native)
    pub uid: String,
    pub name: String,
    pub symbol: String,
}

/// Balance of a single token, split by lock state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub unlocked: u64,
    pub locked: u64,
}

impl TokenBalance {
    pub fn new(unlocked: u64, locked: u64) -> Self {
        Self { unlocked, locked }
    }

    pub fn total(&self) -> u64 {
        self.unlocked.saturating_add(self.locked)
    }
}

/// Aggregate counters for a token across the whole wallet
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Number of wallet transactions touching this token
    pub num_transactions: u64,
    /// Value-bearing balance
    pub balance: TokenBalance,
    /// Mint-authority balance (count of mint authority UTXOs)
    pub mint: TokenBalance,
    /// Melt-authority balance (count of melt authority UTXOs)
    pub melt: TokenBalance,
}

/// Partial update merged onto an existing `TokenMetadata`
///
/// Absent fields leave the stored value untouched.
#[derive(Clone, Debug, Default)]
pub struct TokenMetaUpdate {
    pub num_transactions: Option<u64>,
    pub balance: Option<TokenBalance>,
    pub mint: Option<TokenBalance>,
    pub melt: Option<TokenBalance>,
}

impl TokenMetadata {
    /// Merge a partial update onto this metadata
    pub fn apply(&mut self, update: &TokenMetaUpdate) {
        if let Some(n) = update.num_transactions {
            self.num_transactions = n;
        }
        if let Some(b) = update.balance {
            self.balance = b;
        }
        if let Some(b) = update.mint {
            self.mint = b;
        }
        if let Some(b) = update.melt {
            self.melt = b;
        }
    }
}
