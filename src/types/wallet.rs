// Wallet-wide scalar types

use serde::{Deserialize, Serialize};

/// Default number of consecutive unused addresses tolerated before address
/// derivation stops
pub const DEFAULT_GAP_LIMIT: u32 = 20;

/// Address-scanning policy used when loading/deriving addresses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanPolicy {
    /// Derive until `gap_limit` consecutive addresses are unused
    Gap { gap_limit: u32 },
    /// Derive a fixed window of derivation indices
    Index { start_index: u32, end_index: u32 },
}

impl Default for ScanPolicy {
    fn default() -> Self {
        ScanPolicy::Gap {
            gap_limit: DEFAULT_GAP_LIMIT,
        }
    }
}
