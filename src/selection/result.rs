// Outcome of a UTXO selection strategy

use crate::types::UtxoRecord;

/// Result of `fast_selection` or `best_selection`
///
/// On success `utxos` covers the target and `amount` is their sum. On
/// insufficient funds `utxos` is empty, `amount` is zero and `available`
/// carries the total the scan observed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionResult {
    pub utxos: Vec<UtxoRecord>,
    pub amount: u64,
    pub available: u64,
}

impl SelectionResult {
    pub(crate) fn selected(utxos: Vec<UtxoRecord>, amount: u64) -> Self {
        Self {
            utxos,
            amount,
            available: amount,
        }
    }

    pub(crate) fn insufficient(available: u64) -> Self {
        Self {
            utxos: Vec::new(),
            amount: 0,
            available,
        }
    }
}
