// Fast selection - greedy, optimized for scan length

use crate::selection::result::SelectionResult;
use crate::storage::{StorageError, WalletStorage};
use crate::types::UtxoFilter;

/// Greedily accumulate UTXOs in stream order until the target is covered
///
/// Relies on the query layer's target filter to stop the underlying scan
/// early, so this touches as few records as possible. The selection is
/// not necessarily minimal.
pub fn fast_selection(
    storage: &WalletStorage,
    token: &str,
    target_amount: u64,
) -> Result<SelectionResult, StorageError> {
    let filter = UtxoFilter {
        target_amount: Some(target_amount),
        ..UtxoFilter::for_token(token)
    };

    let mut utxos = Vec::new();
    let mut amount = 0u64;
    for entry in storage.select_utxos(&filter)? {
        let utxo = entry?;
        amount = amount.saturating_add(utxo.value);
        utxos.push(utxo);
        if amount >= target_amount {
            break;
        }
    }

    if amount < target_amount {
        return Ok(SelectionResult::insufficient(amount));
    }
    Ok(SelectionResult::selected(utxos, amount))
}
