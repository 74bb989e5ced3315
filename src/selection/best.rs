// Best selection - tightest fit, optimized for input count and change

use crate::selection::result::SelectionResult;
use crate::storage::{StorageError, WalletStorage};
use crate::types::{UtxoFilter, UtxoRecord};

/// Pick the tightest-fitting selection for the target
///
/// Scans the full value-descending stream tracking an exact match (return
/// immediately), the smallest single UTXO still covering the target, and
/// a running set of sub-target UTXOs. Stops early once a single-UTXO
/// candidate exists and the stream has dropped below the target, or once
/// the sub-target set alone covers it. Resolution order: exact match,
/// then best-fit single UTXO, then the accumulated set, else
/// insufficient funds.
///
/// One UTXO beats many (fewer future inputs), and the smallest
/// sufficient UTXO beats a larger one (less change waste). The
/// early-stop rule is a heuristic, not an optimality proof, and is part
/// of the documented contract.
pub fn best_selection(
    storage: &WalletStorage,
    token: &str,
    target_amount: u64,
) -> Result<SelectionResult, StorageError> {
    let filter = UtxoFilter::for_token(token);

    let mut best_fit: Option<UtxoRecord> = None;
    let mut smaller: Vec<UtxoRecord> = Vec::new();
    let mut smaller_sum = 0u64;

    for entry in storage.select_utxos(&filter)? {
        let utxo = entry?;
        if utxo.value == target_amount {
            return Ok(SelectionResult::selected(vec![utxo], target_amount));
        }
        if utxo.value > target_amount {
            // Descending stream: each qualifying UTXO is no larger than
            // the previous candidate
            best_fit = Some(utxo);
        } else {
            if best_fit.is_some() {
                // Everything from here on is below target and cannot
                // improve on the established single-UTXO fit
                break;
            }
            smaller_sum = smaller_sum.saturating_add(utxo.value);
            smaller.push(utxo);
            if smaller_sum >= target_amount {
                break;
            }
        }
    }

    if let Some(utxo) = best_fit {
        let amount = utxo.value;
        return Ok(SelectionResult::selected(vec![utxo], amount));
    }
    if smaller_sum >= target_amount {
        return Ok(SelectionResult::selected(smaller, smaller_sum));
    }
    Ok(SelectionResult::insufficient(smaller_sum))
}
