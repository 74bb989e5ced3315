// Selection module - strategies that assemble transaction inputs
//
// Both strategies consume the facade's value-descending UTXO stream and
// never handle authority UTXOs. Insufficient funds is reported through
// the result, never raised.

mod best;
mod fast;
mod result;

pub use best::best_selection;
pub use fast::fast_selection;
pub use result::SelectionResult;
