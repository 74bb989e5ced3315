// walletstore - Persistent multi-index storage layer for a UTXO wallet
//
// One sled database backs six mutually-consistent indices (addresses,
// transaction history, tokens, UTXOs, nano contracts, wallet scalars)
// behind a single storage facade, plus the UTXO selection strategies
// that query it.

pub mod index;
pub mod selection;
pub mod storage;
pub mod types;

pub use storage::{StorageError, StoreError, WalletStorage};
