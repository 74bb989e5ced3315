// Domain-level error taxonomy for the storage layer

use crate::storage::store::StoreError;
use thiserror::Error;

/// Errors surfaced by the wallet indices and the storage facade
///
/// Read misses are not errors: read paths return `Ok(None)`. Selection
/// strategies report insufficient funds through their result, never
/// through this type.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Address already exists: {address}")]
    DuplicateAddress { address: String },

    #[error("Invalid UTXO filter: {0}")]
    InvalidFilter(String),

    #[error("Inconsistent store state: {0}")]
    InconsistentState(String),
}
