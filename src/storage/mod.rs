// Storage module - PERSISTENCE
// One sled database, the key encodings that namespace it, and the
// facade that composes the wallet indices on top

pub(crate) mod encoding;
mod error;
mod facade;
mod store;

pub use error::StorageError;
pub use facade::WalletStorage;
pub use store::{StorageStats, StoreError, WalletDb};

pub(crate) use store::decode_record;
