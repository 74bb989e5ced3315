// Types module - the records persisted by the wallet indices

mod address;
mod nano_contract;
mod token;
mod tx;
mod utxo;
mod wallet;

pub use address::{AddressInfo, AddressMetadata};
pub(crate) use address::StoredAddressMeta;
pub use nano_contract::NanoContractData;
pub use token::{TokenBalance, TokenData, TokenMetaUpdate, TokenMetadata, NATIVE_TOKEN_UID};
pub use tx::{HistoryTx, TxInput, TxOutput, AUTHORITY_MELT, AUTHORITY_MINT, AUTHORITY_NONE};
pub use utxo::{UtxoFilter, UtxoId, UtxoRecord, ValueOrder};
pub use wallet::{ScanPolicy, DEFAULT_GAP_LIMIT};
