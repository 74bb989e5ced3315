// AddressIndex - address <-> derivation index mapping plus per-address metadata

use crate::index::CountState;
use crate::storage::encoding::u32_hex;
use crate::storage::decode_record;
use crate::storage::{StorageError, StoreError, WalletDb};
use crate::types::{AddressInfo, AddressMetadata, StoredAddressMeta};
use tracing::warn;

/// Key prefixes for the address namespaces
mod keys {
    /// base58 address -> AddressInfo
    pub const ADDRESS: &[u8] = b"address:";
    /// bip32 index (hex8) -> base58 address
    pub const INDEX: &[u8] = b"index:";
    /// base58 address -> StoredAddressMeta
    pub const META: &[u8] = b"meta:";
}

const STORE_NAME: &str = "address";
const SCHEMA_VERSION: u32 = 1;

fn address_key(address: &str) -> Vec<u8> {
    [keys::ADDRESS, address.as_bytes()].concat()
}

fn index_key(bip32_index: u32) -> Vec<u8> {
    [keys::INDEX, u32_hex(bip32_index).as_bytes()].concat()
}

fn meta_key(address: &str) -> Vec<u8> {
    [keys::META, address.as_bytes()].concat()
}

/// Bidirectional address index
///
/// The forward table (address -> info) is canonical; the reverse table
/// (index -> address) is derived and repaired by `validate()`.
pub struct AddressIndex {
    db: WalletDb,
    count: CountState,
}

impl AddressIndex {
    pub(crate) fn open(db: WalletDb) -> Result<Self, StoreError> {
        db.check_version(STORE_NAME, SCHEMA_VERSION)?;
        Ok(Self {
            db,
            count: CountState::Unvalidated,
        })
    }

    /// Save a new address; fails if the address already exists
    pub fn save_address(&mut self, info: &AddressInfo) -> Result<(), StorageError> {
        if self.address_exists(&info.address)? {
            return Err(StorageError::DuplicateAddress {
                address: info.address.clone(),
            });
        }
        self.db.put_record(&address_key(&info.address), info)?;
        self.db
            .put_raw(&index_key(info.bip32_index), info.address.as_bytes())?;
        self.count.increment();
        Ok(())
    }

    /// Get the full record for an address, `None` on a miss
    pub fn get_address_info(&self, address: &str) -> Result<Option<AddressInfo>, StorageError> {
        Ok(self.db.get_record(&address_key(address))?)
    }

    /// Get the address at a derivation index, `None` on a miss
    pub fn get_address_at_index(&self, bip32_index: u32) -> Result<Option<String>, StorageError> {
        match self.db.get_raw(&index_key(bip32_index))? {
            Some(bytes) => {
                let address = String::from_utf8(bytes)
                    .map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
                Ok(Some(address))
            }
            None => Ok(None),
        }
    }

    pub fn address_exists(&self, address: &str) -> Result<bool, StorageError> {
        Ok(self.db.contains(&address_key(address))?)
    }

    /// Number of saved addresses
    ///
    /// Returns the cached count when validated, otherwise performs a full
    /// linear count. Counting does not itself validate.
    pub fn address_count(&self) -> Result<u64, StorageError> {
        if let Some(n) = self.count.validated() {
            return Ok(n);
        }
        Ok(self.db.count_prefix(keys::ADDRESS)?)
    }

    /// Lazy iteration over all addresses, ordered by ascending bip32 index
    ///
    /// Each call opens a fresh cursor; dropping the iterator releases it.
    pub fn address_iter(&self) -> AddressIter {
        AddressIter {
            db: self.db.clone(),
            inner: self.db.scan_prefix(keys::INDEX),
        }
    }

    /// Store per-address aggregate metadata
    pub fn set_address_meta(
        &mut self,
        address: &str,
        meta: &AddressMetadata,
    ) -> Result<(), StorageError> {
        let stored = StoredAddressMeta::from(meta);
        Ok(self.db.put_record(&meta_key(address), &stored)?)
    }

    /// Get per-address aggregate metadata, `None` on a miss
    pub fn get_address_meta(&self, address: &str) -> Result<Option<AddressMetadata>, StorageError> {
        Ok(self
            .db
            .get_record::<StoredAddressMeta>(&meta_key(address))?
            .map(AddressMetadata::from))
    }

    /// Validate the index, repairing missing reverse entries
    ///
    /// Iterates the canonical table, writes any missing index->address
    /// entry, and recomputes the true count. A reverse entry bound to a
    /// different address is contradictory data and is not auto-repaired.
    /// Returns the observed (first, last) derivation indices.
    pub fn validate(&mut self) -> Result<Option<(u32, u32)>, StorageError> {
        let mut count = 0u64;
        let mut first: Option<u32> = None;
        let mut last: Option<u32> = None;

        for entry in self.db.scan_prefix(keys::ADDRESS) {
            let (_key, value) = entry.map_err(StoreError::from)?;
            let info: AddressInfo = decode_record(&value)?;

            match self.db.get_raw(&index_key(info.bip32_index))? {
                Some(existing) if existing != info.address.as_bytes() => {
                    return Err(StorageError::InconsistentState(format!(
                        "derivation index {} maps to address {} but record claims {}",
                        info.bip32_index,
                        String::from_utf8_lossy(&existing),
                        info.address
                    )));
                }
                Some(_) => {}
                None => {
                    warn!(
                        address = %info.address,
                        bip32_index = info.bip32_index,
                        "repairing missing reverse address entry"
                    );
                    self.db
                        .put_raw(&index_key(info.bip32_index), info.address.as_bytes())?;
                }
            }

            count += 1;
            first = Some(first.map_or(info.bip32_index, |f| f.min(info.bip32_index)));
            last = Some(last.map_or(info.bip32_index, |l| l.max(info.bip32_index)));
        }

        self.count = CountState::Validated(count);
        Ok(first.zip(last))
    }

    /// Remove every address record and all metadata
    pub(crate) fn clear(&mut self) -> Result<(), StorageError> {
        self.db.delete_with_prefix(keys::ADDRESS)?;
        self.db.delete_with_prefix(keys::INDEX)?;
        self.db.delete_with_prefix(keys::META)?;
        self.count = CountState::Validated(0);
        Ok(())
    }
}

/// Lazy cursor over addresses in derivation order
pub struct AddressIter {
    db: WalletDb,
    inner: sled::Iter,
}

impl Iterator for AddressIter {
    type Item = Result<AddressInfo, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.inner.next()?;
            let (_key, value) = match entry {
                Ok(pair) => pair,
                Err(e) => return Some(Err(StoreError::from(e).into())),
            };
            let address = String::from_utf8_lossy(&value).into_owned();
            match self.db.get_record::<AddressInfo>(&address_key(&address)) {
                // Dangling reverse entry: skipped here, repaired by validate()
                Ok(None) => continue,
                Ok(Some(info)) => return Some(Ok(info)),
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
