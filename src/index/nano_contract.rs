// NanoContractIndex - registered nano contract instances

use crate::index::CountState;
use crate::storage::decode_record;
use crate::storage::{StorageError, StoreError, WalletDb};
use crate::types::NanoContractData;

mod keys {
    /// contract id -> NanoContractData
    pub const NANO: &[u8] = b"nano:";
}

const STORE_NAME: &str = "nano_contract";
const SCHEMA_VERSION: u32 = 1;

fn nano_key(nc_id: &str) -> Vec<u8> {
    [keys::NANO, nc_id.as_bytes()].concat()
}

/// Registered nano contract index
pub struct NanoContractIndex {
    db: WalletDb,
    count: CountState,
}

impl NanoContractIndex {
    pub(crate) fn open(db: WalletDb) -> Result<Self, StoreError> {
        db.check_version(STORE_NAME, SCHEMA_VERSION)?;
        Ok(Self {
            db,
            count: CountState::Unvalidated,
        })
    }

    pub fn register_nano_contract(&mut self, data: &NanoContractData) -> Result<(), StorageError> {
        let existed = self.db.contains(&nano_key(&data.nc_id))?;
        self.db.put_record(&nano_key(&data.nc_id), data)?;
        if !existed {
            self.count.increment();
        }
        Ok(())
    }

    pub fn unregister_nano_contract(&mut self, nc_id: &str) -> Result<(), StorageError> {
        if self.db.contains(&nano_key(nc_id))? {
            self.db.delete(&nano_key(nc_id))?;
            self.count.decrement();
        }
        Ok(())
    }

    pub fn is_nano_contract_registered(&self, nc_id: &str) -> Result<bool, StorageError> {
        Ok(self.db.contains(&nano_key(nc_id))?)
    }

    pub fn get_nano_contract(&self, nc_id: &str) -> Result<Option<NanoContractData>, StorageError> {
        Ok(self.db.get_record(&nano_key(nc_id))?)
    }

    /// Update only the registered address of a contract
    ///
    /// No-op when the contract is not registered.
    pub fn update_nano_contract_registered_address(
        &mut self,
        nc_id: &str,
        address: &str,
    ) -> Result<(), StorageError> {
        let Some(mut data) = self.get_nano_contract(nc_id)? else {
            return Ok(());
        };
        data.address = address.to_string();
        Ok(self.db.put_record(&nano_key(nc_id), &data)?)
    }

    /// Lazy iteration over all registered contracts
    pub fn registered_nano_contract_iter(&self) -> NanoContractIter {
        NanoContractIter {
            inner: self.db.scan_prefix(keys::NANO),
        }
    }

    /// Number of registered contracts (cached only when validated)
    pub fn nano_contract_count(&self) -> Result<u64, StorageError> {
        if let Some(n) = self.count.validated() {
            return Ok(n);
        }
        Ok(self.db.count_prefix(keys::NANO)?)
    }

    /// Recompute the registration count
    pub fn validate(&mut self) -> Result<u64, StorageError> {
        let count = self.db.count_prefix(keys::NANO)?;
        self.count = CountState::Validated(count);
        Ok(count)
    }

    /// Remove every registration
    pub(crate) fn clear(&mut self) -> Result<(), StorageError> {
        self.db.delete_with_prefix(keys::NANO)?;
        self.count = CountState::Validated(0);
        Ok(())
    }
}

/// Lazy cursor over registered nano contracts
pub struct NanoContractIter {
    inner: sled::Iter,
}

impl Iterator for NanoContractIter {
    type Item = Result<NanoContractData, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.inner.next()?;
        match entry {
            Ok((_key, value)) => Some(decode_record(&value).map_err(StorageError::from)),
            Err(e) => Some(Err(StoreError::from(e).into())),
        }
    }
}
