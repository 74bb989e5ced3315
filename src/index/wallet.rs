// WalletIndex - wallet-scoped scalars, each under its own key
//
// Scalars are individually addressable (not one blob) with defaults when
// absent. Numbers go through the shared fixed-width hex helpers so every
// wallet uses one canonical numeric serialization.

use crate::storage::encoding::{i64_hex, parse_i64_hex, parse_u64_hex, u64_hex};
use crate::storage::{StorageError, StoreError, WalletDb};
use crate::types::ScanPolicy;
use tracing::debug;

mod keys {
    pub const CURRENT_ADDRESS_INDEX: &[u8] = b"wallet:current_address_index";
    pub const LAST_USED_ADDRESS_INDEX: &[u8] = b"wallet:last_used_address_index";
    pub const LAST_LOADED_ADDRESS_INDEX: &[u8] = b"wallet:last_loaded_address_index";
    pub const CURRENT_HEIGHT: &[u8] = b"wallet:current_height";
    pub const SCAN_POLICY: &[u8] = b"wallet:scan_policy";
    pub const ACCESS_DATA: &[u8] = b"access:data";
    /// Escape hatch for forward-compatible extension fields
    pub const GENERIC: &[u8] = b"generic:";
}

const STORE_NAME: &str = "wallet";
const SCHEMA_VERSION: u32 = 1;

fn generic_key(key: &str) -> Vec<u8> {
    [keys::GENERIC, key.as_bytes()].concat()
}

/// Wallet scalar index; exactly one logical instance per wallet
pub struct WalletIndex {
    db: WalletDb,
}

impl WalletIndex {
    pub(crate) fn open(db: WalletDb) -> Result<Self, StoreError> {
        db.check_version(STORE_NAME, SCHEMA_VERSION)?;
        Ok(Self { db })
    }

    fn get_i64(&self, key: &[u8], default: i64) -> Result<i64, StorageError> {
        match self.db.get_raw(key)? {
            Some(bytes) => Ok(parse_i64_hex(&bytes)?),
            None => Ok(default),
        }
    }

    fn set_i64(&mut self, key: &[u8], value: i64) -> Result<(), StorageError> {
        Ok(self.db.put_raw(key, i64_hex(value).as_bytes())?)
    }

    fn get_u64(&self, key: &[u8], default: u64) -> Result<u64, StorageError> {
        match self.db.get_raw(key)? {
            Some(bytes) => Ok(parse_u64_hex(&bytes)?),
            None => Ok(default),
        }
    }

    fn set_u64(&mut self, key: &[u8], value: u64) -> Result<(), StorageError> {
        Ok(self.db.put_raw(key, u64_hex(value).as_bytes())?)
    }

    // ========================================================================
    // ADDRESS POINTERS
    // ========================================================================

    /// Derivation index of the next address to hand out; -1 until any
    /// address has been saved
    pub fn current_address_index(&self) -> Result<i64, StorageError> {
        self.get_i64(keys::CURRENT_ADDRESS_INDEX, -1)
    }

    pub fn set_current_address_index(&mut self, value: i64) -> Result<(), StorageError> {
        self.set_i64(keys::CURRENT_ADDRESS_INDEX, value)
    }

    /// Highest derivation index seen in any saved transaction; -1 until
    /// any address has been used
    pub fn last_used_address_index(&self) -> Result<i64, StorageError> {
        self.get_i64(keys::LAST_USED_ADDRESS_INDEX, -1)
    }

    pub fn set_last_used_address_index(&mut self, value: i64) -> Result<(), StorageError> {
        self.set_i64(keys::LAST_USED_ADDRESS_INDEX, value)
    }

    /// Highest derivation index ever loaded/derived
    pub fn last_loaded_address_index(&self) -> Result<u32, StorageError> {
        Ok(self.get_u64(keys::LAST_LOADED_ADDRESS_INDEX, 0)? as u32)
    }

    pub fn set_last_loaded_address_index(&mut self, value: u32) -> Result<(), StorageError> {
        self.set_u64(keys::LAST_LOADED_ADDRESS_INDEX, value as u64)
    }

    // ========================================================================
    // NETWORK STATE
    // ========================================================================

    /// Best network height known to the wallet
    pub fn current_height(&self) -> Result<u64, StorageError> {
        self.get_u64(keys::CURRENT_HEIGHT, 0)
    }

    pub fn set_current_height(&mut self, height: u64) -> Result<(), StorageError> {
        self.set_u64(keys::CURRENT_HEIGHT, height)
    }

    // ========================================================================
    // SCANNING POLICY
    // ========================================================================

    /// Address-scanning policy; defaults to the gap-limit policy
    pub fn scan_policy(&self) -> Result<ScanPolicy, StorageError> {
        Ok(self
            .db
            .get_record::<ScanPolicy>(keys::SCAN_POLICY)?
            .unwrap_or_default())
    }

    pub fn set_scan_policy(&mut self, policy: &ScanPolicy) -> Result<(), StorageError> {
        Ok(self.db.put_record(keys::SCAN_POLICY, policy)?)
    }

    /// Gap limit of the current policy, when it is a gap-limit policy
    pub fn gap_limit(&self) -> Result<Option<u32>, StorageError> {
        match self.scan_policy()? {
            ScanPolicy::Gap { gap_limit } => Ok(Some(gap_limit)),
            ScanPolicy::Index { .. } => Ok(None),
        }
    }

    // ========================================================================
    // ACCESS DATA AND GENERIC ITEMS
    // ========================================================================

    /// Opaque encrypted access data blob
    pub fn get_access_data(&self) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.db.get_raw(keys::ACCESS_DATA)?)
    }

    pub fn save_access_data(&mut self, data: &[u8]) -> Result<(), StorageError> {
        Ok(self.db.put_raw(keys::ACCESS_DATA, data)?)
    }

    /// Get an extension item, `None` on a miss
    pub fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.db.get_raw(&generic_key(key))?)
    }

    pub fn set_item(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        Ok(self.db.put_raw(&generic_key(key), value)?)
    }

    // ========================================================================
    // VALIDATION
    // ========================================================================

    /// Clamp the address pointers back into their invariant ranges
    ///
    /// current <= last_loaded and last_used <= last_loaded, with -1 as
    /// the "none yet" sentinel floor. Forward repair for interrupted
    /// multi-step facade writes.
    pub fn validate(&mut self) -> Result<(), StorageError> {
        let last_loaded = self.last_loaded_address_index()? as i64;

        let current = self.current_address_index()?;
        let clamped = current.clamp(-1, last_loaded);
        if clamped != current {
            debug!(current, clamped, "clamping current address index");
            self.set_current_address_index(clamped)?;
        }

        let last_used = self.last_used_address_index()?;
        let clamped = last_used.clamp(-1, last_loaded);
        if clamped != last_used {
            debug!(last_used, clamped, "clamping last used address index");
            self.set_last_used_address_index(clamped)?;
        }

        Ok(())
    }

    /// Reset the address pointers to their pristine defaults
    pub(crate) fn reset_address_pointers(&mut self) -> Result<(), StorageError> {
        self.db.delete(keys::CURRENT_ADDRESS_INDEX)?;
        self.db.delete(keys::LAST_USED_ADDRESS_INDEX)?;
        self.db.delete(keys::LAST_LOADED_ADDRESS_INDEX)?;
        Ok(())
    }
}
