// WalletDb - Persistent key-value storage using sled
//
// One physical ordered key-value database backs every wallet index.
// Indices namespace their keys with short string prefixes and store a
// schema version marker that is checked when the index is opened.

use crate::storage::encoding;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

/// Key prefix for per-index schema version markers
const VERSION_PREFIX: &[u8] = b"version:";

/// Errors from low-level store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to open database: {0}")]
    OpenFailed(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Schema version mismatch in {store} store: found {found}, expected {expected}")]
    VersionMismatch {
        store: &'static str,
        found: u32,
        expected: u32,
    },

    #[error("Flush failed: {0}")]
    FlushFailed(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::DatabaseError(err.to_string())
    }
}

/// Serialize a record to its stored byte form
pub(crate) fn encode_record<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    postcard::to_allocvec(value).map_err(|e| StoreError::SerializationFailed(e.to_string()))
}

/// Deserialize a record from its stored byte form
pub(crate) fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    postcard::from_bytes(bytes).map_err(|e| StoreError::DeserializationFailed(e.to_string()))
}

/// Statistics about the storage
#[derive(Clone, Debug)]
pub struct StorageStats {
    /// Number of keys in the database
    pub key_count: usize,
    /// Approximate disk size in bytes
    pub disk_size_bytes: u64,
}

/// Persistent key-value store shared by all wallet indices
///
/// Uses sled for crash-safe, embedded storage. Writes are durable after
/// flush; multi-key updates are sequential, not transactional, and are
/// reconciled by the index validation passes after a crash.
#[derive(Clone)]
pub struct WalletDb {
    db: sled::Db,
}

impl WalletDb {
    /// Open or create a store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::OpenFailed(e.to_string()))?;
        Ok(Self { db })
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::FlushFailed(e.to_string()))?;
        Ok(())
    }

    /// Get storage statistics
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            key_count: self.db.len(),
            disk_size_bytes: self.db.size_on_disk().unwrap_or(0),
        }
    }

    // ========================================================================
    // RAW KEY-VALUE OPERATIONS
    // ========================================================================

    /// Put raw bytes
    pub fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db.insert(key, value)?;
        Ok(())
    }

    /// Get raw bytes
    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    /// Delete a key
    pub fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.db.remove(key)?;
        Ok(())
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.db.contains_key(key)?)
    }

    /// Lazy cursor over all entries with a given prefix, in key order
    pub fn scan_prefix(&self, prefix: &[u8]) -> sled::Iter {
        self.db.scan_prefix(prefix)
    }

    /// Lazy cursor over the half-open key range `[start, end)`, in key order
    pub fn range(&self, range: Range<Vec<u8>>) -> sled::Iter {
        self.db.range(range)
    }

    /// Count all entries with a given prefix by linear scan
    pub fn count_prefix(&self, prefix: &[u8]) -> Result<u64, StoreError> {
        let mut count = 0u64;
        for entry in self.db.scan_prefix(prefix) {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    /// Delete all keys with a given prefix
    pub fn delete_with_prefix(&self, prefix: &[u8]) -> Result<usize, StoreError> {
        let mut deleted = 0;
        for result in self.db.scan_prefix(prefix) {
            let (key, _) = result?;
            self.db.remove(key)?;
            deleted += 1;
        }
        Ok(deleted)
    }

    // ========================================================================
    // TYPED RECORD OPERATIONS
    // ========================================================================

    /// Put a serializable record
    pub fn put_record<T: Serialize>(&self, key: &[u8], value: &T) -> Result<(), StoreError> {
        let bytes = encode_record(value)?;
        self.put_raw(key, &bytes)
    }

    /// Get a record, `None` on a read miss
    pub fn get_record<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, StoreError> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(decode_record(&bytes)?)),
            None => Ok(None),
        }
    }

    // ========================================================================
    // SCHEMA VERSION MARKERS
    // ========================================================================

    /// Check the schema version marker of a named sub-store
    ///
    /// Writes the marker if the sub-store has never been opened before;
    /// fails fast with `VersionMismatch` if the on-disk marker differs
    /// from what the running code expects.
    pub fn check_version(&self, store: &'static str, expected: u32) -> Result<(), StoreError> {
        let key = [VERSION_PREFIX, store.as_bytes()].concat();
        match self.get_raw(&key)? {
            Some(bytes) => {
                let found = encoding::parse_u32_hex(&bytes)?;
                if found != expected {
                    return Err(StoreError::VersionMismatch {
                        store,
                        found,
                        expected,
                    });
                }
                Ok(())
            }
            None => self.put_raw(&key, encoding::u32_hex(expected).as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_store_basic() {
        let temp_dir = TempDir::new().unwrap();
        let store = WalletDb::open(temp_dir.path()).unwrap();

        store.put_raw(b"test", b"value").unwrap();
        let result = store.get_raw(b"test").unwrap();

        assert_eq!(result, Some(b"value".to_vec()));
    }

    #[test]
    fn test_store_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = WalletDb::open(temp_dir.path()).unwrap();
            store.put_raw(b"persist", b"data").unwrap();
            store.flush().unwrap();
        }

        {
            let store = WalletDb::open(temp_dir.path()).unwrap();
            let result = store.get_raw(b"persist").unwrap();
            assert_eq!(result, Some(b"data".to_vec()));
        }
    }

    #[test]
    fn test_version_marker_written_once() {
        let temp_dir = TempDir::new().unwrap();
        let store = WalletDb::open(temp_dir.path()).unwrap();

        store.check_version("demo", 1).unwrap();
        store.check_version("demo", 1).unwrap();

        let err = store.check_version("demo", 2).unwrap_err();
        match err {
            StoreError::VersionMismatch {
                store: name,
                found,
                expected,
            } => {
                assert_eq!(name, "demo");
                assert_eq!(found, 1);
                assert_eq!(expected, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
