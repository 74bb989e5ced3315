// HistoryIndex - transaction records by id and by (timestamp, id)

use crate::index::CountState;
use crate::storage::encoding::u64_hex;
use crate::storage::decode_record;
use crate::storage::{StorageError, StoreError, WalletDb};
use crate::types::HistoryTx;
use tracing::debug;

mod keys {
    /// tx id -> HistoryTx
    pub const HISTORY: &[u8] = b"history:";
    /// timestamp (hex16) ':' tx id -> empty, points into the by-id table
    pub const TS_HISTORY: &[u8] = b"ts_history:";
}

const STORE_NAME: &str = "history";
const SCHEMA_VERSION: u32 = 1;

// Length of "hex16:" between the prefix and the tx id
const TS_COMPONENT_LEN: usize = 17;

fn history_key(tx_id: &str) -> Vec<u8> {
    [keys::HISTORY, tx_id.as_bytes()].concat()
}

fn ts_key(timestamp: u64, tx_id: &str) -> Vec<u8> {
    [
        keys::TS_HISTORY,
        u64_hex(timestamp).as_bytes(),
        b":",
        tx_id.as_bytes(),
    ]
    .concat()
}

/// Transaction history index
///
/// The by-id table is canonical; the by-timestamp table is derived and
/// repaired by `validate()`.
pub struct HistoryIndex {
    db: WalletDb,
    count: CountState,
}

impl HistoryIndex {
    pub(crate) fn open(db: WalletDb) -> Result<Self, StoreError> {
        db.check_version(STORE_NAME, SCHEMA_VERSION)?;
        Ok(Self {
            db,
            count: CountState::Unvalidated,
        })
    }

    /// Idempotent upsert into both the by-id and by-timestamp tables
    pub fn save_tx(&mut self, tx: &HistoryTx) -> Result<(), StorageError> {
        let existed = self.db.contains(&history_key(&tx.tx_id))?;
        self.db.put_record(&history_key(&tx.tx_id), tx)?;
        self.db.put_raw(&ts_key(tx.timestamp, &tx.tx_id), &[])?;
        if !existed {
            self.count.increment();
        }
        Ok(())
    }

    /// Get a transaction by id, `None` on a miss
    pub fn get_tx(&self, tx_id: &str) -> Result<Option<HistoryTx>, StorageError> {
        Ok(self.db.get_record(&history_key(tx_id))?)
    }

    /// Number of stored transactions (cached only when validated)
    pub fn history_count(&self) -> Result<u64, StorageError> {
        if let Some(n) = self.count.validated() {
            return Ok(n);
        }
        Ok(self.db.count_prefix(keys::HISTORY)?)
    }

    /// Lazy iteration in ascending (timestamp, tx id) order
    ///
    /// With a token uid, yields only transactions where at least one input
    /// or output references that token; the filter is applied during
    /// iteration, not via a separate index.
    pub fn history_iter(&self, token: Option<&str>) -> HistoryIter {
        HistoryIter {
            db: self.db.clone(),
            inner: self.db.scan_prefix(keys::TS_HISTORY),
            token: token.map(str::to_string),
        }
    }

    /// Reconcile the timestamp table against the by-id table
    ///
    /// Inserts any missing timestamp entry and recomputes the count.
    pub fn validate(&mut self) -> Result<u64, StorageError> {
        let mut count = 0u64;
        for entry in self.db.scan_prefix(keys::HISTORY) {
            let (_key, value) = entry.map_err(StoreError::from)?;
            let tx: HistoryTx = decode_record(&value)?;
            let ts = ts_key(tx.timestamp, &tx.tx_id);
            if !self.db.contains(&ts)? {
                debug!(tx_id = %tx.tx_id, "repairing missing timestamp history entry");
                self.db.put_raw(&ts, &[])?;
            }
            count += 1;
        }
        self.count = CountState::Validated(count);
        Ok(count)
    }

    /// Remove every history record
    pub(crate) fn clear(&mut self) -> Result<(), StorageError> {
        self.db.delete_with_prefix(keys::HISTORY)?;
        self.db.delete_with_prefix(keys::TS_HISTORY)?;
        self.count = CountState::Validated(0);
        Ok(())
    }
}

/// Lazy cursor over history in (timestamp, tx id) order
pub struct HistoryIter {
    db: WalletDb,
    inner: sled::Iter,
    token: Option<String>,
}

impl Iterator for HistoryIter {
    type Item = Result<HistoryTx, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = self.inner.next()?;
            let (key, _value) = match entry {
                Ok(pair) => pair,
                Err(e) => return Some(Err(StoreError::from(e).into())),
            };
            let Some(suffix) = key.get(keys::TS_HISTORY.len() + TS_COMPONENT_LEN..) else {
                return Some(Err(StoreError::DeserializationFailed(format!(
                    "malformed timestamp history key: {}",
                    String::from_utf8_lossy(&key)
                ))
                .into()));
            };
            let tx_id = String::from_utf8_lossy(suffix).into_owned();
            let tx = match self.db.get_record::<HistoryTx>(&history_key(&tx_id)) {
                // Dangling timestamp entry: skipped here, the by-id table wins
                Ok(None) => continue,
                Ok(Some(tx)) => tx,
                Err(e) => return Some(Err(e.into())),
            };
            if let Some(uid) = &self.token {
                if !tx.touches_token(uid) {
                    continue;
                }
            }
            return Some(Ok(tx));
        }
    }
}
