// UtxoIndex - canonical UTXO table, two value-ordered reverse indices,
// and the locked-UTXO sub-store
//
// Reverse-index keys embed the value as fixed-width big-endian hex, so a
// plain range scan over the key space is already a value-sorted scan.
// Every write fans out to all three representations; validate() is the
// reconciliation pass that re-derives them from the canonical table.

use crate::index::CountState;
use crate::storage::encoding::{prefix_upper_bound, u32_hex, u64_hex, u8_hex};
use crate::storage::decode_record;
use crate::storage::{StorageError, StoreError, WalletDb};
use crate::types::{UtxoFilter, UtxoId, UtxoRecord, ValueOrder};
use tracing::{debug, warn};

mod keys {
    /// tx id ':' output index (hex8) -> UtxoRecord
    pub const UTXO: &[u8] = b"utxo:";
    /// authorities ':' token ':' value ':' tx id ':' index -> UtxoRecord
    pub const TOKEN_UTXO: &[u8] = b"token:utxo:";
    /// authorities ':' token ':' address ':' value ':' tx id ':' index -> UtxoRecord
    pub const ADDRESS_UTXO: &[u8] = b"token:address:utxo:";
    /// tx id ':' output index (hex8) -> UtxoRecord awaiting its unlock
    pub const LOCKED: &[u8] = b"locked:utxo:";
}

const STORE_NAME: &str = "utxo";
const SCHEMA_VERSION: u32 = 1;

fn utxo_key(id: &UtxoId) -> Vec<u8> {
    [
        keys::UTXO,
        id.tx_id.as_bytes(),
        b":",
        u32_hex(id.index).as_bytes(),
    ]
    .concat()
}

fn locked_key(id: &UtxoId) -> Vec<u8> {
    [
        keys::LOCKED,
        id.tx_id.as_bytes(),
        b":",
        u32_hex(id.index).as_bytes(),
    ]
    .concat()
}

/// Scan prefix of the token-scoped reverse index, up to the value field
fn token_scan_prefix(authorities: u8, token: &str) -> Vec<u8> {
    [
        keys::TOKEN_UTXO,
        u8_hex(authorities).as_bytes(),
        b":",
        token.as_bytes(),
        b":",
    ]
    .concat()
}

/// Scan prefix of the address-scoped reverse index, up to the value field
fn address_scan_prefix(authorities: u8, token: &str, address: &str) -> Vec<u8> {
    [
        keys::ADDRESS_UTXO,
        u8_hex(authorities).as_bytes(),
        b":",
        token.as_bytes(),
        b":",
        address.as_bytes(),
        b":",
    ]
    .concat()
}

fn token_index_key(utxo: &UtxoRecord) -> Vec<u8> {
    [
        token_scan_prefix(utxo.authorities, &utxo.token).as_slice(),
        u64_hex(utxo.value).as_bytes(),
        b":",
        utxo.tx_id.as_bytes(),
        b":",
        u32_hex(utxo.index).as_bytes(),
    ]
    .concat()
}

fn address_index_key(utxo: &UtxoRecord) -> Vec<u8> {
    [
        address_scan_prefix(utxo.authorities, &utxo.token, &utxo.address).as_slice(),
        u64_hex(utxo.value).as_bytes(),
        b":",
        utxo.tx_id.as_bytes(),
        b":",
        u32_hex(utxo.index).as_bytes(),
    ]
    .concat()
}

/// UTXO index
///
/// The canonical table is keyed by (tx id, output index); both reverse
/// indices and the locked sub-store carry full copies of the record. A
/// UTXO lives either in the unlocked tables or in the locked sub-store,
/// never both.
pub struct UtxoIndex {
    db: WalletDb,
    count: CountState,
}

impl UtxoIndex {
    pub(crate) fn open(db: WalletDb) -> Result<Self, StoreError> {
        db.check_version(STORE_NAME, SCHEMA_VERSION)?;
        Ok(Self {
            db,
            count: CountState::Unvalidated,
        })
    }

    /// Save a UTXO into the canonical table and both reverse indices
    ///
    /// The three writes are sequential, not transactional; validate()
    /// re-derives the reverse entries after an interrupted write.
    pub fn save_utxo(&mut self, utxo: &UtxoRecord) -> Result<(), StorageError> {
        let existed = self.db.contains(&utxo_key(&utxo.id()))?;
        self.db.put_record(&utxo_key(&utxo.id()), utxo)?;
        self.db.put_record(&token_index_key(utxo), utxo)?;
        self.db.put_record(&address_index_key(utxo), utxo)?;
        if !existed {
            self.count.increment();
        }
        Ok(())
    }

    /// Delete a spent UTXO from all three representations
    pub fn delete_utxo(&mut self, id: &UtxoId) -> Result<(), StorageError> {
        let Some(utxo) = self.get_utxo(id)? else {
            return Ok(());
        };
        self.db.delete(&utxo_key(id))?;
        self.db.delete(&token_index_key(&utxo))?;
        self.db.delete(&address_index_key(&utxo))?;
        self.count.decrement();
        Ok(())
    }

    pub fn get_utxo(&self, id: &UtxoId) -> Result<Option<UtxoRecord>, StorageError> {
        Ok(self.db.get_record(&utxo_key(id))?)
    }

    /// Number of unlocked UTXOs (cached only when validated)
    pub fn utxo_count(&self) -> Result<u64, StorageError> {
        if let Some(n) = self.count.validated() {
            return Ok(n);
        }
        Ok(self.db.count_prefix(keys::UTXO)?)
    }

    // ========================================================================
    // SELECTION QUERY
    // ========================================================================

    /// Value-ordered, filtered scan over the reverse indices
    ///
    /// Chooses the address-scoped index when the filter names an address.
    /// Amount bounds become key-range bounds; `target_amount` and
    /// `max_amount` shape the scan while it runs. Fails with
    /// `InvalidFilter` when both are set.
    pub fn select_utxos(
        &self,
        filter: &UtxoFilter,
        network_height: u64,
    ) -> Result<UtxoSelectIter, StorageError> {
        if filter.target_amount.is_some() && filter.max_amount.is_some() {
            return Err(StorageError::InvalidFilter(
                "target_amount and max_amount are mutually exclusive".to_string(),
            ));
        }

        let prefix = match &filter.address {
            Some(address) => address_scan_prefix(filter.authorities, &filter.token, address),
            None => token_scan_prefix(filter.authorities, &filter.token),
        };

        // Upper bound: exclusive at amount_smaller_than, since every key
        // with that value sorts at or after prefix + value hex.
        let upper = match filter.amount_smaller_than {
            Some(v) => [prefix.as_slice(), u64_hex(v).as_bytes()].concat(),
            None => prefix_upper_bound(&prefix),
        };

        // Lower bound: first key with value amount_bigger_than + 1.
        let lower = match filter.amount_bigger_than {
            Some(v) => match v.checked_add(1) {
                Some(min) => [prefix.as_slice(), u64_hex(min).as_bytes()].concat(),
                // No representable value qualifies; empty range
                None => upper.clone(),
            },
            None => prefix,
        };

        Ok(UtxoSelectIter {
            inner: self.db.range(lower..upper),
            descending: filter.order_by_value == ValueOrder::Desc,
            only_available: filter.only_available,
            now: chrono::Utc::now().timestamp().max(0) as u64,
            height: network_height,
            target_amount: filter.target_amount,
            max_amount: filter.max_amount,
            accumulated: 0,
            done: false,
        })
    }

    // ========================================================================
    // LOCKED SUB-STORE
    // ========================================================================

    /// Park a UTXO in the locked sub-store until its condition elapses
    pub fn save_locked_utxo(&mut self, utxo: &UtxoRecord) -> Result<(), StorageError> {
        Ok(self.db.put_record(&locked_key(&utxo.id()), utxo)?)
    }

    /// Move a UTXO from the locked sub-store into the unlocked index
    ///
    /// A move, never a copy: the locked entry is removed. No-op when the
    /// UTXO is not in the locked sub-store.
    pub fn unlock_utxo(&mut self, id: &UtxoId) -> Result<(), StorageError> {
        let Some(utxo) = self.db.get_record::<UtxoRecord>(&locked_key(id))? else {
            return Ok(());
        };
        self.db.delete(&locked_key(id))?;
        self.save_utxo(&utxo)
    }

    /// Lazy iteration over the locked sub-store
    pub fn iter_locked_utxos(&self) -> LockedUtxoIter {
        LockedUtxoIter {
            inner: self.db.scan_prefix(keys::LOCKED),
        }
    }

    // ========================================================================
    // VALIDATION
    // ========================================================================

    /// Reconcile both reverse indices against the canonical table
    ///
    /// Missing or stale reverse entries are rewritten from the canonical
    /// record; orphaned reverse entries are deleted. A UTXO present in
    /// both the canonical and locked tables is contradictory and is not
    /// auto-repaired.
    pub fn validate(&mut self) -> Result<u64, StorageError> {
        let mut count = 0u64;
        for entry in self.db.scan_prefix(keys::UTXO) {
            let (_key, value) = entry.map_err(StoreError::from)?;
            let utxo: UtxoRecord = decode_record(&value)?;

            if self.db.contains(&locked_key(&utxo.id()))? {
                return Err(StorageError::InconsistentState(format!(
                    "utxo {}:{} present in both the unlocked and locked tables",
                    utxo.tx_id, utxo.index
                )));
            }

            for key in [token_index_key(&utxo), address_index_key(&utxo)] {
                match self.db.get_record::<UtxoRecord>(&key)? {
                    Some(existing) if existing == utxo => {}
                    Some(_) => {
                        warn!(tx_id = %utxo.tx_id, index = utxo.index,
                            "rewriting stale reverse utxo entry from canonical record");
                        self.db.put_record(&key, &utxo)?;
                    }
                    None => {
                        debug!(tx_id = %utxo.tx_id, index = utxo.index,
                            "repairing missing reverse utxo entry");
                        self.db.put_record(&key, &utxo)?;
                    }
                }
            }
            count += 1;
        }

        for prefix in [keys::TOKEN_UTXO, keys::ADDRESS_UTXO] {
            for entry in self.db.scan_prefix(prefix) {
                let (key, value) = entry.map_err(StoreError::from)?;
                let utxo: UtxoRecord = decode_record(&value)?;
                if !self.db.contains(&utxo_key(&utxo.id()))? {
                    warn!(tx_id = %utxo.tx_id, index = utxo.index,
                        "deleting orphaned reverse utxo entry");
                    self.db.delete(&key)?;
                }
            }
        }

        self.count = CountState::Validated(count);
        Ok(count)
    }

    /// Remove every UTXO, locked entries included
    pub(crate) fn clear(&mut self) -> Result<(), StorageError> {
        self.db.delete_with_prefix(keys::UTXO)?;
        self.db.delete_with_prefix(keys::TOKEN_UTXO)?;
        self.db.delete_with_prefix(keys::ADDRESS_UTXO)?;
        self.db.delete_with_prefix(keys::LOCKED)?;
        self.count = CountState::Validated(0);
        Ok(())
    }
}

/// Lazy, value-ordered cursor produced by `select_utxos`
///
/// Pull-based: consumers that stop early just drop the iterator, which
/// releases the underlying cursor. Nothing is mutated by the scan.
pub struct UtxoSelectIter {
    inner: sled::Iter,
    descending: bool,
    only_available: bool,
    now: u64,
    height: u64,
    target_amount: Option<u64>,
    max_amount: Option<u64>,
    accumulated: u64,
    done: bool,
}

impl Iterator for UtxoSelectIter {
    type Item = Result<UtxoRecord, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(target) = self.target_amount {
            if self.accumulated >= target {
                self.done = true;
                return None;
            }
        }
        loop {
            let entry = if self.descending {
                self.inner.next_back()?
            } else {
                self.inner.next()?
            };
            let (_key, value) = match entry {
                Ok(pair) => pair,
                Err(e) => return Some(Err(StoreError::from(e).into())),
            };
            let utxo: UtxoRecord = match decode_record(&value) {
                Ok(utxo) => utxo,
                Err(e) => return Some(Err(e.into())),
            };
            if self.only_available && !utxo.is_available(self.now, self.height) {
                continue;
            }
            if let Some(max) = self.max_amount {
                if self.accumulated.saturating_add(utxo.value) > max {
                    continue;
                }
            }
            self.accumulated = self.accumulated.saturating_add(utxo.value);
            return Some(Ok(utxo));
        }
    }
}

/// Lazy cursor over the locked sub-store
pub struct LockedUtxoIter {
    inner: sled::Iter,
}

impl Iterator for LockedUtxoIter {
    type Item = Result<UtxoRecord, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.inner.next()?;
        match entry {
            Ok((_key, value)) => Some(decode_record(&value).map_err(StorageError::from)),
            Err(e) => Some(Err(StoreError::from(e).into())),
        }
    }
}
