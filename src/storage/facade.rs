// WalletStorage - the single coherent API over the six wallet indices
//
// External callers go through the facade; it dispatches reads and writes
// to the owning index and performs the cross-index bookkeeping a write
// implies. Multi-step writes are not transactional: recovery after a
// crash is forward-repair through validate(), never rollback.

use crate::index::{
    AddressIndex, HistoryIndex, NanoContractIndex, TokenIndex, UtxoIndex, UtxoSelectIter,
    WalletIndex,
};
use crate::storage::store::{StorageStats, StoreError, WalletDb};
use crate::storage::StorageError;
use crate::types::{AddressInfo, HistoryTx, UtxoFilter};
use std::path::Path;
use tracing::{debug, trace};

/// Composed wallet storage
///
/// Owns no data beyond the composition; every record belongs to exactly
/// one index. Single logical owner per wallet instance, no internal
/// locking.
pub struct WalletStorage {
    db: WalletDb,
    addresses: AddressIndex,
    history: HistoryIndex,
    tokens: TokenIndex,
    utxos: UtxoIndex,
    nano_contracts: NanoContractIndex,
    wallet: WalletIndex,
}

impl WalletStorage {
    /// Open or create wallet storage at the given path
    ///
    /// Each index checks its schema version marker and fails fast on a
    /// mismatch.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = WalletDb::open(path)?;
        Ok(Self {
            addresses: AddressIndex::open(db.clone())?,
            history: HistoryIndex::open(db.clone())?,
            tokens: TokenIndex::open(db.clone())?,
            utxos: UtxoIndex::open(db.clone())?,
            nano_contracts: NanoContractIndex::open(db.clone())?,
            wallet: WalletIndex::open(db.clone())?,
            db,
        })
    }

    // ========================================================================
    // INDEX ACCESS
    // ========================================================================

    /// Raw access to the underlying store, for maintenance tooling
    pub fn db(&self) -> &WalletDb {
        &self.db
    }

    pub fn addresses(&self) -> &AddressIndex {
        &self.addresses
    }

    pub fn addresses_mut(&mut self) -> &mut AddressIndex {
        &mut self.addresses
    }

    pub fn history(&self) -> &HistoryIndex {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryIndex {
        &mut self.history
    }

    pub fn tokens(&self) -> &TokenIndex {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut TokenIndex {
        &mut self.tokens
    }

    pub fn utxos(&self) -> &UtxoIndex {
        &self.utxos
    }

    pub fn utxos_mut(&mut self) -> &mut UtxoIndex {
        &mut self.utxos
    }

    pub fn nano_contracts(&self) -> &NanoContractIndex {
        &self.nano_contracts
    }

    pub fn nano_contracts_mut(&mut self) -> &mut NanoContractIndex {
        &mut self.nano_contracts
    }

    pub fn wallet(&self) -> &WalletIndex {
        &self.wallet
    }

    pub fn wallet_mut(&mut self) -> &mut WalletIndex {
        &mut self.wallet
    }

    // ========================================================================
    // CROSS-INDEX WRITES
    // ========================================================================

    /// Save a newly derived address and maintain the wallet pointers
    ///
    /// Fails with `DuplicateAddress` when the address exists. The first
    /// address ever saved seeds `current_address_index`; an index beyond
    /// `last_loaded_address_index` raises that pointer.
    pub fn save_address(&mut self, info: &AddressInfo) -> Result<(), StorageError> {
        let first_ever = self.addresses.address_count()? == 0;
        self.addresses.save_address(info)?;
        trace!(address = %info.address, bip32_index = info.bip32_index, "address saved");

        if first_ever {
            self.wallet
                .set_current_address_index(info.bip32_index as i64)?;
        }
        if info.bip32_index > self.wallet.last_loaded_address_index()? {
            self.wallet.set_last_loaded_address_index(info.bip32_index)?;
        }
        Ok(())
    }

    /// Save a transaction and advance the used/current address pointers
    ///
    /// Scans the transaction for addresses owned by this wallet; when the
    /// maximum touched derivation index exceeds `last_used_address_index`,
    /// that pointer advances to it and `current_address_index` becomes
    /// `min(max_touched + 1, last_loaded_address_index)` so that the
    /// next-to-hand-out address never outruns what has been derived.
    pub fn save_tx(&mut self, tx: &HistoryTx) -> Result<(), StorageError> {
        self.history.save_tx(tx)?;
        trace!(tx_id = %tx.tx_id, "transaction saved");

        let mut max_touched: Option<u32> = None;
        for address in tx.addresses() {
            if let Some(info) = self.addresses.get_address_info(address)? {
                max_touched = Some(max_touched.map_or(info.bip32_index, |m| m.max(info.bip32_index)));
            }
        }

        if let Some(touched) = max_touched {
            if (touched as i64) > self.wallet.last_used_address_index()? {
                self.wallet.set_last_used_address_index(touched as i64)?;
                let last_loaded = self.wallet.last_loaded_address_index()?;
                let next = touched.saturating_add(1).min(last_loaded);
                self.wallet.set_current_address_index(next as i64)?;
            }
        }
        Ok(())
    }

    /// Address at `current_address_index`
    ///
    /// With `mark_as_used`, advances the pointer by one, clamped to
    /// `last_loaded_address_index`.
    pub fn get_current_address(&mut self, mark_as_used: bool) -> Result<Option<String>, StorageError> {
        let current = self.wallet.current_address_index()?;
        if current < 0 {
            return Ok(None);
        }
        let address = self.addresses.get_address_at_index(current as u32)?;
        if address.is_some() && mark_as_used {
            let last_loaded = self.wallet.last_loaded_address_index()?;
            let next = (current as u32).saturating_add(1).min(last_loaded);
            self.wallet.set_current_address_index(next as i64)?;
        }
        Ok(address)
    }

    // ========================================================================
    // UTXO QUERIES
    // ========================================================================

    /// Filtered, value-ordered UTXO stream with the current network
    /// height injected
    pub fn select_utxos(&self, filter: &UtxoFilter) -> Result<UtxoSelectIter, StorageError> {
        let height = self.wallet.current_height()?;
        self.utxos.select_utxos(filter, height)
    }

    /// Best network height known to the wallet
    pub fn current_height(&self) -> Result<u64, StorageError> {
        self.wallet.current_height()
    }

    pub fn set_current_height(&mut self, height: u64) -> Result<(), StorageError> {
        self.wallet.set_current_height(height)
    }

    /// Move every matured locked UTXO into the unlocked index
    ///
    /// Returns how many UTXOs were unlocked.
    pub fn process_locked_utxos(&mut self) -> Result<usize, StorageError> {
        let height = self.wallet.current_height()?;
        let now = chrono::Utc::now().timestamp().max(0) as u64;

        let mut matured = Vec::new();
        for entry in self.utxos.iter_locked_utxos() {
            let utxo = entry?;
            if utxo.is_available(now, height) {
                matured.push(utxo.id());
            }
        }

        let count = matured.len();
        for id in matured {
            self.utxos.unlock_utxo(&id)?;
        }
        if count > 0 {
            debug!(count, "unlocked matured utxos");
        }
        Ok(count)
    }

    // ========================================================================
    // VALIDATION AND MAINTENANCE
    // ========================================================================

    /// Re-establish every cross-index invariant
    ///
    /// Runs each index validation in a fixed order; later passes assume
    /// earlier indices are already internally consistent. Idempotent and
    /// safe on a partially-updated store.
    pub fn validate(&mut self) -> Result<(), StorageError> {
        self.addresses.validate()?;
        self.history.validate()?;
        self.utxos.validate()?;
        self.tokens.validate()?;
        self.wallet.validate()?;
        self.nano_contracts.validate()?;
        debug!("storage validated");
        Ok(())
    }

    /// Composite selective wipe
    ///
    /// Clearing history also clears UTXOs (they derive from history);
    /// clearing addresses resets the wallet address pointers; clearing
    /// tokens also clears nano contract registrations.
    pub fn clean_storage(
        &mut self,
        clean_history: bool,
        clean_addresses: bool,
        clean_tokens: bool,
    ) -> Result<(), StorageError> {
        if clean_history {
            self.history.clear()?;
            self.utxos.clear()?;
        }
        if clean_addresses {
            self.addresses.clear()?;
            self.wallet.reset_address_pointers()?;
        }
        if clean_tokens {
            self.tokens.clear(true, true)?;
            self.nano_contracts.clear()?;
        }
        Ok(())
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        Ok(self.db.flush()?)
    }

    /// Get storage statistics
    pub fn stats(&self) -> StorageStats {
        self.db.stats()
    }
}
