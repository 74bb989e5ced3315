// WalletStorage Facade Tests
// Cross-index bookkeeping, composite wipes, reopen, version gating

use tempfile::TempDir;
use walletstore::storage::{StoreError, WalletDb, WalletStorage};
use walletstore::types::{AddressInfo, HistoryTx, TokenData, TxOutput, NATIVE_TOKEN_UID};

fn address(b58: &str, bip32_index: u32) -> AddressInfo {
    AddressInfo {
        address: b58.to_string(),
        bip32_index,
        public_key: None,
    }
}

fn tx_to(seed: u8, addr: &str) -> HistoryTx {
    HistoryTx {
        tx_id: format!("{seed:02x}").repeat(32),
        timestamp: 1_000 + seed as u64,
        version: 1,
        weight: 17.5,
        inputs: vec![],
        outputs: vec![TxOutput {
            address: Some(addr.to_string()),
            token: NATIVE_TOKEN_UID.to_string(),
            value: 100,
            authorities: 0,
            timelock: None,
        }],
    }
}

// ============================================================================
// ADDRESS POINTER BOOKKEEPING
// ============================================================================

#[test]
fn test_first_address_seeds_current_pointer() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    storage.save_address(&address("W_addr_0", 0)).unwrap();

    assert_eq!(storage.wallet().current_address_index().unwrap(), 0);
    assert_eq!(storage.wallet().last_loaded_address_index().unwrap(), 0);

    // Later addresses only raise last_loaded
    storage.save_address(&address("W_addr_1", 1)).unwrap();
    storage.save_address(&address("W_addr_2", 2)).unwrap();
    assert_eq!(storage.wallet().current_address_index().unwrap(), 0);
    assert_eq!(storage.wallet().last_loaded_address_index().unwrap(), 2);
}

#[test]
fn test_first_address_seeds_current_pointer_despite_preset_value() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    // A pointer written before any address exists must not mask the seed;
    // "first ever" is a property of the address table, not of the pointer
    storage.wallet_mut().set_current_address_index(5).unwrap();

    storage.save_address(&address("W_addr_3", 3)).unwrap();

    assert_eq!(storage.wallet().current_address_index().unwrap(), 3);
}

#[test]
fn test_save_tx_advances_used_and_current_pointers() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    for i in 0..5 {
        storage.save_address(&address(&format!("W_addr_{i}"), i)).unwrap();
    }

    storage.save_tx(&tx_to(1, "W_addr_2")).unwrap();

    assert_eq!(storage.wallet().last_used_address_index().unwrap(), 2);
    assert_eq!(storage.wallet().current_address_index().unwrap(), 3);
}

#[test]
fn test_save_tx_pointer_never_outruns_loaded_addresses() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    storage.save_address(&address("W_addr_0", 0)).unwrap();
    storage.save_address(&address("W_addr_1", 1)).unwrap();

    // Touching the highest derived address clamps current at last_loaded
    storage.save_tx(&tx_to(1, "W_addr_1")).unwrap();

    assert_eq!(storage.wallet().last_used_address_index().unwrap(), 1);
    assert_eq!(storage.wallet().current_address_index().unwrap(), 1);
}

#[test]
fn test_save_tx_ignores_foreign_and_lower_addresses() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    for i in 0..5 {
        storage.save_address(&address(&format!("W_addr_{i}"), i)).unwrap();
    }
    storage.save_tx(&tx_to(1, "W_addr_3")).unwrap();

    // A foreign address changes nothing
    storage.save_tx(&tx_to(2, "W_not_ours")).unwrap();
    // Neither does one below last_used
    storage.save_tx(&tx_to(3, "W_addr_1")).unwrap();

    assert_eq!(storage.wallet().last_used_address_index().unwrap(), 3);
    assert_eq!(storage.wallet().current_address_index().unwrap(), 4);
}

#[test]
fn test_get_current_address_mark_as_used() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    assert_eq!(storage.get_current_address(false).unwrap(), None);

    for i in 0..3 {
        storage.save_address(&address(&format!("W_addr_{i}"), i)).unwrap();
    }

    // Peeking does not advance
    assert_eq!(
        storage.get_current_address(false).unwrap(),
        Some("W_addr_0".to_string())
    );
    assert_eq!(
        storage.get_current_address(true).unwrap(),
        Some("W_addr_0".to_string())
    );
    assert_eq!(
        storage.get_current_address(true).unwrap(),
        Some("W_addr_1".to_string())
    );
    assert_eq!(
        storage.get_current_address(true).unwrap(),
        Some("W_addr_2".to_string())
    );
    // Advance clamps at last_loaded: the final address keeps being handed out
    assert_eq!(
        storage.get_current_address(true).unwrap(),
        Some("W_addr_2".to_string())
    );
}

// ============================================================================
// COMPOSITE WIPES
// ============================================================================

fn populated_storage(temp_dir: &TempDir) -> WalletStorage {
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();
    storage.save_address(&address("W_addr_0", 0)).unwrap();
    storage.save_address(&address("W_addr_1", 1)).unwrap();
    storage.save_tx(&tx_to(1, "W_addr_0")).unwrap();
    storage
        .tokens_mut()
        .save_token(&TokenData {
            uid: "feed".to_string(),
            name: "Feed".to_string(),
            symbol: "FD".to_string(),
        })
        .unwrap();
    storage
}

#[test]
fn test_clean_history_clears_history_and_utxos_only() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = populated_storage(&temp_dir);

    storage.clean_storage(true, false, false).unwrap();

    assert_eq!(storage.history().history_count().unwrap(), 0);
    assert_eq!(storage.utxos().utxo_count().unwrap(), 0);
    assert_eq!(storage.addresses().address_count().unwrap(), 2);
    assert_eq!(storage.tokens().token_count().unwrap(), 1);
}

#[test]
fn test_clean_addresses_resets_wallet_pointers() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = populated_storage(&temp_dir);

    storage.clean_storage(false, true, false).unwrap();

    assert_eq!(storage.addresses().address_count().unwrap(), 0);
    assert_eq!(storage.wallet().current_address_index().unwrap(), -1);
    assert_eq!(storage.wallet().last_used_address_index().unwrap(), -1);
    assert_eq!(storage.wallet().last_loaded_address_index().unwrap(), 0);
    assert_eq!(storage.history().history_count().unwrap(), 1);
}

#[test]
fn test_clean_tokens_clears_tokens_and_nano_contracts() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = populated_storage(&temp_dir);

    storage.clean_storage(false, false, true).unwrap();

    assert_eq!(storage.tokens().token_count().unwrap(), 0);
    assert_eq!(storage.nano_contracts().nano_contract_count().unwrap(), 0);
    assert_eq!(storage.history().history_count().unwrap(), 1);
    assert_eq!(storage.addresses().address_count().unwrap(), 2);
}

// ============================================================================
// REOPEN AND VALIDATION
// ============================================================================

#[test]
fn test_state_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let mut storage = populated_storage(&temp_dir);
        storage.set_current_height(777).unwrap();
        storage.flush().unwrap();
    }

    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();
    assert_eq!(storage.addresses().address_count().unwrap(), 2);
    assert_eq!(storage.history().history_count().unwrap(), 1);
    assert_eq!(storage.current_height().unwrap(), 777);
    assert_eq!(storage.wallet().last_used_address_index().unwrap(), 0);
    assert_eq!(
        storage.get_current_address(false).unwrap(),
        Some("W_addr_1".to_string())
    );
}

#[test]
fn test_validate_is_idempotent_on_populated_storage() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = populated_storage(&temp_dir);

    storage.validate().unwrap();
    storage.validate().unwrap();

    assert_eq!(storage.addresses().address_count().unwrap(), 2);
    assert_eq!(storage.history().history_count().unwrap(), 1);
    assert_eq!(storage.tokens().token_count().unwrap(), 1);
}

#[test]
fn test_stats_report_size_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let storage = populated_storage(&temp_dir);

    // Disk size is only meaningful once buffered writes have landed
    storage.flush().unwrap();

    let stats = storage.stats();
    assert!(stats.key_count > 0);
    assert!(stats.disk_size_bytes > 0);
}

// ============================================================================
// SCHEMA VERSION GATING
// ============================================================================

#[test]
fn test_open_fails_on_version_mismatch() {
    let temp_dir = TempDir::new().unwrap();

    {
        let db = WalletDb::open(temp_dir.path()).unwrap();
        // Pretend a future release already migrated the address store
        db.put_raw(b"version:address", b"00000002").unwrap();
        db.flush().unwrap();
    }

    let err = WalletStorage::open(temp_dir.path())
        .err()
        .expect("open must fail on a newer schema");
    match err {
        StoreError::VersionMismatch {
            store,
            found,
            expected,
        } => {
            assert_eq!(store, "address");
            assert_eq!(found, 2);
            assert_eq!(expected, 1);
        }
        other => panic!("expected version mismatch, got {other:?}"),
    }
}
