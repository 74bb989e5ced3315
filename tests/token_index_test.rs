// TokenIndex Tests
// Definitions, metadata merge, registered subset, selective clear

use tempfile::TempDir;
use walletstore::storage::WalletStorage;
use walletstore::types::{TokenBalance, TokenData, TokenMetaUpdate, TokenMetadata};

fn token(uid: &str, symbol: &str) -> TokenData {
    TokenData {
        uid: uid.to_string(),
        name: format!("{symbol} token"),
        symbol: symbol.to_string(),
    }
}

// ============================================================================
// DEFINITIONS AND METADATA
// ============================================================================

#[test]
fn test_save_and_get_token() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    let data = token("abc123", "ABC");
    storage.tokens_mut().save_token(&data).unwrap();

    assert_eq!(storage.tokens().get_token("abc123").unwrap(), Some(data));
    assert_eq!(storage.tokens().get_token("missing").unwrap(), None);
    assert_eq!(storage.tokens().token_count().unwrap(), 1);
}

#[test]
fn test_metadata_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    let meta = TokenMetadata {
        num_transactions: 12,
        balance: TokenBalance::new(500, 20),
        mint: TokenBalance::new(1, 0),
        melt: TokenBalance::default(),
    };
    storage.tokens_mut().save_metadata("abc123", &meta).unwrap();

    assert_eq!(
        storage.tokens().get_token_meta("abc123").unwrap(),
        Some(meta)
    );
}

#[test]
fn test_edit_token_meta_merges_partially() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    let meta = TokenMetadata {
        num_transactions: 12,
        balance: TokenBalance::new(500, 20),
        mint: TokenBalance::new(1, 0),
        melt: TokenBalance::default(),
    };
    storage.tokens_mut().save_metadata("abc123", &meta).unwrap();

    storage
        .tokens_mut()
        .edit_token_meta(
            "abc123",
            &TokenMetaUpdate {
                num_transactions: Some(13),
                ..TokenMetaUpdate::default()
            },
        )
        .unwrap();

    let merged = storage.tokens().get_token_meta("abc123").unwrap().unwrap();
    assert_eq!(merged.num_transactions, 13);
    // Untouched fields survive the merge
    assert_eq!(merged.balance, TokenBalance::new(500, 20));
    assert_eq!(merged.mint, TokenBalance::new(1, 0));
}

#[test]
fn test_edit_token_meta_starts_from_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    storage
        .tokens_mut()
        .edit_token_meta(
            "fresh",
            &TokenMetaUpdate {
                balance: Some(TokenBalance::new(9, 0)),
                ..TokenMetaUpdate::default()
            },
        )
        .unwrap();

    let meta = storage.tokens().get_token_meta("fresh").unwrap().unwrap();
    assert_eq!(meta.balance, TokenBalance::new(9, 0));
    assert_eq!(meta.num_transactions, 0);
}

// ============================================================================
// REGISTERED SUBSET
// ============================================================================

#[test]
fn test_register_and_unregister() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    let data = token("abc123", "ABC");
    storage.tokens_mut().register_token(&data).unwrap();

    assert!(storage.tokens().is_token_registered("abc123").unwrap());
    assert!(!storage.tokens().is_token_registered("other").unwrap());

    storage.tokens_mut().unregister_token("abc123").unwrap();
    assert!(!storage.tokens().is_token_registered("abc123").unwrap());
}

#[test]
fn test_iterators_merge_metadata() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    let with_meta = token("aaa", "AAA");
    let without_meta = token("bbb", "BBB");
    storage.tokens_mut().save_token(&with_meta).unwrap();
    storage.tokens_mut().save_token(&without_meta).unwrap();
    storage.tokens_mut().register_token(&with_meta).unwrap();

    let meta = TokenMetadata {
        num_transactions: 3,
        ..TokenMetadata::default()
    };
    storage.tokens_mut().save_metadata("aaa", &meta).unwrap();

    let all: Vec<_> = storage
        .tokens()
        .token_iter()
        .map(|entry| entry.unwrap())
        .collect();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].0.uid, "aaa");
    assert_eq!(all[0].1.as_ref().map(|m| m.num_transactions), Some(3));
    assert_eq!(all[1].1, None);

    let registered: Vec<_> = storage
        .tokens()
        .registered_token_iter()
        .map(|entry| entry.unwrap())
        .collect();
    assert_eq!(registered.len(), 1);
    assert_eq!(registered[0].0.uid, "aaa");
}

// ============================================================================
// SELECTIVE CLEAR
// ============================================================================

#[test]
fn test_clear_index_keeps_registrations() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    let data = token("abc123", "ABC");
    storage.tokens_mut().save_token(&data).unwrap();
    storage.tokens_mut().register_token(&data).unwrap();

    storage.tokens_mut().clear(true, false).unwrap();

    assert_eq!(storage.tokens().get_token("abc123").unwrap(), None);
    assert_eq!(storage.tokens().token_count().unwrap(), 0);
    // Registration stores full token data and survives the resync wipe
    assert!(storage.tokens().is_token_registered("abc123").unwrap());
    assert_eq!(storage.tokens().registered_token_iter().count(), 1);
}

#[test]
fn test_clear_registered_keeps_index() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = WalletStorage::open(temp_dir.path()).unwrap();

    let data = token("abc123", "ABC");
    storage.tokens_mut().save_token(&data).unwrap();
    storage.tokens_mut().register_token(&data).unwrap();

    storage.tokens_mut().clear(false, true).unwrap();

    assert!(storage.tokens().get_token("abc123").unwrap().is_some());
    assert!(!storage.tokens().is_token_registered("abc123").unwrap());
}
