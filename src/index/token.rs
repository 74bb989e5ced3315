// TokenIndex - token definitions, aggregate metadata, registered subset

use crate::index::CountState;
use crate::storage::decode_record;
use crate::storage::{StorageError, StoreError, WalletDb};
use crate::types::{TokenData, TokenMetaUpdate, TokenMetadata};

mod keys {
    /// token uid -> TokenData
    pub const TOKEN: &[u8] = b"token:data:";
    /// token uid -> TokenMetadata
    pub const META: &[u8] = b"token:meta:";
    /// token uid -> TokenData, for tokens the wallet actively tracks
    pub const REGISTERED: &[u8] = b"registered:";
}

const STORE_NAME: &str = "token";
const SCHEMA_VERSION: u32 = 1;

fn token_key(uid: &str) -> Vec<u8> {
    [keys::TOKEN, uid.as_bytes()].concat()
}

fn meta_key(uid: &str) -> Vec<u8> {
    [keys::META, uid.as_bytes()].concat()
}

fn registered_key(uid: &str) -> Vec<u8> {
    [keys::REGISTERED, uid.as_bytes()].concat()
}

/// Token index: definitions, metadata and the registered-token subset
///
/// The registered table stores full token data, so registrations survive
/// an index wipe during resync.
pub struct TokenIndex {
    db: WalletDb,
    count: CountState,
}

impl TokenIndex {
    pub(crate) fn open(db: WalletDb) -> Result<Self, StoreError> {
        db.check_version(STORE_NAME, SCHEMA_VERSION)?;
        Ok(Self {
            db,
            count: CountState::Unvalidated,
        })
    }

    /// Idempotent upsert of a token definition
    pub fn save_token(&mut self, token: &TokenData) -> Result<(), StorageError> {
        let existed = self.db.contains(&token_key(&token.uid))?;
        self.db.put_record(&token_key(&token.uid), token)?;
        if !existed {
            self.count.increment();
        }
        Ok(())
    }

    pub fn get_token(&self, uid: &str) -> Result<Option<TokenData>, StorageError> {
        Ok(self.db.get_record(&token_key(uid))?)
    }

    pub fn save_metadata(&mut self, uid: &str, meta: &TokenMetadata) -> Result<(), StorageError> {
        Ok(self.db.put_record(&meta_key(uid), meta)?)
    }

    pub fn get_token_meta(&self, uid: &str) -> Result<Option<TokenMetadata>, StorageError> {
        Ok(self.db.get_record(&meta_key(uid))?)
    }

    /// Merge a partial update onto the stored metadata
    ///
    /// Starts from default metadata when none is stored yet.
    pub fn edit_token_meta(
        &mut self,
        uid: &str,
        update: &TokenMetaUpdate,
    ) -> Result<(), StorageError> {
        let mut meta = self.get_token_meta(uid)?.unwrap_or_default();
        meta.apply(update);
        self.save_metadata(uid, &meta)
    }

    /// Mark a token as actively tracked by the wallet
    pub fn register_token(&mut self, token: &TokenData) -> Result<(), StorageError> {
        Ok(self.db.put_record(&registered_key(&token.uid), token)?)
    }

    pub fn unregister_token(&mut self, uid: &str) -> Result<(), StorageError> {
        Ok(self.db.delete(&registered_key(uid))?)
    }

    pub fn is_token_registered(&self, uid: &str) -> Result<bool, StorageError> {
        Ok(self.db.contains(&registered_key(uid))?)
    }

    /// Number of known token definitions (cached only when validated)
    pub fn token_count(&self) -> Result<u64, StorageError> {
        if let Some(n) = self.count.validated() {
            return Ok(n);
        }
        Ok(self.db.count_prefix(keys::TOKEN)?)
    }

    /// Lazy iteration over all known tokens with any available metadata
    pub fn token_iter(&self) -> TokenIter {
        TokenIter {
            db: self.db.clone(),
            inner: self.db.scan_prefix(keys::TOKEN),
        }
    }

    /// Lazy iteration over registered tokens with any available metadata
    pub fn registered_token_iter(&self) -> TokenIter {
        TokenIter {
            db: self.db.clone(),
            inner: self.db.scan_prefix(keys::REGISTERED),
        }
    }

    /// Recompute the definition count
    pub fn validate(&mut self) -> Result<u64, StorageError> {
        let count = self.db.count_prefix(keys::TOKEN)?;
        self.count = CountState::Validated(count);
        Ok(count)
    }

    /// Selective wipe used during resync
    ///
    /// `clean_index` wipes definitions and metadata; `clean_registered`
    /// wipes the registered subset.
    pub fn clear(&mut self, clean_index: bool, clean_registered: bool) -> Result<(), StorageError> {
        if clean_index {
            self.db.delete_with_prefix(keys::TOKEN)?;
            self.db.delete_with_prefix(keys::META)?;
            self.count = CountState::Validated(0);
        }
        if clean_registered {
            self.db.delete_with_prefix(keys::REGISTERED)?;
        }
        Ok(())
    }
}

/// Lazy cursor yielding token data merged with any stored metadata
pub struct TokenIter {
    db: WalletDb,
    inner: sled::Iter,
}

impl Iterator for TokenIter {
    type Item = Result<(TokenData, Option<TokenMetadata>), StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.inner.next()?;
        let (_key, value) = match entry {
            Ok(pair) => pair,
            Err(e) => return Some(Err(StoreError::from(e).into())),
        };
        let token: TokenData = match decode_record(&value) {
            Ok(token) => token,
            Err(e) => return Some(Err(e.into())),
        };
        match self.db.get_record::<TokenMetadata>(&meta_key(&token.uid)) {
            Ok(meta) => Some(Ok((token, meta))),
            Err(e) => Some(Err(e.into())),
        }
    }
}
