//! Transaction ledger gating file access
//!
//! `valid` is a snapshot taken at startup and never refreshed; operators add
//! new transaction IDs by editing the file and restarting. `used` grows by
//! appending to its backing file.

use super::{append_token, read_tokens, read_tokens_or_empty, StorageError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Valid and redeemed transaction IDs
#[derive(Debug)]
pub struct TransactionLedger {
    valid: HashSet<String>,
    used: Mutex<HashSet<String>>,
    used_path: PathBuf,
}

impl TransactionLedger {
    /// Loads the ledger from its two backing files.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the valid-ID file cannot be read, or if the
    /// used-ID file exists but cannot be read. A missing used-ID file is an
    /// empty set.
    pub async fn load(valid_path: &Path, used_path: &Path) -> Result<Self, StorageError> {
        let valid = read_tokens(valid_path).await?;
        let used = read_tokens_or_empty(used_path).await?;

        let ledger = Self::from_parts(valid, used, used_path.to_path_buf());
        info!(
            valid = ledger.valid_count(),
            used = ledger.used_count().await,
            "Transaction ledger loaded from {}",
            valid_path.display()
        );

        Ok(ledger)
    }

    /// Builds a ledger from in-memory sets, persisting redemptions to `used_path`.
    #[must_use]
    pub fn from_parts(valid: HashSet<String>, used: HashSet<String>, used_path: PathBuf) -> Self {
        Self {
            valid,
            used: Mutex::new(used),
            used_path,
        }
    }

    /// `true` iff `id` is known and has not been redeemed yet.
    pub async fn is_usable(&self, id: &str) -> bool {
        self.valid.contains(id) && !self.used.lock().await.contains(id)
    }

    /// Records `id` as used. Marking an already used ID again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the used-ID file cannot be appended to; the
    /// in-memory set is left unchanged in that case.
    pub async fn mark_used(&self, id: &str) -> Result<(), StorageError> {
        let mut used = self.used.lock().await;
        if used.contains(id) {
            debug!("Transaction already marked used, skipping append");
            return Ok(());
        }
        self.persist(&mut used, id).await
    }

    /// Atomically checks that `id` is usable and marks it used.
    ///
    /// Returns `true` only for the single caller that consumed the ID. The
    /// check and the mark happen under one lock, so concurrent redemptions of
    /// the same ID cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the redemption could not be persisted; the ID
    /// stays usable in that case.
    pub async fn redeem(&self, id: &str) -> Result<bool, StorageError> {
        let mut used = self.used.lock().await;
        if !self.valid.contains(id) || used.contains(id) {
            return Ok(false);
        }
        self.persist(&mut used, id).await?;
        Ok(true)
    }

    async fn persist(&self, used: &mut HashSet<String>, id: &str) -> Result<(), StorageError> {
        append_token(&self.used_path, id).await?;
        used.insert(id.to_string());
        Ok(())
    }

    /// Number of redeemed IDs
    pub async fn used_count(&self) -> usize {
        self.used.lock().await.len()
    }

    /// Number of IDs in the valid snapshot
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.valid.len()
    }
}
