//! Users that completed payment verification.
//!
//! Access is granted per user and persisted, so a restart does not revoke it.

use super::{append_token, read_tokens_or_empty, StorageError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Set of Telegram user IDs allowed to download the gated file
#[derive(Debug)]
pub struct VerifiedUsers {
    users: Mutex<HashSet<i64>>,
    path: PathBuf,
}

impl VerifiedUsers {
    /// Loads verified user IDs from `path`. A missing file means nobody paid yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the file exists but cannot be read.
    pub async fn load(path: &Path) -> Result<Self, StorageError> {
        let tokens = read_tokens_or_empty(path).await?;
        let mut users = HashSet::with_capacity(tokens.len());
        for token in tokens {
            match token.parse::<i64>() {
                Ok(id) => {
                    users.insert(id);
                }
                Err(_) => warn!("Skipping malformed user id in {}", path.display()),
            }
        }

        let verified = Self {
            users: Mutex::new(users),
            path: path.to_path_buf(),
        };
        info!(count = verified.len().await, "Verified users loaded");
        Ok(verified)
    }

    /// `true` if `user_id` completed a verification.
    pub async fn contains(&self, user_id: i64) -> bool {
        self.users.lock().await.contains(&user_id)
    }

    /// Grants access to `user_id`. Returns `false` if the user already had it.
    ///
    /// The in-memory grant is kept even when persisting fails, so a user who
    /// just paid keeps access until the process restarts.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the grant could not be appended to the file.
    pub async fn grant(&self, user_id: i64) -> Result<bool, StorageError> {
        let mut users = self.users.lock().await;
        if !users.insert(user_id) {
            return Ok(false);
        }
        append_token(&self.path, &user_id.to_string()).await?;
        Ok(true)
    }

    /// Number of verified users
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    /// `true` if nobody has verified yet
    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}
