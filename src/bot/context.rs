//! Shared application state handed to every handler invocation.

use super::attempt_limiter::AttemptLimiter;
use super::messaging::Messenger;
use crate::config::{Fallback, Settings};
use crate::llm::LlmProvider;
use crate::storage::{StorageError, TransactionLedger, VerifiedUsers};
use std::path::PathBuf;
use std::sync::Arc;

/// Static files served by the bot
#[derive(Debug, Clone)]
pub struct Resources {
    pub qr_image: PathBuf,
    pub gated_file: PathBuf,
}

/// Everything a handler may read or mutate. Built once at startup.
pub struct AppContext {
    pub ledger: TransactionLedger,
    pub verified: VerifiedUsers,
    pub llm: Arc<dyn LlmProvider>,
    pub messenger: Arc<dyn Messenger>,
    pub limiter: AttemptLimiter,
    pub resources: Resources,
    pub system_prompt: String,
    pub fallback: Fallback,
    pub bot_username: Option<String>,
    pub webhook_secret: Option<String>,
}

impl AppContext {
    /// Loads the ledger and verified users from the paths in `settings`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the valid transaction file cannot be read.
    pub async fn from_settings(
        settings: &Settings,
        llm: Arc<dyn LlmProvider>,
        messenger: Arc<dyn Messenger>,
    ) -> Result<Self, StorageError> {
        let ledger =
            TransactionLedger::load(&settings.valid_txn_path, &settings.used_txn_path).await?;
        let verified = VerifiedUsers::load(&settings.verified_users_path).await?;

        Ok(Self {
            ledger,
            verified,
            llm,
            messenger,
            limiter: AttemptLimiter::new(settings.verify_max_attempts, settings.verify_window()),
            resources: Resources {
                qr_image: settings.qr_image_path.clone(),
                gated_file: settings.gated_file_path.clone(),
            },
            system_prompt: settings.system_prompt.clone(),
            fallback: settings.fallback,
            bot_username: settings.bot_username.clone(),
            webhook_secret: settings.webhook_secret.clone(),
        })
    }
}
