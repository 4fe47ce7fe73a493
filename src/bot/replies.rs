//! User-facing reply texts and the handler error taxonomy.
//!
//! Replies never embed internal error details; those go to the log.

use crate::llm::LlmError;
use crate::storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// `/start` and `/help`
pub const WELCOME: &str = "👋 Welcome! Use /ask to talk to AI, /unlock to pay via QR, \
/verify TXN_ID to verify payment, then /getfile to download.";

/// Caption of the payment QR photo
pub const UNLOCK_CAPTION: &str =
    "📥 Scan and pay using Paytm.\nThen use /verify <transaction_id>";

/// Transaction redeemed, access granted
pub const VERIFIED: &str = "✅ Verified! Use /getfile to download your notes.";
/// Unknown or already redeemed transaction ID
pub const INVALID_TXN: &str = "❌ Invalid or already used TXN ID.";
/// Verification refused while the user is throttled
pub const TOO_MANY_ATTEMPTS: &str =
    "⏳ Too many failed verification attempts. Please try again later.";
/// `/getfile` from a user without a verified payment
pub const NOT_VERIFIED: &str = "❌ Please verify payment first using /unlock and /verify.";

/// `/ask` without a question
pub const ASK_USAGE: &str = "⚠️ Usage: /ask What is AI?";
/// `/verify` without a transaction ID
pub const VERIFY_USAGE: &str = "⚠️ Usage: /verify TXN12345678";

/// LLM call timed out
pub const UPSTREAM_TIMEOUT: &str = "⌛ The AI took too long to answer. Please try again.";
/// Any other LLM failure, including a blank answer
pub const UPSTREAM_FAILED: &str =
    "❌ The AI service is unavailable right now. Please try again later.";
/// QR image or gated file could not be read
pub const RESOURCE_MISSING: &str =
    "❌ This file is temporarily unavailable. Please try again later.";
/// Ledger or verified-user file could not be written
pub const STORAGE_FAILED: &str = "❌ Something went wrong on our side. Please try again later.";

/// Command used with missing or blank arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Ask,
    Verify,
}

/// Failure of a single command handler. Always turned into a chat reply.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("missing arguments for {0:?}")]
    Usage(Usage),
    #[error("static resource {path} unavailable: {source}")]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("upstream LLM call failed: {0}")]
    Upstream(#[from] LlmError),
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl HandlerError {
    /// Fixed text shown to the user for this failure
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Usage(Usage::Ask) => ASK_USAGE,
            Self::Usage(Usage::Verify) => VERIFY_USAGE,
            Self::Resource { .. } => RESOURCE_MISSING,
            Self::Upstream(LlmError::Timeout) => UPSTREAM_TIMEOUT,
            Self::Upstream(_) => UPSTREAM_FAILED,
            Self::Storage(_) => STORAGE_FAILED,
        }
    }
}
