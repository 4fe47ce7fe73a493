//! Command handlers
//!
//! Each handler returns the single reply for its caller. Side effects are
//! limited to the ledger, the verified-user store and the attempt limiter.

use super::context::AppContext;
use super::messaging::OutboundAction;
use super::replies::{self, HandlerError, Usage};
use crate::llm::LlmError;
use std::path::Path;
use tracing::{error, info, warn};

/// `/start` and `/help`
#[must_use]
pub fn start() -> OutboundAction {
    OutboundAction::text(replies::WELCOME)
}

/// `/ask <question>`: forwards the question to the LLM.
///
/// # Errors
///
/// `HandlerError::Usage` for a blank question (no LLM call is made),
/// `HandlerError::Upstream` if the completion fails or comes back blank.
pub async fn ask(ctx: &AppContext, args: &str) -> Result<OutboundAction, HandlerError> {
    let question = args.trim();
    if question.is_empty() {
        return Err(HandlerError::Usage(Usage::Ask));
    }

    let answer = ctx.llm.chat_completion(&ctx.system_prompt, question).await?;
    if answer.trim().is_empty() {
        return Err(LlmError::JsonError("completion has no text".to_string()).into());
    }
    Ok(OutboundAction::Text(answer))
}

/// `/unlock`: sends the payment QR code.
///
/// # Errors
///
/// `HandlerError::Resource` if the image cannot be read.
pub async fn unlock(ctx: &AppContext) -> Result<OutboundAction, HandlerError> {
    let (bytes, file_name) = read_resource(&ctx.resources.qr_image).await?;
    Ok(OutboundAction::Photo {
        bytes,
        file_name,
        caption: replies::UNLOCK_CAPTION.to_string(),
    })
}

/// `/verify <transaction_id>`: redeems a transaction ID and grants access.
///
/// Invalid and already used IDs get the same reply so callers cannot discover
/// which IDs exist.
///
/// # Errors
///
/// `HandlerError::Usage` for a blank ID (the ledger is not touched),
/// `HandlerError::Storage` if the redemption cannot be persisted.
pub async fn verify(
    ctx: &AppContext,
    user_id: i64,
    args: &str,
) -> Result<OutboundAction, HandlerError> {
    let txn_id = args.trim();
    if txn_id.is_empty() {
        return Err(HandlerError::Usage(Usage::Verify));
    }

    if ctx.limiter.is_blocked(user_id).await {
        return Ok(OutboundAction::text(replies::TOO_MANY_ATTEMPTS));
    }

    if !ctx.ledger.redeem(txn_id).await? {
        ctx.limiter.record_failure(user_id).await;
        info!("User {} sent an invalid or used transaction ID", user_id);
        return Ok(OutboundAction::text(replies::INVALID_TXN));
    }

    ctx.limiter.reset(user_id).await;
    if let Err(e) = ctx.verified.grant(user_id).await {
        // The transaction is already consumed; keep the in-memory grant
        error!("Failed to persist verification of user {}: {}", user_id, e);
    }
    info!("✅ User {} verified a payment", user_id);

    Ok(OutboundAction::text(replies::VERIFIED))
}

/// `/getfile`: sends the gated file to verified users only.
///
/// # Errors
///
/// `HandlerError::Resource` if the file cannot be read.
pub async fn getfile(ctx: &AppContext, user_id: i64) -> Result<OutboundAction, HandlerError> {
    if !ctx.verified.contains(user_id).await {
        warn!("Unverified user {} requested the file", user_id);
        return Ok(OutboundAction::text(replies::NOT_VERIFIED));
    }

    let (bytes, file_name) = read_resource(&ctx.resources.gated_file).await?;
    info!("Sending {} to user {}", file_name, user_id);
    Ok(OutboundAction::Document { bytes, file_name })
}

async fn read_resource(path: &Path) -> Result<(Vec<u8>, String), HandlerError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| HandlerError::Resource {
            path: path.to_path_buf(),
            source,
        })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "file".to_string(), |n| n.to_string_lossy().into_owned());
    Ok((bytes, file_name))
}
