//! Routes inbound messages to command handlers.

use super::commands::Command;
use super::context::AppContext;
use super::handlers;
use super::messaging::{deliver, OutboundAction};
use super::replies::HandlerError;
use crate::config::Fallback;
use teloxide::types::{Update, UpdateKind};
use tracing::{debug, error, info, warn};

/// A text message from a user, stripped of platform details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub user_id: i64,
    pub chat_id: i64,
    pub text: String,
}

impl InboundMessage {
    /// Extracts a text message with a known sender from a Telegram update.
    ///
    /// Returns `None` for every other kind of update (edits, callbacks,
    /// photos without captions, channel posts without a sender).
    #[must_use]
    pub fn from_update(update: &Update) -> Option<Self> {
        let UpdateKind::Message(msg) = &update.kind else {
            return None;
        };
        let from = msg.from.as_ref()?;
        let text = msg.text()?;

        Some(Self {
            user_id: i64::try_from(from.id.0).ok()?,
            chat_id: msg.chat.id.0,
            text: text.to_string(),
        })
    }
}

/// Picks the handler for `message` and returns its reply.
///
/// Handler failures become fixed reply texts; this never fails.
pub async fn dispatch(ctx: &AppContext, message: &InboundMessage) -> OutboundAction {
    let user_id = message.user_id;
    let result = match Command::parse(&message.text, ctx.bot_username.as_deref()) {
        Some((command, args)) => {
            info!("User {} issued /{}", user_id, command.keyword());
            run_command(ctx, user_id, command, args).await
        }
        None => match ctx.fallback {
            Fallback::Ignore => {
                debug!("Ignoring unmatched message from user {}", user_id);
                Ok(OutboundAction::Nothing)
            }
            Fallback::Ask => handlers::ask(ctx, &message.text).await,
            Fallback::Verify => handlers::verify(ctx, user_id, &message.text).await,
        },
    };

    result.unwrap_or_else(|e| {
        log_handler_error(user_id, &e);
        OutboundAction::text(e.user_message())
    })
}

async fn run_command(
    ctx: &AppContext,
    user_id: i64,
    command: Command,
    args: &str,
) -> Result<OutboundAction, HandlerError> {
    match command {
        Command::Start | Command::Help => Ok(handlers::start()),
        Command::Ask => handlers::ask(ctx, args).await,
        Command::Unlock => handlers::unlock(ctx).await,
        Command::Verify => handlers::verify(ctx, user_id, args).await,
        Command::Getfile => handlers::getfile(ctx, user_id).await,
    }
}

fn log_handler_error(user_id: i64, e: &HandlerError) {
    match e {
        HandlerError::Usage(_) => debug!("Usage error for user {}: {}", user_id, e),
        HandlerError::Upstream(_) => warn!("LLM request for user {} failed: {}", user_id, e),
        HandlerError::Resource { .. } | HandlerError::Storage(_) => {
            error!("Handler for user {} failed: {}", user_id, e);
        }
    }
}

/// Dispatches `message` and sends the reply. Delivery failures are logged.
pub async fn process(ctx: &AppContext, message: &InboundMessage) {
    let action = dispatch(ctx, message).await;
    if let Err(e) = deliver(ctx.messenger.as_ref(), message.chat_id, action).await {
        error!("Failed to deliver reply to chat {}: {}", message.chat_id, e);
    }
}
