/// Throttling of failed payment verifications
pub mod attempt_limiter;
/// Command keywords and parsing
pub mod commands;
/// Shared application state
pub mod context;
/// Routing of inbound messages to handlers
pub mod dispatcher;
/// Command handlers
pub mod handlers;
/// Outbound replies and Telegram delivery
pub mod messaging;
/// Reply texts and handler errors
pub mod replies;

pub use attempt_limiter::AttemptLimiter;
pub use commands::Command;
pub use context::{AppContext, Resources};
pub use dispatcher::{dispatch, process, InboundMessage};
pub use messaging::{Messenger, OutboundAction, TelegramMessenger};
