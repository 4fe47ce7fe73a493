//! Outbound replies and their delivery to Telegram.
//!
//! Handlers produce an [`OutboundAction`]; a [`Messenger`] sends it. Long
//! texts are split to fit Telegram's message limit.

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile};
use unicode_segmentation::UnicodeSegmentation;

/// Maximum message length for Telegram with safety margin.
/// Telegram's official limit is 4096.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4000;

/// The single reply a handler wants sent back to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    Text(String),
    Photo {
        bytes: Vec<u8>,
        file_name: String,
        caption: String,
    },
    Document {
        bytes: Vec<u8>,
        file_name: String,
    },
    /// No reply at all
    Nothing,
}

impl OutboundAction {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Outbound side of the chat platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: String) -> Result<()>;
    async fn send_photo(
        &self,
        chat_id: i64,
        bytes: Vec<u8>,
        file_name: String,
        caption: String,
    ) -> Result<()>;
    async fn send_document(&self, chat_id: i64, bytes: Vec<u8>, file_name: String) -> Result<()>;
}

/// Sends `action` to `chat_id`, splitting long texts into several messages.
///
/// # Errors
///
/// Returns an error if any message fails to send.
pub async fn deliver(
    messenger: &dyn Messenger,
    chat_id: i64,
    action: OutboundAction,
) -> Result<()> {
    match action {
        OutboundAction::Text(text) => {
            for part in split_long_message(&text, TELEGRAM_MESSAGE_LIMIT) {
                messenger.send_text(chat_id, part).await?;
            }
        }
        OutboundAction::Photo {
            bytes,
            file_name,
            caption,
        } => messenger.send_photo(chat_id, bytes, file_name, caption).await?,
        OutboundAction::Document { bytes, file_name } => {
            messenger.send_document(chat_id, bytes, file_name).await?;
        }
        OutboundAction::Nothing => {}
    }
    Ok(())
}

/// Splits `message` into parts of at most `max_length` bytes.
///
/// Prefers line boundaries; a single line longer than the limit is cut on
/// grapheme boundaries so multi-byte characters are never split.
#[must_use]
pub fn split_long_message(message: &str, max_length: usize) -> Vec<String> {
    if message.is_empty() {
        return Vec::new();
    }
    if message.len() <= max_length {
        return vec![message.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();

    for line in message.lines() {
        if current.len() + line.len() + 1 > max_length && !current.is_empty() {
            parts.push(current.trim_end().to_string());
            current.clear();
        }

        if line.len() > max_length {
            for grapheme in line.graphemes(true) {
                if current.len() + grapheme.len() > max_length {
                    parts.push(current.clone());
                    current.clear();
                }
                current.push_str(grapheme);
            }
            current.push('\n');
            continue;
        }

        current.push_str(line);
        current.push('\n');
    }

    if !current.trim_end().is_empty() {
        parts.push(current.trim_end().to_string());
    }

    parts
}

/// [`Messenger`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: String) -> Result<()> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        bytes: Vec<u8>,
        file_name: String,
        caption: String,
    ) -> Result<()> {
        let photo = InputFile::memory(bytes).file_name(file_name);
        self.bot
            .send_photo(ChatId(chat_id), photo)
            .caption(caption)
            .await?;
        Ok(())
    }

    async fn send_document(&self, chat_id: i64, bytes: Vec<u8>, file_name: String) -> Result<()> {
        let document = InputFile::memory(bytes).file_name(file_name);
        self.bot.send_document(ChatId(chat_id), document).await?;
        Ok(())
    }
}
