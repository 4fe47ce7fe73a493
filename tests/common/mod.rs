#![allow(dead_code)]

use async_trait::async_trait;
use config::Config;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use txn_gate_bot::bot::{AppContext, InboundMessage, Messenger, OutboundAction};
use txn_gate_bot::config::Settings;
use txn_gate_bot::llm::{LlmError, LlmProvider};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// LLM that echoes the question and counts calls
#[derive(Default)]
pub struct EchoLlm {
    pub calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for EchoLlm {
    async fn chat_completion(
        &self,
        _system_prompt: &str,
        user_message: &str,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("echo: {user_message}"))
    }
}

/// Messenger that records everything it is asked to send
#[derive(Default)]
pub struct RecordingMessenger {
    pub sent: Mutex<Vec<(i64, OutboundAction)>>,
}

impl RecordingMessenger {
    pub fn take(&self) -> Vec<(i64, OutboundAction)> {
        self.sent
            .lock()
            .map(|mut sent| std::mem::take(&mut *sent))
            .unwrap_or_default()
    }

    fn push(&self, chat_id: i64, action: OutboundAction) -> anyhow::Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("poisoned"))?
            .push((chat_id, action));
        Ok(())
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, chat_id: i64, text: String) -> anyhow::Result<()> {
        self.push(chat_id, OutboundAction::Text(text))
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        bytes: Vec<u8>,
        file_name: String,
        caption: String,
    ) -> anyhow::Result<()> {
        self.push(
            chat_id,
            OutboundAction::Photo {
                bytes,
                file_name,
                caption,
            },
        )
    }

    async fn send_document(
        &self,
        chat_id: i64,
        bytes: Vec<u8>,
        file_name: String,
    ) -> anyhow::Result<()> {
        self.push(chat_id, OutboundAction::Document { bytes, file_name })
    }
}

/// Writes the ledger and resource files into a fresh temp dir
pub async fn workspace(valid_ids: &str) -> Result<TempDir, Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    tokio::fs::write(dir.path().join("txn_ids.txt"), valid_ids).await?;
    tokio::fs::write(dir.path().join("qr.jpg"), b"qr-image").await?;
    tokio::fs::write(dir.path().join("enotes.zip"), b"notes-archive").await?;
    Ok(dir)
}

/// Settings pointing every file at `dir`
pub fn settings(
    dir: &Path,
    extra: &[(&str, &str)],
) -> Result<Settings, Box<dyn std::error::Error>> {
    let path = |name: &str| dir.join(name).to_string_lossy().into_owned();
    let mut builder = Config::builder()
        .set_override("bot_token", "123456789:test-token")?
        .set_override("deepseek_api_key", "sk-test")?
        .set_override("webhook_url", "https://bot.example.com/webhook")?
        .set_override("valid_txn_path", path("txn_ids.txt"))?
        .set_override("used_txn_path", path("used_ids.txt"))?
        .set_override("verified_users_path", path("verified_users.txt"))?
        .set_override("qr_image_path", path("qr.jpg"))?
        .set_override("gated_file_path", path("enotes.zip"))?;
    for (key, value) in extra {
        builder = builder.set_override(*key, *value)?;
    }
    Ok(Settings::from_config(builder.build()?)?)
}

pub struct Bot {
    pub ctx: Arc<AppContext>,
    pub llm: Arc<EchoLlm>,
    pub messenger: Arc<RecordingMessenger>,
}

pub async fn bot(settings: &Settings) -> Result<Bot, Box<dyn std::error::Error>> {
    let llm = Arc::new(EchoLlm::default());
    let messenger = Arc::new(RecordingMessenger::default());
    let ctx = AppContext::from_settings(settings, llm.clone(), messenger.clone()).await?;
    Ok(Bot {
        ctx: Arc::new(ctx),
        llm,
        messenger,
    })
}

pub fn message(user_id: i64, text: &str) -> InboundMessage {
    InboundMessage {
        user_id,
        chat_id: user_id,
        text: text.to_string(),
    }
}
