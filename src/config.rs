//! Configuration and settings management
//!
//! Loads settings from optional config files and environment variables and
//! defines the bot's fixed constants.

use config::{Config, ConfigError, Environment, File};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// What to do with text that is not one of the bot's commands
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Fallback {
    /// Drop the message without replying
    #[default]
    Ignore,
    /// Forward the whole text to the LLM as a question
    Ask,
    /// Treat the whole text as a transaction ID
    Verify,
}

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub bot_token: String,
    /// API key for the chat-completion endpoint
    pub deepseek_api_key: String,
    /// Public URL Telegram should deliver updates to
    pub webhook_url: String,

    /// Bot username, used to accept `/cmd@username` addressed commands
    pub bot_username: Option<String>,
    /// Shared secret Telegram echoes back in `X-Telegram-Bot-Api-Secret-Token`
    pub webhook_secret: Option<String>,

    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Newline-delimited list of transaction IDs that can be redeemed
    #[serde(default = "default_valid_txn_path")]
    pub valid_txn_path: PathBuf,
    /// Append-only list of redeemed transaction IDs
    #[serde(default = "default_used_txn_path")]
    pub used_txn_path: PathBuf,
    /// Append-only list of user IDs that completed verification
    #[serde(default = "default_verified_users_path")]
    pub verified_users_path: PathBuf,
    /// Payment QR image sent by `/unlock`
    #[serde(default = "default_qr_image_path")]
    pub qr_image_path: PathBuf,
    /// File served by `/getfile` to verified users
    #[serde(default = "default_gated_file_path")]
    pub gated_file_path: PathBuf,

    #[serde(default = "default_llm_api_base")]
    pub llm_api_base: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    /// Timeout for a single completion request
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default)]
    pub fallback: Fallback,

    /// Failed `/verify` attempts allowed per user inside one window
    #[serde(default = "default_verify_max_attempts")]
    pub verify_max_attempts: u32,
    #[serde(default = "default_verify_window_secs")]
    pub verify_window_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

fn default_valid_txn_path() -> PathBuf {
    PathBuf::from("txn_ids.txt")
}

fn default_used_txn_path() -> PathBuf {
    PathBuf::from("used_ids.txt")
}

fn default_verified_users_path() -> PathBuf {
    PathBuf::from("verified_users.txt")
}

fn default_qr_image_path() -> PathBuf {
    PathBuf::from("qr.jpg")
}

fn default_gated_file_path() -> PathBuf {
    PathBuf::from("enotes.zip")
}

fn default_llm_api_base() -> String {
    DEFAULT_LLM_API_BASE.to_string()
}

fn default_llm_model() -> String {
    DEFAULT_LLM_MODEL.to_string()
}

const fn default_llm_timeout_secs() -> u64 {
    DEFAULT_LLM_TIMEOUT_SECS
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

const fn default_verify_max_attempts() -> u32 {
    VERIFY_MAX_ATTEMPTS
}

const fn default_verify_window_secs() -> u64 {
    VERIFY_WINDOW_SECS
}

/// Builds the layered configuration source: config files, then environment.
///
/// # Errors
///
/// Returns a `ConfigError` if a present config file cannot be parsed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Local overrides, not checked into git
        .add_source(File::with_name("config/local").required(false))
        // BOT_TOKEN -> bot_token; empty variables count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

impl Settings {
    /// Load settings from config files and the process environment
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use txn_gate_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required secret is missing or a value is invalid.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(build_config()?)
    }

    /// Deserialize and validate settings from an already built `Config`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required secret is missing or a value is invalid.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("BOT_TOKEN", &self.bot_token),
            ("DEEPSEEK_API_KEY", &self.deepseek_api_key),
            ("WEBHOOK_URL", &self.webhook_url),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{name} must not be empty")));
            }
        }

        self.webhook_url()?;
        Url::parse(&self.llm_api_base)
            .map_err(|e| ConfigError::Message(format!("LLM_API_BASE is not a valid URL: {e}")))?;

        if self.llm_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "LLM_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed webhook URL
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `WEBHOOK_URL` is not an absolute URL.
    pub fn webhook_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.webhook_url)
            .map_err(|e| ConfigError::Message(format!("WEBHOOK_URL is not a valid URL: {e}")))
    }

    /// Socket address the HTTP server binds to
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `HOST`/`PORT` do not form a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Message(format!("invalid bind address: {e}")))
    }

    #[must_use]
    pub const fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    #[must_use]
    pub const fn verify_window(&self) -> Duration {
        Duration::from_secs(self.verify_window_secs)
    }
}

/// Returns `false` when running on a host that injects secrets itself.
///
/// Environment variable: `RENDER`.
#[must_use]
pub fn should_load_dotenv() -> bool {
    std::env::var("RENDER").map_or(true, |v| v != "true")
}

/// Default chat-completion API base
pub const DEFAULT_LLM_API_BASE: &str = "https://api.deepseek.com/v1";
/// Default completion model
pub const DEFAULT_LLM_MODEL: &str = "deepseek-chat";
/// Default completion timeout in seconds
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 10;
/// System prompt sent with every `/ask`
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Failed verification attempts before a user is throttled
pub const VERIFY_MAX_ATTEMPTS: u32 = 5;
/// Throttle window in seconds (10 minutes)
pub const VERIFY_WINDOW_SECS: u64 = 600;
