//! Webhook-driven Telegram bot that sells access to a file for a verified
//! payment and answers questions through a chat-completion API.

/// Telegram command handling
pub mod bot;
/// Settings and constants
pub mod config;
/// Chat-completion client
pub mod llm;
/// Flat-file ledgers
pub mod storage;
/// HTTP server
pub mod webhook;
