//! HTTP entry point: Telegram webhook and liveness check.

use crate::bot::{process, AppContext, Command, InboundMessage};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::Url;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::Update;
use tracing::{debug, error, info, warn};

/// Header Telegram uses to echo the secret passed to `setWebhook`
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Builds the router serving `POST /webhook` and `GET /`.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/webhook", post(handle_webhook))
        .with_state(ctx)
}

async fn health_check() -> Json<Value> {
    Json(json!({"status": "running"}))
}

async fn handle_webhook(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    if let Some(secret) = ctx.webhook_secret.as_deref() {
        let provided = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(secret) {
            warn!("Rejected webhook call with missing or wrong secret token");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"ok": false, "error": "unauthorized"})),
            );
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Failed to parse webhook payload: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"ok": false, "error": "invalid update payload"})),
            );
        }
    };

    match InboundMessage::from_update(&update) {
        Some(message) => process(&ctx, &message).await,
        None => debug!("Ignoring update {} without a text message", update.id.0),
    }

    (StatusCode::OK, Json(json!({"ok": true})))
}

/// Registers the webhook URL and the command menu with Telegram.
///
/// Failures are logged and do not stop the server from starting; Telegram
/// keeps delivering to a previously registered URL.
pub async fn register_webhook(bot: &Bot, url: Url, secret: Option<&str>) {
    let mut request = bot.set_webhook(url.clone());
    if let Some(secret) = secret {
        request = request.secret_token(secret.to_string());
    }

    match request.await {
        Ok(_) => info!("Webhook registered at {}", url),
        Err(e) => error!("Failed to register webhook at {}: {}. Continuing.", url, e),
    }

    if let Err(e) = bot.set_my_commands(Command::menu()).await {
        warn!("Failed to register the command menu: {}", e);
    }
}

/// Serves the router on `addr` until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(ctx: Arc<AppContext>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router(Arc::clone(&ctx)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(
        throttled_verify_attempts = ctx.limiter.blocked_count(),
        "Server stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
