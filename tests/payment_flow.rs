//! End-to-end flows through the dispatcher with file-backed ledgers.

mod common;

use common::{bot, message, settings, workspace, TestResult};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use txn_gate_bot::bot::{process, replies, OutboundAction};

fn texts(sent: &[(i64, OutboundAction)]) -> Vec<&str> {
    sent.iter()
        .filter_map(|(_, action)| match action {
            OutboundAction::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_pay_verify_download() -> TestResult {
    let dir = workspace("TXN1\nTXN2\n").await?;
    let bot = bot(&settings(dir.path(), &[])?).await?;

    process(&bot.ctx, &message(7, "/unlock")).await;
    process(&bot.ctx, &message(7, "/getfile")).await;
    process(&bot.ctx, &message(7, "/verify TXN1")).await;
    process(&bot.ctx, &message(7, "/getfile")).await;

    let sent = bot.messenger.take();
    assert_eq!(sent.len(), 4);
    assert!(matches!(
        &sent[0].1,
        OutboundAction::Photo { bytes, caption, .. }
            if bytes == b"qr-image" && caption == replies::UNLOCK_CAPTION
    ));
    assert_eq!(sent[1].1, OutboundAction::text(replies::NOT_VERIFIED));
    assert_eq!(sent[2].1, OutboundAction::text(replies::VERIFIED));
    assert_eq!(
        sent[3].1,
        OutboundAction::Document {
            bytes: b"notes-archive".to_vec(),
            file_name: "enotes.zip".to_string(),
        }
    );
    assert!(sent.iter().all(|(chat_id, _)| *chat_id == 7));
    Ok(())
}

#[tokio::test]
async fn test_transaction_redeemable_once_across_users() -> TestResult {
    let dir = workspace("TXN1\nTXN2\n").await?;
    let bot = bot(&settings(dir.path(), &[])?).await?;

    process(&bot.ctx, &message(1, "/verify TXN1")).await;
    process(&bot.ctx, &message(2, "/verify TXN1")).await;
    process(&bot.ctx, &message(2, "/verify TXN3")).await;
    process(&bot.ctx, &message(2, "/getfile")).await;

    let sent = bot.messenger.take();
    assert_eq!(
        texts(&sent),
        vec![
            replies::VERIFIED,
            replies::INVALID_TXN,
            replies::INVALID_TXN,
            replies::NOT_VERIFIED,
        ]
    );
    let used = tokio::fs::read_to_string(dir.path().join("used_ids.txt")).await?;
    assert_eq!(used, "TXN1\n");
    Ok(())
}

#[tokio::test]
async fn test_state_survives_restart() -> TestResult {
    let dir = workspace("TXN1\nTXN2\n").await?;
    let settings = settings(dir.path(), &[])?;

    let first = bot(&settings).await?;
    process(&first.ctx, &message(5, "/verify TXN2")).await;
    drop(first);

    let second = bot(&settings).await?;
    process(&second.ctx, &message(5, "/getfile")).await;
    process(&second.ctx, &message(6, "/verify TXN2")).await;

    let sent = second.messenger.take();
    assert!(matches!(sent[0].1, OutboundAction::Document { .. }));
    assert_eq!(sent[1].1, OutboundAction::text(replies::INVALID_TXN));
    Ok(())
}

#[tokio::test]
async fn test_ask_round_trip_and_blank_question() -> TestResult {
    let dir = workspace("TXN1\n").await?;
    let bot = bot(&settings(dir.path(), &[])?).await?;

    process(&bot.ctx, &message(3, "/ask")).await;
    process(&bot.ctx, &message(3, "/ask   What is AI?  ")).await;

    let sent = bot.messenger.take();
    assert_eq!(texts(&sent), vec![replies::ASK_USAGE, "echo: What is AI?"]);
    assert_eq!(bot.llm.calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_plain_text_fallbacks() -> TestResult {
    let dir = workspace("TXN1\n").await?;

    let ignoring = bot(&settings(dir.path(), &[])?).await?;
    process(&ignoring.ctx, &message(4, "hello there")).await;
    assert!(ignoring.messenger.take().is_empty());

    let asking = bot(&settings(dir.path(), &[("fallback", "ask")])?).await?;
    process(&asking.ctx, &message(4, "hello there")).await;
    assert_eq!(
        texts(&asking.messenger.take()),
        vec!["echo: hello there"]
    );
    Ok(())
}

#[tokio::test]
async fn test_repeated_failures_are_throttled() -> TestResult {
    let dir = workspace("TXN1\n").await?;
    let bot = bot(&settings(dir.path(), &[("verify_max_attempts", "2")])?).await?;

    process(&bot.ctx, &message(8, "/verify NOPE1")).await;
    process(&bot.ctx, &message(8, "/verify NOPE2")).await;
    process(&bot.ctx, &message(8, "/verify TXN1")).await;

    let sent = bot.messenger.take();
    assert_eq!(
        texts(&sent),
        vec![
            replies::INVALID_TXN,
            replies::INVALID_TXN,
            replies::TOO_MANY_ATTEMPTS,
        ]
    );
    // The throttled attempt must not consume the ID
    assert!(bot.ctx.ledger.is_usable("TXN1").await);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_redemptions_grant_one_user() -> TestResult {
    let dir = workspace("TXN1\n").await?;
    let bot = bot(&settings(dir.path(), &[])?).await?;

    let mut handles = Vec::new();
    for user_id in 100..120 {
        let ctx = Arc::clone(&bot.ctx);
        handles.push(tokio::spawn(async move {
            process(&ctx, &message(user_id, "/verify TXN1")).await;
        }));
    }
    for handle in handles {
        handle.await?;
    }

    let sent = bot.messenger.take();
    let verified = texts(&sent)
        .into_iter()
        .filter(|text| *text == replies::VERIFIED)
        .count();
    assert_eq!(verified, 1);
    assert_eq!(bot.ctx.verified.len().await, 1);
    Ok(())
}
