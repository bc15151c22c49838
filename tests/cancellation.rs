//! Integration tests for how caller cancellation affects an in-flight send.

use alertevent::core::{Notifier, NotifyContext};
use alertevent::notification::test_utils::numbered_alerts;
use alertevent::notification::CancellationPolicy;
use alertevent::NotifyError;
use std::time::{Duration, Instant};
use tokio::sync::watch;

mod helpers;
use helpers::mock_endpoint::{received, start_endpoint, start_slow_endpoint};
use helpers::notifier_for;

#[tokio::test]
async fn test_inherited_cancellation_aborts_a_slow_send() {
    // Arrange
    let server = start_slow_endpoint(200, Duration::from_secs(5)).await;
    let notifier = notifier_for(&server, |config| {
        config.cancellation = CancellationPolicy::Inherit;
    });
    let (cancel_tx, cancel_rx) = watch::channel(());
    let ctx = NotifyContext::new()
        .with_group_key("group")
        .with_cancellation(cancel_rx);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel_tx.send(()).unwrap();
    });

    // Act
    let start = Instant::now();
    let result = notifier.notify(&ctx, &numbered_alerts(1)).await;

    // Assert
    assert!(matches!(result, Err(NotifyError::Cancelled)));
    assert!(
        start.elapsed() < Duration::from_secs(2),
        "send should be abandoned promptly"
    );
}

#[tokio::test]
async fn test_inherited_cancellation_before_send_makes_no_request() {
    let server = start_endpoint(200).await;
    let notifier = notifier_for(&server, |config| {
        config.cancellation = CancellationPolicy::Inherit;
    });
    let (cancel_tx, cancel_rx) = watch::channel(());
    cancel_tx.send(()).unwrap();
    let ctx = NotifyContext::new().with_cancellation(cancel_rx);

    let result = notifier.notify(&ctx, &numbered_alerts(1)).await;

    assert!(matches!(result, Err(NotifyError::Cancelled)));
    assert!(received(&server).await.is_empty());
}

#[tokio::test]
async fn test_detached_send_ignores_caller_cancellation() {
    let server = start_slow_endpoint(200, Duration::from_millis(300)).await;
    let notifier = notifier_for(&server, |config| {
        config.cancellation = CancellationPolicy::Detached;
    });
    let (cancel_tx, cancel_rx) = watch::channel(());
    cancel_tx.send(()).unwrap();
    let ctx = NotifyContext::new()
        .with_group_key("group")
        .with_cancellation(cancel_rx);

    let delivery = notifier.notify(&ctx, &numbered_alerts(1)).await.unwrap();

    assert_eq!(delivery.status, 200);
    assert_eq!(received(&server).await.len(), 1);
}

#[tokio::test]
async fn test_request_timeout_is_undelivered() {
    let server = start_slow_endpoint(200, Duration::from_secs(2)).await;
    let notifier = notifier_for(&server, |config| {
        config.http.timeout_ms = 200;
    });

    let err = notifier
        .notify(&NotifyContext::new(), &numbered_alerts(1))
        .await
        .unwrap_err();

    let is_timeout = match &err {
        NotifyError::Undelivered { source, .. } => source.is_timeout(),
        _ => false,
    };
    assert!(is_timeout, "Error should be a timeout error, but was: {}", err);
}
