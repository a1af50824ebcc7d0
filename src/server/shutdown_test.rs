use super::shutdown::*;
use std::time::Duration;

#[test]
fn test_new_handle_is_not_triggered() {
    assert!(!Shutdown::new().is_triggered());
}

#[tokio::test]
async fn test_triggered_completes_after_trigger() {
    let shutdown = Shutdown::new();
    let waiter = shutdown.triggered();
    let trigger = shutdown.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.trigger();
    });

    let result = tokio::time::timeout(Duration::from_secs(1), waiter).await;

    assert!(result.is_ok(), "triggered() should complete once shutdown fires");
    assert!(shutdown.is_triggered());
}

#[tokio::test]
async fn test_triggered_after_the_fact_completes_immediately() {
    let shutdown = Shutdown::new();
    shutdown.trigger();

    let result = tokio::time::timeout(Duration::from_millis(100), shutdown.triggered()).await;

    assert!(result.is_ok());
}

#[test]
fn test_trigger_is_idempotent_and_shared_by_clones() {
    let shutdown = Shutdown::new();
    let clone = shutdown.clone();

    clone.trigger();
    clone.trigger();

    assert!(shutdown.is_triggered());
}
