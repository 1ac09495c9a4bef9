//! Unit tests for the retry executor

use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

fn server_error() -> GemdexError {
    GemdexError::from_status(503, "https://rubygems.org/api/v1/downloads.json")
}

fn not_found() -> GemdexError {
    GemdexError::from_status(404, "https://rubygems.org/api/v1/gems/nope.json")
}

#[test]
fn test_default_policy() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.initial_wait, Duration::from_secs(1));
    assert_eq!(policy.max_wait, Duration::from_secs(30));
    assert!(policy.use_exponential_backoff);
    assert!(policy.should_retry.is_none());
}

#[test]
fn test_exponential_wait_schedule() {
    let policy = RetryPolicy::new()
        .with_initial_wait(Duration::from_millis(100))
        .with_max_wait(Duration::from_secs(30));

    assert_eq!(policy.wait_before(2), Duration::from_millis(100));
    assert_eq!(policy.wait_before(3), Duration::from_millis(200));
    assert_eq!(policy.wait_before(4), Duration::from_millis(400));
    assert_eq!(policy.wait_before(5), Duration::from_millis(800));
}

#[test]
fn test_wait_capped_at_max() {
    let policy = RetryPolicy::new()
        .with_initial_wait(Duration::from_millis(40))
        .with_max_wait(Duration::from_millis(60));

    assert_eq!(policy.wait_before(2), Duration::from_millis(40));
    assert_eq!(policy.wait_before(3), Duration::from_millis(60));
    assert_eq!(policy.wait_before(4), Duration::from_millis(60));
}

#[test]
fn test_fixed_wait_schedule() {
    let policy = RetryPolicy::new()
        .with_exponential_backoff(false)
        .with_initial_wait(Duration::from_millis(50))
        .with_max_wait(Duration::from_secs(30));

    assert_eq!(policy.wait_before(2), Duration::from_millis(50));
    assert_eq!(policy.wait_before(3), Duration::from_millis(50));
    assert_eq!(policy.wait_before(5), Duration::from_millis(50));
}

#[tokio::test]
async fn test_success_returns_immediately() {
    let policy = RetryPolicy::default();
    let cancel = CancellationToken::new();
    let calls = AtomicUsize::new(0);

    let started = Instant::now();
    let result: RegistryResult<u32> = policy
        .execute(&cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(7) }
        })
        .await;

    assert_eq!(result.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn test_retryable_error_exhausts_attempts() {
    let policy = RetryPolicy::new()
        .with_max_attempts(3)
        .with_initial_wait(Duration::from_millis(10));
    let cancel = CancellationToken::new();
    let calls = AtomicUsize::new(0);

    let result: RegistryResult<()> = policy
        .execute(&cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(server_error()) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match result {
        Err(GemdexError::RetriesExhausted { attempts, source }) => {
            assert_eq!(attempts, 3);
            assert_eq!(source.status(), Some(503));
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_retryable_error_returns_as_is() {
    let policy = RetryPolicy::new().with_initial_wait(Duration::from_millis(10));
    let cancel = CancellationToken::new();
    let calls = AtomicUsize::new(0);

    let result: RegistryResult<()> = policy
        .execute(&cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(not_found()) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(result, Err(GemdexError::NotFound { .. })));
}

#[tokio::test]
async fn test_backoff_gaps_grow() {
    let policy = RetryPolicy::new()
        .with_max_attempts(3)
        .with_initial_wait(Duration::from_millis(50))
        .with_max_wait(Duration::from_secs(1));
    let cancel = CancellationToken::new();
    let stamps = Mutex::new(Vec::new());

    let result: RegistryResult<()> = policy
        .execute(&cancel, || {
            stamps.lock().unwrap().push(Instant::now());
            async { Err(server_error()) }
        })
        .await;
    assert!(result.is_err());

    let stamps = stamps.into_inner().unwrap();
    assert_eq!(stamps.len(), 3);
    let first_gap = stamps[1] - stamps[0];
    let second_gap = stamps[2] - stamps[1];
    assert!(first_gap >= Duration::from_millis(50), "first gap {first_gap:?}");
    assert!(second_gap >= Duration::from_millis(100), "second gap {second_gap:?}");
    assert!(second_gap > first_gap);
}

#[tokio::test]
async fn test_cancellation_during_backoff() {
    let policy = RetryPolicy::new()
        .with_max_attempts(3)
        .with_initial_wait(Duration::from_secs(5));
    let cancel = CancellationToken::new();
    let calls = AtomicUsize::new(0);

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let result: RegistryResult<()> = policy
        .execute(&cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(server_error()) }
        })
        .await;

    assert!(matches!(result, Err(GemdexError::Cancelled)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_cancelled_before_first_attempt() {
    let policy = RetryPolicy::default();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let calls = AtomicUsize::new(0);

    let result: RegistryResult<()> = policy
        .execute(&cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

    assert!(matches!(result, Err(GemdexError::Cancelled)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_custom_should_retry_widens_the_default() {
    let policy = RetryPolicy::new()
        .with_max_attempts(2)
        .with_initial_wait(Duration::from_millis(10))
        .with_should_retry(|error| error.is_not_found());
    let cancel = CancellationToken::new();
    let calls = AtomicUsize::new(0);

    let result: RegistryResult<()> = policy
        .execute(&cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(not_found()) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(matches!(result, Err(GemdexError::RetriesExhausted { .. })));
}

#[tokio::test]
async fn test_custom_should_retry_narrows_the_default() {
    let policy = RetryPolicy::new()
        .with_max_attempts(3)
        .with_initial_wait(Duration::from_millis(10))
        .with_should_retry(|_| false);
    let cancel = CancellationToken::new();
    let calls = AtomicUsize::new(0);

    let result: RegistryResult<()> = policy
        .execute(&cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(server_error()) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(result, Err(GemdexError::ServerError { .. })));
}

#[tokio::test]
async fn test_timeout_is_terminal_even_with_permissive_predicate() {
    let policy = RetryPolicy::new()
        .with_max_attempts(3)
        .with_initial_wait(Duration::from_millis(10))
        .with_should_retry(|_| true);
    let cancel = CancellationToken::new();
    let calls = AtomicUsize::new(0);

    let result: RegistryResult<()> = policy
        .execute(&cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(GemdexError::Timeout) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(matches!(result, Err(GemdexError::Timeout)));
}

#[tokio::test]
async fn test_zero_attempt_budget_still_runs_once() {
    let policy = RetryPolicy::new()
        .with_max_attempts(0)
        .with_initial_wait(Duration::from_millis(10));
    let cancel = CancellationToken::new();
    let calls = AtomicUsize::new(0);

    let result: RegistryResult<()> = policy
        .execute(&cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(server_error()) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    match result {
        Err(GemdexError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 1),
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}
