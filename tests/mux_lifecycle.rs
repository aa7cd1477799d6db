//! Idle reaping and shutdown of the multiplexer.

use std::sync::Arc;
use std::time::Duration;

use agent_mux::config::parse_config;
use agent_mux::{MatchKind, Mux, MuxError};
use tokio::time::sleep;

mod common;

use common::{default_policy, MockDialer, TestCredential};

const IDLE: Duration = Duration::from_secs(10);

#[tokio::test(start_paused = true)]
async fn test_idle_sessions_are_evicted() {
    let dialer = MockDialer::new();
    let journal = Arc::clone(&dialer.journal);
    let mux = Mux::new(default_policy(), MatchKind::Plain, dialer).unwrap();
    mux.keepalive(IDLE);

    let idle = mux.dial("idle:22").await.unwrap();
    let idle_id = idle.id;
    drop(idle);
    let held = mux.dial("held:22").await.unwrap();

    sleep(Duration::from_secs(5)).await;
    mux.dial("young:22").await.unwrap().release();

    // First tick at t=10: only the unreferenced, old enough session goes
    sleep(Duration::from_secs(6)).await;
    assert!(mux.session_status("idle:22").await.is_none());
    assert!(mux.session_status("held:22").await.is_some());
    assert!(mux.session_status("young:22").await.is_some());
    assert_eq!(journal.closed_ids(), vec![idle_id]);

    // Second tick at t=20 takes the young one
    sleep(Duration::from_secs(10)).await;
    assert!(mux.session_status("young:22").await.is_none());
    assert_eq!(mux.pool_len().await, 1);

    // Referenced sessions survive no matter how old
    sleep(Duration::from_secs(60)).await;
    assert!(mux.session_status("held:22").await.is_some());

    drop(held);
    sleep(IDLE).await;
    assert_eq!(mux.pool_len().await, 0);
    assert_eq!(journal.close_count(), 3);

    mux.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_reaper_wakes_after_pool_empties() {
    let dialer = MockDialer::new();
    let journal = Arc::clone(&dialer.journal);
    let mux = Mux::new(default_policy(), MatchKind::Plain, dialer).unwrap();
    mux.keepalive(IDLE);

    // Empty pool at the first tick disarms the reaper
    sleep(Duration::from_secs(11)).await;

    mux.dial("late:22").await.unwrap().release();
    sleep(Duration::from_secs(9)).await;
    assert_eq!(mux.pool_len().await, 1);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(mux.pool_len().await, 0);
    assert_eq!(journal.close_count(), 1);

    mux.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_wake_while_armed_keeps_timer() {
    let dialer = MockDialer::new();
    let journal = Arc::clone(&dialer.journal);
    let mux = Mux::new(default_policy(), MatchKind::Plain, dialer).unwrap();
    mux.keepalive(IDLE);

    let first = mux.dial("a:22").await.unwrap();
    let first_id = first.id;
    first.release();

    sleep(Duration::from_secs(9)).await;
    mux.dial("b:22").await.unwrap().release();

    // The insert at t=9 must not push the t=10 tick back
    sleep(Duration::from_secs(2)).await;
    assert!(mux.session_status("a:22").await.is_none());
    assert!(mux.session_status("b:22").await.is_some());
    assert_eq!(journal.closed_ids(), vec![first_id]);

    sleep(IDLE).await;
    assert_eq!(mux.pool_len().await, 0);

    mux.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_config_build_starts_reaper() {
    let config = parse_config::<TestCredential>(
        r#"
match_kind = "plain"

[keepalive]
idle_secs = 10

[policy.default]
user = "ops"
"#,
    )
    .unwrap();
    assert!(config.keepalive.enabled);

    let dialer = MockDialer::new();
    let journal = Arc::clone(&dialer.journal);
    let mux = config.build(dialer).unwrap();

    mux.dial("a:22").await.unwrap().release();
    assert_eq!(journal.dialed(), vec![("a:22".to_string(), None)]);

    sleep(Duration::from_secs(11)).await;
    assert_eq!(mux.pool_len().await, 0);
    assert_eq!(journal.close_count(), 1);

    mux.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_config_build_without_keepalive() {
    let config = parse_config::<TestCredential>(
        r#"
match_kind = "plain"

[keepalive]
enabled = false
idle_secs = 10

[policy.default]
user = "ops"
"#,
    )
    .unwrap();

    let dialer = MockDialer::new();
    let journal = Arc::clone(&dialer.journal);
    let mux = config.build(dialer).unwrap();

    mux.dial("a:22").await.unwrap().release();
    sleep(Duration::from_secs(3600)).await;
    assert_eq!(mux.pool_len().await, 1);
    assert_eq!(journal.close_count(), 0);

    mux.close().await.unwrap();
    assert_eq!(journal.close_count(), 1);
}

#[tokio::test]
async fn test_config_build_rejects_bad_policy() {
    let config = parse_config::<TestCredential>(
        r#"
[policy.default]
user = ""
"#,
    )
    .unwrap();

    let err = config.build(MockDialer::new()).err().unwrap();
    assert!(matches!(err, MuxError::Auth(_)));
}

#[tokio::test]
async fn test_sessions_kept_without_keepalive() {
    let mux = Mux::new(default_policy(), MatchKind::Plain, MockDialer::new()).unwrap();
    mux.dial("a:22").await.unwrap().release();

    tokio::time::pause();
    sleep(Duration::from_secs(3600)).await;
    assert_eq!(mux.pool_len().await, 1);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let dialer = MockDialer::new();
    let journal = Arc::clone(&dialer.journal);
    let mux = Mux::new(default_policy(), MatchKind::Plain, dialer).unwrap();
    mux.keepalive(IDLE);

    let held = mux.dial("a:22").await.unwrap();
    mux.dial("b:22").await.unwrap().release();

    assert!(mux.close().await.is_ok());
    assert!(mux.close().await.is_ok());
    assert!(mux.is_closed());

    let mut closed = journal.closed_ids();
    closed.sort_unstable();
    assert_eq!(closed, vec![0, 1]);
    assert_eq!(mux.pool_len().await, 0);

    // Outstanding handles stay valid objects; dropping them is harmless
    drop(held);
    assert_eq!(journal.close_count(), 2);
}

#[tokio::test]
async fn test_dial_after_close_fails_without_io() {
    let dialer = MockDialer::new();
    let journal = Arc::clone(&dialer.journal);
    let mux = Mux::new(default_policy(), MatchKind::Plain, dialer).unwrap();

    mux.close().await.unwrap();
    let err = mux.dial("a:22").await.unwrap_err();

    assert!(matches!(err, MuxError::Closed));
    assert_eq!(journal.dial_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dial_in_flight_during_close() {
    let dialer = MockDialer::new().with_delay(Duration::from_secs(1));
    let journal = Arc::clone(&dialer.journal);
    let mux = Arc::new(Mux::new(default_policy(), MatchKind::Plain, dialer).unwrap());

    let pending = {
        let mux = Arc::clone(&mux);
        tokio::spawn(async move { mux.dial("slow:22").await.map(|h| h.id) })
    };
    // Let the dial start before shutting down
    tokio::task::yield_now().await;
    assert_eq!(journal.dial_count(), 1);

    mux.close().await.unwrap();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(MuxError::Closed)));
    assert_eq!(journal.close_count(), 1);
    assert_eq!(mux.pool_len().await, 0);
}

#[tokio::test]
async fn test_keepalive_after_close_is_ignored() {
    let mux = Mux::new(default_policy(), MatchKind::Plain, MockDialer::new()).unwrap();
    mux.close().await.unwrap();
    mux.keepalive(IDLE);
    mux.keepalive(IDLE);
    assert!(mux.close().await.is_ok());
}
