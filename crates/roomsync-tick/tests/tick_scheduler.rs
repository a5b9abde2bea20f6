//! Sync tick scheduler tests on paused tokio time.

use std::time::Duration;

use roomsync_tick::{TickConfig, TickPolicy, TickScheduler};

// =========================================================================
// Helpers
// =========================================================================

fn no_jitter(rate_hz: u32) -> TickConfig {
    TickConfig {
        initial_jitter_us: 0,
        ..TickConfig::with_rate(rate_hz)
    }
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_is_ten_hz_skip() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.rate_hz, 10);
    assert_eq!(cfg.policy, TickPolicy::Skip);
    assert_eq!(cfg.interval(), Duration::from_millis(100));
}

#[test]
fn test_validated_clamps_zero_and_excess() {
    assert_eq!(TickConfig::with_rate(0).validated().rate_hz, 1);
    assert_eq!(
        TickConfig::with_rate(1_000).validated().rate_hz,
        TickConfig::MAX_RATE_HZ
    );
}

#[test]
fn test_config_from_json_fills_defaults() {
    let cfg: TickConfig = serde_json::from_str(r#"{"rate_hz": 20, "policy": "drop"}"#).unwrap();
    assert_eq!(cfg.rate_hz, 20);
    assert_eq!(cfg.policy, TickPolicy::Drop);
    assert_eq!(cfg.initial_jitter_us, TickConfig::default().initial_jitter_us);
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_fires_after_one_interval() {
    let mut s = TickScheduler::new(no_jitter(10));
    let start = tokio::time::Instant::now();

    let info = s.wait_for_tick().await;

    assert_eq!(info.tick, 1);
    assert_eq!(info.dt, Duration::from_millis(100));
    assert_eq!(info.ticks_skipped, 0);
    assert_eq!(start.elapsed(), Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_ticks_count_up_with_fixed_dt() {
    let mut s = TickScheduler::new(no_jitter(20));

    for expected in 1..=5 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
        assert!((info.dt_secs() - 0.05).abs() < 1e-6);
    }
    assert_eq!(s.tick_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_jitter_delays_first_tick_within_bound() {
    let mut s = TickScheduler::new(TickConfig {
        initial_jitter_us: 5_000,
        ..TickConfig::with_rate(10)
    });
    let start = tokio::time::Instant::now();

    s.wait_for_tick().await;

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_millis(105));
}

// =========================================================================
// Overrun policies
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_skip_policy_reports_missed_ticks() {
    let mut s = TickScheduler::new(no_jitter(10));
    s.wait_for_tick().await;

    // Stall for 3.5 intervals past the next deadline.
    tokio::time::advance(Duration::from_millis(450)).await;
    let info = s.wait_for_tick().await;

    assert_eq!(info.tick, 2);
    assert_eq!(info.ticks_skipped, 3);
    assert_eq!(s.total_skipped(), 3);

    // Cadence restarts from the late wake-up.
    let before = tokio::time::Instant::now();
    s.wait_for_tick().await;
    assert_eq!(before.elapsed(), Duration::from_millis(100));
}

#[tokio::test(start_paused = true)]
async fn test_drop_policy_keeps_initial_grid() {
    let mut s = TickScheduler::new(TickConfig {
        policy: TickPolicy::Drop,
        ..no_jitter(10)
    });
    s.wait_for_tick().await;

    tokio::time::advance(Duration::from_millis(250)).await;
    let info = s.wait_for_tick().await;
    assert_eq!(info.ticks_skipped, 0);

    // The next deadline is still on the 100 ms grid, already in the past.
    let before = tokio::time::Instant::now();
    s.wait_for_tick().await;
    assert!(before.elapsed() < Duration::from_millis(100));
}

// =========================================================================
// Pause / Resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_prevents_ticks() {
    let mut s = TickScheduler::new(no_jitter(10));
    s.wait_for_tick().await;

    s.pause();

    let result = tokio::time::timeout(Duration::from_secs(2), s.wait_for_tick()).await;
    assert!(result.is_err(), "paused scheduler should pend");
    assert_eq!(s.tick_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resume_restarts_cadence_from_now() {
    let mut s = TickScheduler::new(no_jitter(10));
    s.pause();
    tokio::time::advance(Duration::from_secs(3)).await;

    s.resume();
    let before = tokio::time::Instant::now();
    let info = s.wait_for_tick().await;

    assert_eq!(info.tick, 1);
    assert_eq!(info.ticks_skipped, 0);
    assert_eq!(before.elapsed(), Duration::from_millis(100));
}

#[tokio::test]
async fn test_set_active_is_idempotent() {
    let mut s = TickScheduler::with_rate(10);

    s.set_active(false);
    s.set_active(false);
    assert!(s.is_paused());

    s.set_active(true);
    s.set_active(true);
    assert!(!s.is_paused());
}

// =========================================================================
// select! loop
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut s = TickScheduler::new(no_jitter(10));
    let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(350)).await;
        tx.send(()).await.ok();
    });

    let mut fired = 0u64;
    loop {
        tokio::select! {
            Some(()) = rx.recv() => break,
            info = s.wait_for_tick() => {
                fired += 1;
                assert_eq!(info.tick, fired);
            }
        }
    }

    assert_eq!(fired, 3);
}
