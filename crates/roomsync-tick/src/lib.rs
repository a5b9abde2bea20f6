//! Fixed-cadence sync tick for roomsync clients.
//!
//! A client sends its owned entities' state a fixed number of times per
//! second (10 Hz by default), independent of its frame rate. The
//! [`TickScheduler`] produces those instants.
//!
//! The scheduler is paused while the client is outside a room. Resuming
//! restarts the cadence from "now" so no burst of stale ticks is emitted.
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = shutdown.changed() => break,
//!         tick = scheduler.wait_for_tick() => client.sync_tick(tick.dt_secs())?,
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What happens when the loop wakes up late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickPolicy {
    /// Forget the missed ticks; the next one is one interval from now.
    #[default]
    Skip,
    /// Keep the initial grid; the next tick stays on schedule even if
    /// that means firing again right away.
    Drop,
}

/// Sync tick settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Ticks per second.
    pub rate_hz: u32,
    pub policy: TickPolicy,
    /// Upper bound of a random delay (µs) added before the first tick, so
    /// clients started together don't send in lockstep.
    pub initial_jitter_us: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            rate_hz: 10,
            policy: TickPolicy::Skip,
            initial_jitter_us: 1_000,
        }
    }
}

impl TickConfig {
    pub const MAX_RATE_HZ: u32 = 60;

    pub fn with_rate(rate_hz: u32) -> Self {
        Self {
            rate_hz,
            ..Self::default()
        }
    }

    /// Clamps `rate_hz` into `1..=MAX_RATE_HZ`.
    pub fn validated(mut self) -> Self {
        let clamped = self.rate_hz.clamp(1, Self::MAX_RATE_HZ);
        if clamped != self.rate_hz {
            warn!(rate_hz = self.rate_hz, clamped, "sync tick rate out of range, clamping");
            self.rate_hz = clamped;
        }
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.rate_hz.max(1)))
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// One fired sync tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInfo {
    /// Starts at 1; never reset by pause/resume.
    pub tick: u64,
    /// Always the configured interval.
    pub dt: Duration,
    /// Whole intervals missed before this tick fired.
    pub ticks_skipped: u64,
}

impl TickInfo {
    pub fn dt_secs(&self) -> f32 {
        self.dt.as_secs_f32()
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Produces sync ticks at a fixed rate on tokio time.
#[derive(Debug)]
pub struct TickScheduler {
    config: TickConfig,
    interval: Duration,
    tick_count: u64,
    total_skipped: u64,
    next_tick: Instant,
    paused: bool,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let interval = config.interval();
        let jitter = if config.initial_jitter_us > 0 {
            Duration::from_micros(rand::rng().random_range(0..config.initial_jitter_us))
        } else {
            Duration::ZERO
        };
        debug!(rate_hz = config.rate_hz, policy = ?config.policy, ?jitter, "sync tick scheduler created");

        Self {
            next_tick: Instant::now() + interval + jitter,
            config,
            interval,
            tick_count: 0,
            total_skipped: 0,
            paused: false,
        }
    }

    pub fn with_rate(rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(rate_hz))
    }

    /// Resolves at the next tick. While paused, never resolves.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.paused {
            std::future::pending::<()>().await;
        }

        let due = self.next_tick;
        time::sleep_until(due).await;

        let now = Instant::now();
        let late_by = now.saturating_duration_since(due);
        let missed = (late_by.as_nanos() / self.interval.as_nanos()) as u64;
        self.tick_count += 1;

        let mut ticks_skipped = 0;
        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if missed > 0 {
                    ticks_skipped = missed;
                    self.total_skipped += missed;
                    warn!(tick = self.tick_count, skipped = missed, "sync tick late, skipping ahead");
                }
                now + self.interval
            }
            TickPolicy::Drop => due + self.interval,
        };

        trace!(tick = self.tick_count, "sync tick");
        TickInfo {
            tick: self.tick_count,
            dt: self.interval,
            ticks_skipped,
        }
    }

    /// Stops ticking. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "sync tick paused");
        }
    }

    /// Restarts ticking one interval from now. Idempotent.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = Instant::now() + self.interval;
            debug!(tick = self.tick_count, "sync tick resumed");
        }
    }

    /// Pauses or resumes to match `active`.
    pub fn set_active(&mut self, active: bool) {
        if active {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn total_skipped(&self) -> u64 {
        self.total_skipped
    }

    pub fn rate_hz(&self) -> u32 {
        self.config.rate_hz
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
