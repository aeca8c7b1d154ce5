//! Session clock: a pausable one-second tick counter.
//!
//! This is display state only. Per-task time is measured separately from
//! timestamps in the record store and never reads this counter.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Seconds below which the timer is shown as active.
pub const WARNING_AFTER_SECS: u64 = 300;
/// Seconds at or above which the timer is shown as critical.
pub const CRITICAL_AFTER_SECS: u64 = 600;

#[derive(Debug)]
struct Inner {
    elapsed_secs: AtomicU64,
    running: AtomicBool,
}

/// Shared handle to a session's elapsed-time counter.
///
/// Clones share the same counter, so a ticker task and the session can both
/// hold one.
#[derive(Debug, Clone)]
pub struct SessionClock {
    inner: Arc<Inner>,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock {
    /// A running clock at zero.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                elapsed_secs: AtomicU64::new(0),
                running: AtomicBool::new(true),
            }),
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.inner.elapsed_secs.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Relaxed)
    }

    /// Advance by one second if running. Returns the new value.
    pub fn tick(&self) -> u64 {
        if self.is_running() {
            self.inner.elapsed_secs.fetch_add(1, Ordering::Relaxed) + 1
        } else {
            self.elapsed_secs()
        }
    }

    pub fn pause(&self) {
        self.inner.running.store(false, Ordering::Relaxed);
    }

    /// Continue counting from the paused value.
    pub fn resume(&self) {
        self.inner.running.store(true, Ordering::Relaxed);
    }

    /// Flip between running and paused. Returns the new running state.
    pub fn toggle(&self) -> bool {
        let was_running = self.inner.running.fetch_xor(true, Ordering::Relaxed);
        !was_running
    }

    pub fn level(&self) -> TimerLevel {
        TimerLevel::for_secs(self.elapsed_secs())
    }

    /// Spawn a task that ticks this clock every `period`.
    ///
    /// The task stops when the returned handle is dropped.
    pub fn spawn_ticker(&self, period: Duration) -> Ticker {
        let clock = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                clock.tick();
            }
        });
        Ticker { handle }
    }
}

/// Background ticking task. Aborted on drop.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// How long a session has been running, bucketed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerLevel {
    /// Under five minutes.
    Active,
    /// Five to ten minutes.
    Warning,
    /// Ten minutes or more.
    Critical,
}

impl TimerLevel {
    pub fn for_secs(secs: u64) -> Self {
        if secs < WARNING_AFTER_SECS {
            TimerLevel::Active
        } else if secs < CRITICAL_AFTER_SECS {
            TimerLevel::Warning
        } else {
            TimerLevel::Critical
        }
    }
}

impl fmt::Display for TimerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerLevel::Active => write!(f, "active"),
            TimerLevel::Warning => write!(f, "warning"),
            TimerLevel::Critical => write!(f, "critical"),
        }
    }
}

/// `MM:SS`, or `HH:MM:SS` once past the hour.
pub fn format_elapsed(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
