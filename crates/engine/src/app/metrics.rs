use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoopMetricsSnapshot {
    /// Moving average of per-tick frame rate.
    pub fps: f32,
    pub tps: f32,
    pub dropped_backlogs: u32,
}

#[derive(Clone, Debug)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl Default for MetricsHandle {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(LoopMetricsSnapshot::default())),
        }
    }
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                let mut guard = poisoned.into_inner();
                *guard = snapshot;
            }
        }
    }
}

/// Exponential moving average: `fps = (fps * (n - 1) + 1 / delta) / n`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FpsAverage {
    value: f64,
    window: u32,
}

impl FpsAverage {
    pub(crate) fn new(window: u32) -> Self {
        Self {
            value: 0.0,
            window: window.max(1),
        }
    }

    pub(crate) fn push(&mut self, delta_seconds: f64) {
        if !delta_seconds.is_finite() || delta_seconds <= 0.0 {
            return;
        }
        let window = f64::from(self.window);
        self.value = (self.value * (window - 1.0) + 1.0 / delta_seconds) / window;
    }

    pub(crate) fn value(&self) -> f64 {
        self.value
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Option<Instant>,
    interval: Duration,
    ticks: u32,
    dropped_backlogs: u32,
    fps: FpsAverage,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, fps_window: u32) -> Self {
        Self {
            interval_start: None,
            interval,
            ticks: 0,
            dropped_backlogs: 0,
            fps: FpsAverage::new(fps_window),
        }
    }

    pub(crate) fn start(&mut self, now: Instant) {
        self.interval_start = Some(now);
    }

    pub(crate) fn record_tick(&mut self, delta_seconds: f64) {
        self.ticks = self.ticks.saturating_add(1);
        self.fps.push(delta_seconds);
    }

    pub(crate) fn record_backlog_drop(&mut self) {
        self.dropped_backlogs = self.dropped_backlogs.saturating_add(1);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let interval_start = *self.interval_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let snapshot = LoopMetricsSnapshot {
            fps: self.fps.value() as f32,
            tps: self.ticks as f32 / elapsed_seconds,
            dropped_backlogs: self.dropped_backlogs,
        };

        self.interval_start = Some(now);
        self.ticks = 0;
        self.dropped_backlogs = 0;

        Some(snapshot)
    }
}
