use std::time::{Duration, Instant};

use tracing::warn;

pub const DEFAULT_STALL_RESET_FRAMES: u32 = 4;
pub const DEFAULT_STALL_WARN_FRAMES: u32 = 32;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Outcome of a single scheduler check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCheck {
    pub advance: bool,
    /// Wall time the simulation was behind when the check ran.
    pub behind: Duration,
    pub backlog_dropped: bool,
}

/// Fixed-timestep gate plus an exact wall-clock delta.
///
/// `game_time` only moves in steps of `min_frame_time`; `last_update` moves by
/// whatever was measured. Both are offsets from the first instant the clock
/// sees.
#[derive(Debug, Clone)]
pub struct FrameClock {
    min_frame_time: Duration,
    stall_reset_frames: u32,
    stall_warn_frames: u32,
    origin: Option<Instant>,
    game_time: Duration,
    last_update: Duration,
}

impl FrameClock {
    pub fn new(min_frame_time: Duration) -> Self {
        Self {
            min_frame_time: normalize_min_frame_time(min_frame_time),
            stall_reset_frames: DEFAULT_STALL_RESET_FRAMES,
            stall_warn_frames: DEFAULT_STALL_WARN_FRAMES,
            origin: None,
            game_time: Duration::ZERO,
            last_update: Duration::ZERO,
        }
    }

    pub fn from_target_fps(target_fps: u32) -> Self {
        Self::new(min_frame_time_for_fps(target_fps))
    }

    pub fn with_stall_thresholds(mut self, reset_frames: u32, warn_frames: u32) -> Self {
        self.stall_reset_frames = reset_frames.max(1);
        self.stall_warn_frames = warn_frames.max(1);
        self
    }

    pub fn min_frame_time(&self) -> Duration {
        self.min_frame_time
    }

    pub fn start(&mut self, now: Instant) {
        self.origin = Some(now);
        self.game_time = Duration::ZERO;
        self.last_update = Duration::ZERO;
    }

    pub fn should_advance_frame(&mut self) -> bool {
        self.should_advance_frame_at(Instant::now())
    }

    pub fn should_advance_frame_at(&mut self, now: Instant) -> bool {
        self.check_at(now).advance
    }

    pub fn check_at(&mut self, now: Instant) -> FrameCheck {
        let now = self.offset(now);
        let min = self.min_frame_time;
        let diff = now.saturating_sub(self.game_time);

        let mut backlog_dropped = false;
        if diff > min.saturating_mul(self.stall_reset_frames) {
            self.game_time = now.saturating_sub(min);
            backlog_dropped = true;
        }
        if diff > min.saturating_mul(self.stall_warn_frames) {
            warn!(frames_behind = frames_in(diff, min), "frames_behind");
        }

        let advance = diff > min;
        if advance {
            self.game_time = self.game_time.saturating_add(min);
        }

        FrameCheck {
            advance,
            behind: diff,
            backlog_dropped,
        }
    }

    pub fn delta(&mut self) -> f64 {
        self.delta_at(Instant::now())
    }

    /// Seconds since the previous call. Successive results sum to the total
    /// elapsed time.
    pub fn delta_at(&mut self, now: Instant) -> f64 {
        let now = self.offset(now);
        let diff = now.saturating_sub(self.last_update);
        self.last_update = self.last_update.saturating_add(diff);
        diff.as_secs_f64()
    }

    fn offset(&mut self, now: Instant) -> Duration {
        let origin = *self.origin.get_or_insert(now);
        now.saturating_duration_since(origin)
    }
}

pub fn min_frame_time_for_fps(target_fps: u32) -> Duration {
    Duration::from_nanos(NANOS_PER_SECOND / u64::from(target_fps.max(1)))
}

fn normalize_min_frame_time(value: Duration) -> Duration {
    if value.is_zero() {
        Duration::from_nanos(1)
    } else {
        value
    }
}

fn frames_in(diff: Duration, min: Duration) -> u64 {
    (diff.as_nanos() / min.as_nanos().max(1)) as u64
}
