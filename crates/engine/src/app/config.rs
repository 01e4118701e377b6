use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use super::frame_clock::{DEFAULT_STALL_RESET_FRAMES, DEFAULT_STALL_WARN_FRAMES};
use super::{KeyCode, Rgba, Viewport};

pub const TARGET_FPS_ENV_VAR: &str = "FUTURETD_TARGET_FPS";
pub const YIELD_MS_ENV_VAR: &str = "FUTURETD_YIELD_MS";
pub const DEFAULT_YIELD_INTERVAL: Duration = Duration::from_millis(2);

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub reference_width: u32,
    pub reference_height: u32,
    pub target_fps: u32,
    pub yield_interval: Duration,
    pub stall_reset_frames: u32,
    pub stall_warn_frames: u32,
    pub fps_smoothing_frames: u32,
    pub metrics_log_interval: Duration,
    pub quit_key: Option<KeyCode>,
    pub clear_color: Rgba,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "FutureTD".to_string(),
            window_width: 1280,
            window_height: 720,
            reference_width: 1920,
            reference_height: 1080,
            target_fps: 144,
            yield_interval: DEFAULT_YIELD_INTERVAL,
            stall_reset_frames: DEFAULT_STALL_RESET_FRAMES,
            stall_warn_frames: DEFAULT_STALL_WARN_FRAMES,
            fps_smoothing_frames: 30,
            metrics_log_interval: Duration::from_secs(1),
            quit_key: Some(KeyCode::ESCAPE),
            clear_color: [255, 255, 255, 255],
        }
    }
}

impl LoopConfig {
    /// Applies `FUTURETD_TARGET_FPS` and `FUTURETD_YIELD_MS` when set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(env::var(TARGET_FPS_ENV_VAR), env::var(YIELD_MS_ENV_VAR))
    }

    fn with_overrides(
        mut self,
        target_fps: Result<String, env::VarError>,
        yield_ms: Result<String, env::VarError>,
    ) -> Self {
        self.target_fps = resolve_env_override(TARGET_FPS_ENV_VAR, target_fps, self.target_fps);
        let yield_ms = resolve_env_override(
            YIELD_MS_ENV_VAR,
            yield_ms,
            self.yield_interval.as_millis() as u64,
        );
        // A zero yield would spin the loop.
        self.yield_interval =
            normalize_non_zero_duration(Duration::from_millis(yield_ms), DEFAULT_YIELD_INTERVAL);
        self
    }

    pub fn reference_viewport(&self) -> Viewport {
        Viewport {
            width: self.reference_width,
            height: self.reference_height,
        }
    }

    pub fn window_viewport(&self) -> Viewport {
        Viewport {
            width: self.window_width,
            height: self.window_height,
        }
    }
}

fn resolve_env_override<T>(
    env_var: &'static str,
    value: Result<String, env::VarError>,
    fallback: T,
) -> T
where
    T: FromStr,
{
    match value {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    env_var,
                    value = raw.as_str(),
                    "invalid env var value; falling back to config"
                );
                fallback
            }
        },
        Err(env::VarError::NotPresent) => fallback,
        Err(err) => {
            warn!(
                env_var,
                error = %err,
                "unable to read env var; falling back to config"
            );
            fallback
        }
    }
}

pub(crate) fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    #[test]
    fn defaults_match_reference_canvas_and_rate() {
        let config = LoopConfig::default();
        assert_eq!(config.reference_viewport(), Viewport { width: 1920, height: 1080 });
        assert_eq!(config.target_fps, 144);
        assert_eq!(config.yield_interval, Duration::from_millis(2));
        assert_eq!(config.quit_key, Some(KeyCode::ESCAPE));
    }

    #[test]
    fn env_override_parses_valid_value() {
        let fps = resolve_env_override(TARGET_FPS_ENV_VAR, Ok(" 60 ".to_string()), 144u32);
        assert_eq!(fps, 60);
    }

    #[test]
    fn env_override_falls_back_on_invalid_value() {
        let fps = resolve_env_override(TARGET_FPS_ENV_VAR, Ok("fast".to_string()), 144u32);
        assert_eq!(fps, 144);
    }

    #[test]
    fn env_override_falls_back_when_missing_or_unreadable() {
        let missing = resolve_env_override(YIELD_MS_ENV_VAR, Err(env::VarError::NotPresent), 2u64);
        let unreadable = resolve_env_override(
            YIELD_MS_ENV_VAR,
            Err(env::VarError::NotUnicode(OsString::from("x"))),
            2u64,
        );
        assert_eq!(missing, 2);
        assert_eq!(unreadable, 2);
    }

    #[test]
    fn zero_yield_override_keeps_a_non_zero_interval() {
        let config = LoopConfig::default()
            .with_overrides(Err(env::VarError::NotPresent), Ok("0".to_string()));
        assert_eq!(config.yield_interval, DEFAULT_YIELD_INTERVAL);

        let config = LoopConfig::default()
            .with_overrides(Ok("60".to_string()), Ok("5".to_string()));
        assert_eq!(config.target_fps, 60);
        assert_eq!(config.yield_interval, Duration::from_millis(5));
    }

    #[test]
    fn zero_duration_is_normalized() {
        let fallback = Duration::from_secs(1);
        assert_eq!(normalize_non_zero_duration(Duration::ZERO, fallback), fallback);
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(3), fallback),
            Duration::from_millis(3)
        );
    }
}
