mod commands;
mod config;
mod frame_clock;
mod game_loop;
mod geometry;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod simulation;

pub use commands::{command_channel, CommandQueue, CommandQueueClosed, CommandSender};
pub use config::{LoopConfig, DEFAULT_YIELD_INTERVAL, TARGET_FPS_ENV_VAR, YIELD_MS_ENV_VAR};
pub use frame_clock::{
    min_frame_time_for_fps, FrameCheck, FrameClock, DEFAULT_STALL_RESET_FRAMES,
    DEFAULT_STALL_WARN_FRAMES,
};
pub use game_loop::{GameLoop, LoopState, ShutdownHandle};
pub use geometry::{RectF, Vec2};
pub use input::{InputPoller, InputRecorder, KeyCode, KeyState, MouseButton, KEY_COUNT};
pub use loop_runner::{run_app, run_app_with_metrics, AppError};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use rendering::{reference_scale, PixelsSurface, RenderError, RenderTarget, Rgba, Viewport};
pub use simulation::{Simulation, TickControl};
