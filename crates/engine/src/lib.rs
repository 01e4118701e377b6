//! Client core for FutureTD: a fixed-timestep frame loop, a polled input
//! snapshot, and a winit/pixels host that drives them.

pub mod app;

pub use app::{
    command_channel, min_frame_time_for_fps, reference_scale, run_app, run_app_with_metrics,
    AppError, CommandQueue, CommandQueueClosed, CommandSender, FrameCheck, FrameClock, GameLoop,
    InputPoller, InputRecorder, KeyCode, KeyState, LoopConfig, LoopMetricsSnapshot, LoopState,
    MetricsHandle, MouseButton, PixelsSurface, RectF, RenderError, RenderTarget, Rgba,
    ShutdownHandle, Simulation, TickControl, Vec2, Viewport, DEFAULT_STALL_RESET_FRAMES,
    DEFAULT_STALL_WARN_FRAMES, DEFAULT_YIELD_INTERVAL, KEY_COUNT, TARGET_FPS_ENV_VAR,
    YIELD_MS_ENV_VAR,
};
