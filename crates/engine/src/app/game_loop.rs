use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::config::{normalize_non_zero_duration, DEFAULT_YIELD_INTERVAL};
use super::metrics::MetricsAccumulator;
use super::{
    reference_scale, CommandQueue, FrameClock, InputPoller, InputRecorder, LoopConfig,
    MetricsHandle, RenderError, RenderTarget, Simulation, TickControl, Viewport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    Running,
    /// Absorbing; a terminated loop never resumes.
    Terminated,
}

/// Cooperative termination flag, observed at the top of each iteration.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Returns `true` only for the call that actually set the flag.
    pub fn request(&self) -> bool {
        !self.requested.swap(true, Ordering::AcqRel)
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

pub struct GameLoop<S: Simulation> {
    config: LoopConfig,
    clock: FrameClock,
    input: InputPoller,
    simulation: S,
    commands: CommandQueue<S::Command>,
    scale: f64,
    state: LoopState,
    shutdown: ShutdownHandle,
    metrics: MetricsAccumulator,
    metrics_handle: MetricsHandle,
}

impl<S: Simulation> GameLoop<S> {
    pub fn new(mut config: LoopConfig, simulation: S, commands: CommandQueue<S::Command>) -> Self {
        config.yield_interval =
            normalize_non_zero_duration(config.yield_interval, DEFAULT_YIELD_INTERVAL);
        let clock = FrameClock::from_target_fps(config.target_fps)
            .with_stall_thresholds(config.stall_reset_frames, config.stall_warn_frames);
        let metrics_log_interval =
            normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
        let metrics = MetricsAccumulator::new(metrics_log_interval, config.fps_smoothing_frames);
        let scale = reference_scale(config.window_viewport(), config.reference_viewport());
        let mut input = InputPoller::new();
        input.set_scale(scale);

        Self {
            config,
            clock,
            input,
            simulation,
            commands,
            scale,
            state: LoopState::Uninitialized,
            shutdown: ShutdownHandle::default(),
            metrics,
            metrics_handle: MetricsHandle::default(),
        }
    }

    pub fn with_metrics_handle(mut self, metrics_handle: MetricsHandle) -> Self {
        self.metrics_handle = metrics_handle;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn input_recorder(&self) -> InputRecorder {
        self.input.recorder()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn metrics_handle(&self) -> MetricsHandle {
        self.metrics_handle.clone()
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn init(&mut self, now: Instant) {
        if self.state != LoopState::Uninitialized {
            return;
        }
        self.clock.start(now);
        self.metrics.start(now);
        self.state = LoopState::Running;
        info!(
            target_fps = self.config.target_fps,
            min_frame_time_ns = self.clock.min_frame_time().as_nanos() as u64,
            yield_ms = self.config.yield_interval.as_millis() as u64,
            scale = self.scale,
            "game_started"
        );
    }

    pub fn request_close(&self, reason: &'static str) {
        if self.shutdown.request() {
            info!(reason, "shutdown_requested");
        }
    }

    /// Recomputes the uniform reference scale for a new surface size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.scale = reference_scale(Viewport { width, height }, self.config.reference_viewport());
        self.input.set_scale(self.scale);
        debug!(width, height, scale = self.scale, "scale_factor_changed");
    }

    /// One loop iteration: runs at most one tick if the clock says one is due.
    pub fn iterate_at(&mut self, now: Instant, target: &mut dyn RenderTarget) -> LoopState {
        if self.state == LoopState::Running && self.shutdown.is_requested() {
            self.state = LoopState::Terminated;
            info!("loop_terminated");
        }
        if self.state != LoopState::Running {
            return self.state;
        }

        let check = self.clock.check_at(now);
        if check.backlog_dropped {
            self.metrics.record_backlog_drop();
            debug!(
                behind_ms = check.behind.as_millis() as u64,
                "backlog_dropped"
            );
        }
        if check.advance {
            self.tick(now, target);
        }

        if let Some(snapshot) = self.metrics.maybe_snapshot(now) {
            self.metrics_handle.publish(snapshot);
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                dropped_backlogs = snapshot.dropped_backlogs,
                "loop_metrics"
            );
        }

        self.state
    }

    /// Blocking driver: iterates with a short sleep until terminated.
    pub fn run(&mut self, target: &mut dyn RenderTarget) -> LoopState {
        self.init(Instant::now());
        while self.iterate_at(Instant::now(), target) == LoopState::Running {
            thread::sleep(self.config.yield_interval);
        }
        info!("shutdown");
        self.state
    }

    fn tick(&mut self, now: Instant, target: &mut dyn RenderTarget) {
        let delta = self.clock.delta_at(now);
        self.metrics.record_tick(delta);

        self.input.poll();
        if let Some(command) = self.commands.try_next() {
            self.simulation.handle_command(command);
        }

        if self.simulation.update(delta, &mut self.input) == TickControl::Quit {
            self.request_close("simulation_quit");
        }
        if let Some(quit_key) = self.config.quit_key {
            if self.input.is_down(quit_key) {
                self.request_close("quit_key");
            }
        }

        if let Err(error) = self.render(target) {
            warn!(error = %error, "render_present_failed");
            self.request_close("render_failed");
        }
    }

    fn render(&mut self, target: &mut dyn RenderTarget) -> Result<(), RenderError> {
        target.clear(self.config.clear_color);
        target.scale(self.scale);
        self.simulation.render(target);
        target.present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{command_channel, CommandSender, KeyCode, RectF, Rgba};

    const FRAME: Duration = Duration::from_millis(10);

    #[derive(Debug, Clone, PartialEq)]
    enum DrawCall {
        Clear,
        Scale(f64),
        Rect(RectF),
        Present,
    }

    #[derive(Default)]
    struct RecordingTarget {
        calls: Vec<DrawCall>,
        fail_present: bool,
    }

    impl RenderTarget for RecordingTarget {
        fn clear(&mut self, _color: Rgba) {
            self.calls.push(DrawCall::Clear);
        }

        fn scale(&mut self, factor: f64) {
            self.calls.push(DrawCall::Scale(factor));
        }

        fn fill_rect(&mut self, rect: RectF, _color: Rgba) {
            self.calls.push(DrawCall::Rect(rect));
        }

        fn present(&mut self) -> Result<(), RenderError> {
            self.calls.push(DrawCall::Present);
            if self.fail_present {
                Err(RenderError::Unavailable("test surface"))
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct ScriptedSimulation {
        deltas: Vec<f64>,
        commands: Vec<u32>,
        a_down_once: Vec<bool>,
        a_down: Vec<bool>,
        typed: Vec<String>,
        quit_on_update: Option<usize>,
    }

    impl Simulation for ScriptedSimulation {
        type Command = u32;

        fn handle_command(&mut self, command: u32) {
            self.commands.push(command);
        }

        fn update(&mut self, delta_seconds: f64, input: &mut InputPoller) -> TickControl {
            self.deltas.push(delta_seconds);
            self.a_down_once.push(input.is_down_once(KeyCode::A));
            self.a_down.push(input.is_down(KeyCode::A));
            self.typed.push(input.typed_string().to_string());
            if self.quit_on_update == Some(self.deltas.len()) {
                TickControl::Quit
            } else {
                TickControl::Continue
            }
        }

        fn render(&mut self, target: &mut dyn RenderTarget) {
            target.fill_rect(RectF::new(0.0, 0.0, 60.0, 60.0), [0, 0, 0, 255]);
        }
    }

    fn test_config() -> LoopConfig {
        LoopConfig {
            target_fps: 100,
            window_width: 1920,
            window_height: 1080,
            ..LoopConfig::default()
        }
    }

    fn started_loop(
        simulation: ScriptedSimulation,
    ) -> (GameLoop<ScriptedSimulation>, CommandSender<u32>, Instant) {
        let (sender, queue) = command_channel();
        let mut game_loop = GameLoop::new(test_config(), simulation, queue);
        let base = Instant::now();
        game_loop.init(base);
        (game_loop, sender, base)
    }

    #[test]
    fn loop_starts_uninitialized_and_ignores_iterations() {
        let (_sender, queue) = command_channel();
        let mut game_loop = GameLoop::new(test_config(), ScriptedSimulation::default(), queue);
        let mut target = RecordingTarget::default();

        let state = game_loop.iterate_at(Instant::now() + FRAME * 5, &mut target);

        assert_eq!(state, LoopState::Uninitialized);
        assert!(target.calls.is_empty());
        assert!(game_loop.simulation().deltas.is_empty());
    }

    #[test]
    fn tick_runs_only_when_frame_is_due() {
        let (mut game_loop, _sender, base) = started_loop(ScriptedSimulation::default());
        let mut target = RecordingTarget::default();

        game_loop.iterate_at(base + FRAME / 2, &mut target);
        assert!(game_loop.simulation().deltas.is_empty());

        game_loop.iterate_at(base + Duration::from_millis(15), &mut target);
        assert_eq!(game_loop.simulation().deltas.len(), 1);
        assert!((game_loop.simulation().deltas[0] - 0.015).abs() < 1e-9);
    }

    #[test]
    fn render_sequence_is_clear_scale_draw_present() {
        let (mut game_loop, _sender, base) = started_loop(ScriptedSimulation::default());
        let mut target = RecordingTarget::default();

        game_loop.iterate_at(base + FRAME * 2, &mut target);

        assert_eq!(
            target.calls,
            vec![
                DrawCall::Clear,
                DrawCall::Scale(1.0),
                DrawCall::Rect(RectF::new(0.0, 0.0, 60.0, 60.0)),
                DrawCall::Present,
            ]
        );
    }

    #[test]
    fn drains_at_most_one_command_per_tick() {
        let (mut game_loop, sender, base) = started_loop(ScriptedSimulation::default());
        let mut target = RecordingTarget::default();
        for command in [7, 8, 9] {
            sender.send(command).expect("send");
        }

        game_loop.iterate_at(base + Duration::from_millis(15), &mut target);
        assert_eq!(game_loop.simulation().commands, vec![7]);

        game_loop.iterate_at(base + Duration::from_millis(30), &mut target);
        assert_eq!(game_loop.simulation().commands, vec![7, 8]);
    }

    #[test]
    fn input_is_polled_once_per_tick() {
        let (mut game_loop, _sender, base) = started_loop(ScriptedSimulation::default());
        let recorder = game_loop.input_recorder();
        let mut target = RecordingTarget::default();

        recorder.record_key_down(KeyCode::A);
        recorder.record_typed('a');
        game_loop.iterate_at(base + Duration::from_millis(15), &mut target);
        // Not due: no poll, so the edge is not consumed.
        game_loop.iterate_at(base + Duration::from_millis(16), &mut target);
        game_loop.iterate_at(base + Duration::from_millis(30), &mut target);

        let simulation = game_loop.simulation();
        assert_eq!(simulation.a_down_once, vec![true, false]);
        assert_eq!(simulation.a_down, vec![true, true]);
        assert_eq!(simulation.typed, vec!["a".to_string(), String::new()]);
    }

    #[test]
    fn quit_key_terminates_on_next_iteration() {
        let (mut game_loop, _sender, base) = started_loop(ScriptedSimulation::default());
        let mut target = RecordingTarget::default();
        game_loop.input_recorder().record_key_down(KeyCode::ESCAPE);

        let state = game_loop.iterate_at(base + Duration::from_millis(15), &mut target);
        assert_eq!(state, LoopState::Running);
        assert!(game_loop.shutdown_handle().is_requested());

        let state = game_loop.iterate_at(base + Duration::from_millis(30), &mut target);
        assert_eq!(state, LoopState::Terminated);
        assert_eq!(game_loop.simulation().deltas.len(), 1);
    }

    #[test]
    fn simulation_quit_terminates_loop() {
        let simulation = ScriptedSimulation {
            quit_on_update: Some(2),
            ..ScriptedSimulation::default()
        };
        let (mut game_loop, _sender, base) = started_loop(simulation);
        let mut target = RecordingTarget::default();

        for step in 1..=6u32 {
            game_loop.iterate_at(base + Duration::from_millis(15) * step, &mut target);
        }

        assert_eq!(game_loop.state(), LoopState::Terminated);
        assert_eq!(game_loop.simulation().deltas.len(), 2);
    }

    #[test]
    fn present_failure_terminates_loop() {
        let (mut game_loop, _sender, base) = started_loop(ScriptedSimulation::default());
        let mut target = RecordingTarget {
            fail_present: true,
            ..RecordingTarget::default()
        };

        game_loop.iterate_at(base + Duration::from_millis(15), &mut target);
        let state = game_loop.iterate_at(base + Duration::from_millis(30), &mut target);

        assert_eq!(state, LoopState::Terminated);
    }

    #[test]
    fn terminated_is_absorbing() {
        let (mut game_loop, _sender, base) = started_loop(ScriptedSimulation::default());
        let mut target = RecordingTarget::default();
        game_loop.request_close("test");
        assert_eq!(
            game_loop.iterate_at(base + FRAME * 2, &mut target),
            LoopState::Terminated
        );

        game_loop.init(base + FRAME * 3);
        let state = game_loop.iterate_at(base + FRAME * 5, &mut target);

        assert_eq!(state, LoopState::Terminated);
        assert!(target.calls.is_empty());
    }

    #[test]
    fn resize_recomputes_uniform_scale() {
        let (mut game_loop, _sender, base) = started_loop(ScriptedSimulation::default());
        let mut target = RecordingTarget::default();

        game_loop.resize(3840, 1080);
        assert_eq!(game_loop.scale(), 2.0);

        game_loop.resize(0, 720);
        assert_eq!(game_loop.scale(), 2.0);

        game_loop.iterate_at(base + FRAME * 2, &mut target);
        assert!(target.calls.contains(&DrawCall::Scale(2.0)));
    }

    #[test]
    fn zero_yield_interval_is_replaced_with_default() {
        let (_sender, queue) = command_channel();
        let config = LoopConfig {
            yield_interval: Duration::ZERO,
            ..test_config()
        };
        let game_loop = GameLoop::new(config, ScriptedSimulation::default(), queue);

        assert_eq!(game_loop.config().yield_interval, DEFAULT_YIELD_INTERVAL);
    }

    #[test]
    fn initial_scale_follows_window_size() {
        let (_sender, queue) = command_channel();
        let game_loop = GameLoop::new(LoopConfig::default(), ScriptedSimulation::default(), queue);
        assert!((game_loop.scale() - 1280.0 / 1920.0).abs() < 1e-12);
    }

    #[test]
    fn stall_is_counted_as_dropped_backlog() {
        let (mut game_loop, _sender, base) = started_loop(ScriptedSimulation::default());
        let mut target = RecordingTarget::default();

        game_loop.iterate_at(base + FRAME * 10, &mut target);
        let snapshot_time = base + Duration::from_secs(1);
        game_loop.iterate_at(snapshot_time, &mut target);

        assert_eq!(game_loop.metrics_handle().snapshot().dropped_backlogs, 2);
    }

    #[test]
    fn run_stops_when_shutdown_requested_from_another_thread() {
        let (_sender, queue) = command_channel();
        let config = LoopConfig {
            target_fps: 1000,
            yield_interval: Duration::from_millis(1),
            ..test_config()
        };
        let mut game_loop = GameLoop::new(config, ScriptedSimulation::default(), queue);
        let shutdown = game_loop.shutdown_handle();
        let recorder = game_loop.input_recorder();
        let mut target = RecordingTarget::default();

        let producer = thread::spawn(move || {
            recorder.record_key_down(KeyCode::A);
            thread::sleep(Duration::from_millis(50));
            shutdown.request();
        });
        let state = game_loop.run(&mut target);
        producer.join().expect("producer thread");

        assert_eq!(state, LoopState::Terminated);
        assert!(!game_loop.simulation().deltas.is_empty());
        assert!(target.calls.contains(&DrawCall::Present));
    }
}
