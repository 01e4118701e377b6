use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::{
    CommandQueue, GameLoop, InputRecorder, KeyCode, LoopConfig, LoopState, MetricsHandle,
    MouseButton, PixelsSurface, RenderError, Simulation,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] RenderError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app<S>(
    config: LoopConfig,
    simulation: S,
    commands: CommandQueue<S::Command>,
) -> Result<(), AppError>
where
    S: Simulation + 'static,
{
    run_app_with_metrics(config, simulation, commands, MetricsHandle::default())
}

pub fn run_app_with_metrics<S>(
    config: LoopConfig,
    simulation: S,
    commands: CommandQueue<S::Command>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError>
where
    S: Simulation + 'static,
{
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut surface = PixelsSurface::new(Arc::clone(&window)).map_err(AppError::CreateRenderer)?;
    info!("window_created");

    let base_title = config.window_title.clone();
    let yield_interval = config.yield_interval;
    let mut game_loop =
        GameLoop::new(config, simulation, commands).with_metrics_handle(metrics_handle.clone());
    let size = window.inner_size();
    game_loop.resize(size.width, size.height);
    let recorder = game_loop.input_recorder();
    let mut last_applied_title: Option<String> = None;

    game_loop.init(Instant::now());

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    game_loop.request_close("window_close");
                }
                WindowEvent::Resized(new_size) => {
                    game_loop.resize(new_size.width, new_size.height);
                    if let Err(error) = surface.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        game_loop.request_close("renderer_resize_failed");
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    game_loop.resize(size.width, size.height);
                    if let Err(error) = surface.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        game_loop.request_close("renderer_resize_failed");
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    record_key_transition(
                        &recorder,
                        event.physical_key,
                        event.state == ElementState::Pressed,
                        event.text.as_deref(),
                    );
                }
                WindowEvent::CursorMoved { position, .. } => {
                    recorder.record_cursor_moved(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => {
                    recorder.record_cursor_left();
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    if let Some(button) = map_mouse_button(button) {
                        recorder.record_mouse_button(button, state == ElementState::Pressed);
                    }
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    recorder.record_scroll(scroll_steps_from_delta(delta));
                }
                _ => {}
            },
            Event::AboutToWait => {
                let now = Instant::now();
                if game_loop.iterate_at(now, &mut surface) == LoopState::Terminated {
                    window_target.exit();
                    return;
                }

                let next_title = format_title(&base_title, metrics_handle.snapshot().fps);
                if last_applied_title.as_deref() != Some(next_title.as_str()) {
                    window.set_title(&next_title);
                    last_applied_title = Some(next_title);
                }

                window_target.set_control_flow(ControlFlow::WaitUntil(now + yield_interval));
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn record_key_transition(
    recorder: &InputRecorder,
    physical_key: PhysicalKey,
    is_pressed: bool,
    text: Option<&str>,
) {
    if let Some(key) = map_physical_key(physical_key) {
        if is_pressed {
            recorder.record_key_down(key);
        } else {
            recorder.record_key_up(key);
        }
    }
    if is_pressed {
        for ch in text.unwrap_or_default().chars() {
            recorder.record_typed(ch);
        }
    }
}

fn map_physical_key(key: PhysicalKey) -> Option<KeyCode> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let mapped = match code {
        WinitKeyCode::Backspace => KeyCode::BACKSPACE,
        WinitKeyCode::Tab => KeyCode::TAB,
        WinitKeyCode::Enter | WinitKeyCode::NumpadEnter => KeyCode::ENTER,
        WinitKeyCode::ShiftLeft | WinitKeyCode::ShiftRight => KeyCode::SHIFT,
        WinitKeyCode::ControlLeft | WinitKeyCode::ControlRight => KeyCode::CONTROL,
        WinitKeyCode::AltLeft | WinitKeyCode::AltRight => KeyCode::ALT,
        WinitKeyCode::Escape => KeyCode::ESCAPE,
        WinitKeyCode::Space => KeyCode::SPACE,
        WinitKeyCode::ArrowLeft => KeyCode::LEFT,
        WinitKeyCode::ArrowUp => KeyCode::UP,
        WinitKeyCode::ArrowRight => KeyCode::RIGHT,
        WinitKeyCode::ArrowDown => KeyCode::DOWN,
        WinitKeyCode::Digit0 => KeyCode::DIGIT_0,
        WinitKeyCode::Digit1 => KeyCode::DIGIT_1,
        WinitKeyCode::Digit2 => KeyCode::DIGIT_2,
        WinitKeyCode::Digit3 => KeyCode::DIGIT_3,
        WinitKeyCode::Digit4 => KeyCode::DIGIT_4,
        WinitKeyCode::Digit5 => KeyCode::DIGIT_5,
        WinitKeyCode::Digit6 => KeyCode::DIGIT_6,
        WinitKeyCode::Digit7 => KeyCode::DIGIT_7,
        WinitKeyCode::Digit8 => KeyCode::DIGIT_8,
        WinitKeyCode::Digit9 => KeyCode::DIGIT_9,
        WinitKeyCode::KeyA => KeyCode::A,
        WinitKeyCode::KeyB => KeyCode::B,
        WinitKeyCode::KeyC => KeyCode::C,
        WinitKeyCode::KeyD => KeyCode::D,
        WinitKeyCode::KeyE => KeyCode::E,
        WinitKeyCode::KeyF => KeyCode::F,
        WinitKeyCode::KeyG => KeyCode::G,
        WinitKeyCode::KeyH => KeyCode::H,
        WinitKeyCode::KeyI => KeyCode::I,
        WinitKeyCode::KeyJ => KeyCode::J,
        WinitKeyCode::KeyK => KeyCode::K,
        WinitKeyCode::KeyL => KeyCode::L,
        WinitKeyCode::KeyM => KeyCode::M,
        WinitKeyCode::KeyN => KeyCode::N,
        WinitKeyCode::KeyO => KeyCode::O,
        WinitKeyCode::KeyP => KeyCode::P,
        WinitKeyCode::KeyQ => KeyCode::Q,
        WinitKeyCode::KeyR => KeyCode::R,
        WinitKeyCode::KeyS => KeyCode::S,
        WinitKeyCode::KeyT => KeyCode::T,
        WinitKeyCode::KeyU => KeyCode::U,
        WinitKeyCode::KeyV => KeyCode::V,
        WinitKeyCode::KeyW => KeyCode::W,
        WinitKeyCode::KeyX => KeyCode::X,
        WinitKeyCode::KeyY => KeyCode::Y,
        WinitKeyCode::KeyZ => KeyCode::Z,
        WinitKeyCode::F1 => KeyCode::F1,
        WinitKeyCode::F2 => KeyCode::F2,
        WinitKeyCode::F3 => KeyCode::F3,
        WinitKeyCode::F4 => KeyCode::F4,
        WinitKeyCode::F5 => KeyCode::F5,
        WinitKeyCode::F6 => KeyCode::F6,
        WinitKeyCode::F7 => KeyCode::F7,
        WinitKeyCode::F8 => KeyCode::F8,
        WinitKeyCode::F9 => KeyCode::F9,
        WinitKeyCode::F10 => KeyCode::F10,
        WinitKeyCode::F11 => KeyCode::F11,
        WinitKeyCode::F12 => KeyCode::F12,
        WinitKeyCode::Delete => KeyCode::DELETE,
        _ => return None,
    };
    Some(mapped)
}

fn map_mouse_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        _ => None,
    }
}

fn scroll_steps_from_delta(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y.round() as i32,
        MouseScrollDelta::PixelDelta(position) => {
            if position.y > 0.0 {
                1
            } else if position.y < 0.0 {
                -1
            } else {
                0
            }
        }
    }
}

fn format_title(base_title: &str, fps: f32) -> String {
    if fps > 0.0 {
        format!("{base_title} - {} fps", fps.round() as u32)
    } else {
        base_title.to_string()
    }
}
