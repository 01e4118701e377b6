use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{trace, warn};

use super::Vec2;

pub const KEY_COUNT: usize = 256;
const BUTTON_COUNT: usize = 3;

static INPUT_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_input_lock_poison_once(operation: &'static str) {
    if INPUT_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "input lock poisoned; recovered inner value");
    }
}

/// One of the `KEY_COUNT` keyboard slots.
///
/// Slot numbers follow the classic virtual-key numbering, so letters and
/// digits map to their ASCII upper-case values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(u8);

impl KeyCode {
    pub const BACKSPACE: KeyCode = KeyCode(8);
    pub const TAB: KeyCode = KeyCode(9);
    pub const ENTER: KeyCode = KeyCode(10);
    pub const SHIFT: KeyCode = KeyCode(16);
    pub const CONTROL: KeyCode = KeyCode(17);
    pub const ALT: KeyCode = KeyCode(18);
    pub const ESCAPE: KeyCode = KeyCode(27);
    pub const SPACE: KeyCode = KeyCode(32);
    pub const LEFT: KeyCode = KeyCode(37);
    pub const UP: KeyCode = KeyCode(38);
    pub const RIGHT: KeyCode = KeyCode(39);
    pub const DOWN: KeyCode = KeyCode(40);
    pub const DIGIT_0: KeyCode = KeyCode(48);
    pub const DIGIT_1: KeyCode = KeyCode(49);
    pub const DIGIT_2: KeyCode = KeyCode(50);
    pub const DIGIT_3: KeyCode = KeyCode(51);
    pub const DIGIT_4: KeyCode = KeyCode(52);
    pub const DIGIT_5: KeyCode = KeyCode(53);
    pub const DIGIT_6: KeyCode = KeyCode(54);
    pub const DIGIT_7: KeyCode = KeyCode(55);
    pub const DIGIT_8: KeyCode = KeyCode(56);
    pub const DIGIT_9: KeyCode = KeyCode(57);
    pub const A: KeyCode = KeyCode(65);
    pub const B: KeyCode = KeyCode(66);
    pub const C: KeyCode = KeyCode(67);
    pub const D: KeyCode = KeyCode(68);
    pub const E: KeyCode = KeyCode(69);
    pub const F: KeyCode = KeyCode(70);
    pub const G: KeyCode = KeyCode(71);
    pub const H: KeyCode = KeyCode(72);
    pub const I: KeyCode = KeyCode(73);
    pub const J: KeyCode = KeyCode(74);
    pub const K: KeyCode = KeyCode(75);
    pub const L: KeyCode = KeyCode(76);
    pub const M: KeyCode = KeyCode(77);
    pub const N: KeyCode = KeyCode(78);
    pub const O: KeyCode = KeyCode(79);
    pub const P: KeyCode = KeyCode(80);
    pub const Q: KeyCode = KeyCode(81);
    pub const R: KeyCode = KeyCode(82);
    pub const S: KeyCode = KeyCode(83);
    pub const T: KeyCode = KeyCode(84);
    pub const U: KeyCode = KeyCode(85);
    pub const V: KeyCode = KeyCode(86);
    pub const W: KeyCode = KeyCode(87);
    pub const X: KeyCode = KeyCode(88);
    pub const Y: KeyCode = KeyCode(89);
    pub const Z: KeyCode = KeyCode(90);
    pub const F1: KeyCode = KeyCode(112);
    pub const F2: KeyCode = KeyCode(113);
    pub const F3: KeyCode = KeyCode(114);
    pub const F4: KeyCode = KeyCode(115);
    pub const F5: KeyCode = KeyCode(116);
    pub const F6: KeyCode = KeyCode(117);
    pub const F7: KeyCode = KeyCode(118);
    pub const F8: KeyCode = KeyCode(119);
    pub const F9: KeyCode = KeyCode(120);
    pub const F10: KeyCode = KeyCode(121);
    pub const F11: KeyCode = KeyCode(122);
    pub const F12: KeyCode = KeyCode(123);
    pub const DELETE: KeyCode = KeyCode(127);

    /// Returns `None` for codes outside `0..KEY_COUNT`.
    pub const fn from_raw(code: i32) -> Option<KeyCode> {
        if code >= 0 && code < KEY_COUNT as i32 {
            Some(KeyCode(code as u8))
        } else {
            None
        }
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyState {
    #[default]
    Released,
    /// Down on this poll, up on the previous one.
    PressedOnce,
    PressedRepeat,
}

impl KeyState {
    fn advance(self, raw_down: bool) -> Self {
        match (raw_down, self) {
            (false, _) => KeyState::Released,
            (true, KeyState::Released) => KeyState::PressedOnce,
            (true, _) => KeyState::PressedRepeat,
        }
    }

    pub fn is_down(self) -> bool {
        matches!(self, KeyState::PressedOnce | KeyState::PressedRepeat)
    }

    pub fn is_down_once(self) -> bool {
        self == KeyState::PressedOnce
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    const fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
        }
    }
}

/// Write side of the input double buffer.
#[derive(Debug)]
struct RawInput {
    keys_down: [bool; KEY_COUNT],
    buttons_down: [bool; BUTTON_COUNT],
    cursor_px: Option<Vec2>,
    scroll_steps: i32,
    typed: String,
}

impl Default for RawInput {
    fn default() -> Self {
        Self {
            keys_down: [false; KEY_COUNT],
            buttons_down: [false; BUTTON_COUNT],
            cursor_px: None,
            scroll_steps: 0,
            typed: String::new(),
        }
    }
}

fn lock_raw<'a>(raw: &'a Mutex<RawInput>, operation: &'static str) -> MutexGuard<'a, RawInput> {
    match raw.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn_input_lock_poison_once(operation);
            poisoned.into_inner()
        }
    }
}

/// Producer handle for raw input events. Safe to use from any thread.
#[derive(Debug, Clone)]
pub struct InputRecorder {
    raw: Arc<Mutex<RawInput>>,
}

impl InputRecorder {
    pub fn record_key_down(&self, key: KeyCode) {
        lock_raw(&self.raw, "key_down").keys_down[key.index()] = true;
    }

    pub fn record_key_up(&self, key: KeyCode) {
        lock_raw(&self.raw, "key_up").keys_down[key.index()] = false;
    }

    pub fn record_raw_key_down(&self, code: i32) {
        match KeyCode::from_raw(code) {
            Some(key) => self.record_key_down(key),
            None => trace!(code, "ignored_out_of_range_key"),
        }
    }

    pub fn record_raw_key_up(&self, code: i32) {
        match KeyCode::from_raw(code) {
            Some(key) => self.record_key_up(key),
            None => trace!(code, "ignored_out_of_range_key"),
        }
    }

    pub fn record_typed(&self, ch: char) {
        lock_raw(&self.raw, "typed").typed.push(ch);
    }

    pub fn record_mouse_button(&self, button: MouseButton, is_down: bool) {
        lock_raw(&self.raw, "mouse_button").buttons_down[button.index()] = is_down;
    }

    /// Position in physical window pixels.
    pub fn record_cursor_moved(&self, x: f32, y: f32) {
        lock_raw(&self.raw, "cursor_moved").cursor_px = Some(Vec2 { x, y });
    }

    pub fn record_cursor_left(&self) {
        lock_raw(&self.raw, "cursor_left").cursor_px = None;
    }

    pub fn record_scroll(&self, steps: i32) {
        let mut raw = lock_raw(&self.raw, "scroll");
        raw.scroll_steps = raw.scroll_steps.saturating_add(steps);
    }
}

/// Frame-stable view of keyboard and mouse state.
///
/// Events land in a shared write buffer through [`InputRecorder`]. [`poll`]
/// swaps them into the read side once per tick; every query between two polls
/// sees the same state.
///
/// [`poll`]: InputPoller::poll
#[derive(Debug)]
pub struct InputPoller {
    raw: Arc<Mutex<RawInput>>,
    keys: [KeyState; KEY_COUNT],
    buttons: [KeyState; BUTTON_COUNT],
    cursor_position: Option<Vec2>,
    scroll_steps: i32,
    typed: String,
    scale: f64,
}

impl Default for InputPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl InputPoller {
    pub fn new() -> Self {
        Self {
            raw: Arc::new(Mutex::new(RawInput::default())),
            keys: [KeyState::Released; KEY_COUNT],
            buttons: [KeyState::Released; BUTTON_COUNT],
            cursor_position: None,
            scroll_steps: 0,
            typed: String::new(),
            scale: 1.0,
        }
    }

    pub fn recorder(&self) -> InputRecorder {
        InputRecorder {
            raw: Arc::clone(&self.raw),
        }
    }

    pub fn poll(&mut self) {
        let keys_down;
        let buttons_down;
        let cursor_px;
        {
            let mut raw = lock_raw(&self.raw, "poll");
            keys_down = raw.keys_down;
            buttons_down = raw.buttons_down;
            cursor_px = raw.cursor_px;
            self.scroll_steps = mem::take(&mut raw.scroll_steps);
            self.typed.clear();
            mem::swap(&mut self.typed, &mut raw.typed);
        }

        for (state, down) in self.keys.iter_mut().zip(keys_down) {
            *state = state.advance(down);
        }
        for (state, down) in self.buttons.iter_mut().zip(buttons_down) {
            *state = state.advance(down);
        }
        let scale = self.scale;
        self.cursor_position = cursor_px.map(|px| Vec2 {
            x: (px.x as f64 / scale) as f32,
            y: (px.y as f64 / scale) as f32,
        });
    }

    pub fn key_state(&self, key: KeyCode) -> KeyState {
        self.keys[key.index()]
    }

    pub fn is_down(&self, key: KeyCode) -> bool {
        self.key_state(key).is_down()
    }

    pub fn is_down_once(&self, key: KeyCode) -> bool {
        self.key_state(key).is_down_once()
    }

    pub fn ctrl(&self) -> bool {
        self.is_down(KeyCode::CONTROL)
    }

    pub fn alt(&self) -> bool {
        self.is_down(KeyCode::ALT)
    }

    pub fn shift(&self) -> bool {
        self.is_down(KeyCode::SHIFT)
    }

    /// Characters typed between the previous two polls.
    pub fn typed_string(&self) -> &str {
        &self.typed
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.buttons[button.index()].is_down()
    }

    pub fn mouse_down_once(&self, button: MouseButton) -> bool {
        self.buttons[button.index()].is_down_once()
    }

    /// Cursor position in reference-canvas units.
    pub fn cursor_position(&self) -> Option<Vec2> {
        self.cursor_position
    }

    pub fn scroll_steps(&self) -> i32 {
        self.scroll_steps
    }

    /// Forces `key` up on both buffers so a held key does not fire again
    /// until it is physically pressed anew.
    pub fn release_key(&mut self, key: KeyCode) {
        lock_raw(&self.raw, "release_key").keys_down[key.index()] = false;
        self.keys[key.index()] = KeyState::Released;
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        if !scale.is_finite() || scale <= 0.0 {
            warn!(scale, "ignored_invalid_input_scale");
            return;
        }
        self.scale = scale;
    }
}
