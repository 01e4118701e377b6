use super::{InputPoller, RenderTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Quit,
}

/// The game state the loop drives once per tick.
pub trait Simulation {
    type Command;

    /// Called with at most one queued command per tick, before `update`.
    fn handle_command(&mut self, command: Self::Command);

    /// `input` is mutable so one-shot keys can be released once consumed.
    fn update(&mut self, delta_seconds: f64, input: &mut InputPoller) -> TickControl;

    /// Draw in reference-canvas units; the target is already scaled.
    fn render(&mut self, target: &mut dyn RenderTarget);
}
