//! Gesture and shortcut translation

use crate::motion::IMPULSE_STEP;
use winit::keyboard::{KeyCode, ModifiersState};

/// Interval between repeated impulses while a rotate control is held
pub const HOLD_REPEAT_SECS: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Left,
    Right,
}

impl RotateDirection {
    /// Impulse for one step in this direction
    pub fn impulse(self) -> f32 {
        match self {
            RotateDirection::Left => -IMPULSE_STEP,
            RotateDirection::Right => IMPULSE_STEP,
        }
    }
}

/// Viewer actions reachable from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    Undo,
    Redo,
    Rotate(RotateDirection),
}

/// Map a key press to a command. The primary modifier is Cmd on macOS and
/// Ctrl elsewhere; arrows only act without it.
pub fn map_shortcut(key: KeyCode, modifiers: ModifiersState, mac: bool) -> Option<ViewerCommand> {
    let primary = if mac {
        modifiers.super_key()
    } else {
        modifiers.control_key()
    };
    match key {
        KeyCode::KeyZ if primary && modifiers.shift_key() => Some(ViewerCommand::Redo),
        KeyCode::KeyZ if primary => Some(ViewerCommand::Undo),
        KeyCode::KeyY if primary => Some(ViewerCommand::Redo),
        KeyCode::ArrowLeft if !primary => Some(ViewerCommand::Rotate(RotateDirection::Left)),
        KeyCode::ArrowRight if !primary => Some(ViewerCommand::Rotate(RotateDirection::Right)),
        _ => None,
    }
}

/// Press-and-hold repeat for the rotate controls.
///
/// While held, one impulse fires every `HOLD_REPEAT_SECS`; the click itself
/// adds the single impulse of a short press. Any button release anywhere
/// cancels the repeat.
#[derive(Debug, Default)]
pub struct HoldRepeat {
    held: Option<RotateDirection>,
    elapsed: f32,
}

impl HoldRepeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, direction: RotateDirection) {
        if self.held != Some(direction) {
            self.held = Some(direction);
            self.elapsed = 0.0;
        }
    }

    pub fn release(&mut self) {
        self.held = None;
        self.elapsed = 0.0;
    }

    pub fn held(&self) -> Option<RotateDirection> {
        self.held
    }

    /// Advance the timer and return the impulses due this frame
    pub fn tick(&mut self, dt: f32) -> Vec<f32> {
        let Some(direction) = self.held else {
            return Vec::new();
        };
        self.elapsed += dt.max(0.0);
        let mut due = Vec::new();
        while self.elapsed >= HOLD_REPEAT_SECS {
            self.elapsed -= HOLD_REPEAT_SECS;
            due.push(direction.impulse());
        }
        due
    }
}

/// Slider that previews while dragging and reports a commit when the drag ends
/// or the value changes discretely
#[derive(Debug, Default)]
pub struct SliderCommit {
    dragging: bool,
}

impl SliderCommit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame of slider interaction. Returns true when the value
    /// should be committed.
    pub fn update(&mut self, changed: bool, dragging: bool) -> bool {
        let finished_drag = self.dragging && !dragging;
        let discrete = changed && !dragging && !self.dragging;
        self.dragging = dragging;
        finished_drag || discrete
    }
}
