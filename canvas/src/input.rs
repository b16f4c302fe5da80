//! Input model: armed tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! This module defines the types consumed by the engine. `Tool` and
//! `Modifiers` capture the user's intent at the time of a pointer event.
//! `InputState` is the active gesture being tracked between pointer-down and
//! pointer-up, carrying what is needed to compute incremental deltas, commit
//! on release, or roll back on cancel.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::selection::ItemSnapshot;
use crate::viewport::{Point, Rect};

/// Action that can be armed from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Drag the selection.
    Move,
    /// Point the selection at the pointer.
    Rotate,
    /// Scale the selection by pointer distance.
    Resize,
    /// Draw dotted lines.
    Draw,
}

impl Tool {
    /// The drag gesture this tool drives, if it drives one.
    #[must_use]
    pub fn drag_action(self) -> Option<DragAction> {
        match self {
            Self::Move => Some(DragAction::Move),
            Self::Rotate => Some(DragAction::Rotate),
            Self::Resize => Some(DragAction::Resize),
            Self::Draw => None,
        }
    }
}

/// Transform applied while dragging the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAction {
    Move,
    Rotate,
    Resize,
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Shift key is held: toggle membership or start a marquee.
    pub shift: bool,
    /// Ctrl key is held: keep the current selection when clicking.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held: treated like Ctrl.
    pub meta: bool,
}

impl Modifiers {
    /// Modifier that adds or removes single items, or starts a marquee.
    #[must_use]
    pub fn toggle(self) -> bool {
        self.shift
    }

    /// Modifier that preserves the existing selection on click.
    #[must_use]
    pub fn multi(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    #[default]
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the host (e.g. `"Delete"`, `"Escape"`, `"c"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Case-insensitive comparison against a key name.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Currently armed action, if any.
    pub armed: Option<Tool>,
    /// Colour token used for the next drawn line.
    pub line_color: String,
    /// Live marquee rectangle while one is being dragged.
    pub marquee: Option<Rect>,
    /// Start point of a line awaiting its second point.
    pub pending_line_start: Option<Point>,
    /// Last rotation applied from the slider, in radians.
    pub last_rotation: f64,
    /// Last scale applied from the slider.
    pub last_scale: f64,
}

/// Internal state for the gesture state machine.
///
/// Each active variant carries the gesture context needed to compute deltas
/// and to commit or cancel on release.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// A toggle-modifier click changed membership; waiting for release.
    Selecting,
    /// The selection is being transformed by the pointer.
    Dragging {
        /// Transform being applied.
        action: DragAction,
        /// Canvas position sampled at the previous event; move deltas are taken from here.
        last: Point,
        /// Geometry of every affected item at pointer-down, restored on cancel.
        origins: Vec<ItemSnapshot>,
    },
    /// A rubber-band selection rectangle is being dragged.
    Marqueeing {
        /// Canvas corner where the drag started.
        start: Point,
        /// Canvas corner under the pointer.
        current: Point,
    },
    /// The draw tool is armed.
    Drawing {
        /// First point of the next line; `Some` while awaiting the second point.
        start: Option<Point>,
    },
}

impl InputState {
    /// Whether a line start is recorded and the next point will commit it.
    #[must_use]
    pub fn awaiting_second_point(&self) -> bool {
        matches!(self, Self::Drawing { start: Some(_) })
    }

    /// Neutral state for the given armed action.
    #[must_use]
    pub fn neutral(armed: Option<Tool>) -> Self {
        if armed == Some(Tool::Draw) { Self::Drawing { start: None } } else { Self::Idle }
    }
}
