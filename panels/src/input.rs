//! Input model: pointer buttons, keys, and the transient drag session.
//!
//! `DragSession` is the only gesture state a panel tracks. It exists between
//! a pointer-down on the drag handle and the matching pointer-up, and is
//! never persisted.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::geometry::{Point, Position};

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code. Codes above 2 (back/forward) map
    /// to `None`.
    #[must_use]
    pub fn from_dom(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Primary),
            1 => Some(Self::Middle),
            2 => Some(Self::Secondary),
            _ => None,
        }
    }
}

/// A keyboard key as reported by the browser (e.g. `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }
}

/// Gesture context captured at pointer-down.
///
/// Live offsets are always computed from these origin values rather than the
/// previous frame, so rounding never accumulates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    /// Pointer location at drag start.
    pub start_pointer: Point,
    /// Panel top-left at drag start.
    pub start_origin: Position,
}

impl DragSession {
    #[must_use]
    pub fn new(start_pointer: Point, start_origin: Position) -> Self {
        Self { start_pointer, start_origin }
    }

    /// Panel position for the pointer at `pointer`.
    #[must_use]
    pub fn position_at(&self, pointer: Point) -> Position {
        self.start_origin
            .offset(pointer.x - self.start_pointer.x, pointer.y - self.start_pointer.y)
    }
}
