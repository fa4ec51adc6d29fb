//! Screen-space geometry primitives. All values are CSS pixels.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

/// A pointer location in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Top-left offset of a panel, as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub top: f64,
    pub left: f64,
}

impl Position {
    #[must_use]
    pub fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }

    /// Shift by a pointer delta.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { top: self.top + dy, left: self.left + dx }
    }

    /// Both coordinates rounded to whole pixels.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self { top: round_half_up(self.top), left: round_half_up(self.left) }
    }
}

/// Rendered size of an element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[must_use]
    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

/// Round to the nearest integer with halves going toward positive infinity,
/// matching how browsers round layout offsets.
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
