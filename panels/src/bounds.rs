//! Canvas bounds resolution and default panel placement.
//!
//! Panels anchor to the host's main drawing surface rather than the browser
//! window, so toggling a sidebar or resizing the window shifts the anchor
//! frame. Before a scene is loaded there is no surface at all; that is a
//! normal condition and resolves to the full viewport.

#[cfg(test)]
#[path = "bounds_test.rs"]
mod bounds_test;

use crate::geometry::{Position, Rect, Size, round_half_up};

/// Read-only view of the host's rendering surface.
pub trait Surface {
    /// Bounding client rectangle of the mounted drawing surface, or `None`
    /// when no surface is ready.
    fn canvas_rect(&self) -> Option<Rect>;

    /// Inner size of the browser window.
    fn viewport(&self) -> Size;
}

/// A surface whose geometry is already known. Used by hosts that measure
/// once per frame, and by tests.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FixedSurface {
    pub canvas: Option<Rect>,
    pub viewport: Size,
}

impl FixedSurface {
    /// A ready surface occupying `canvas` inside a `viewport`-sized window.
    #[must_use]
    pub fn ready(canvas: Rect, viewport: Size) -> Self {
        Self { canvas: Some(canvas), viewport }
    }

    /// No surface mounted; only the window size is known.
    #[must_use]
    pub fn window_only(viewport: Size) -> Self {
        Self { canvas: None, viewport }
    }
}

impl Surface for FixedSurface {
    fn canvas_rect(&self) -> Option<Rect> {
        self.canvas
    }

    fn viewport(&self) -> Size {
        self.viewport
    }
}

/// The rectangle panels are placed against: the canvas when mounted,
/// otherwise the whole viewport anchored at the origin.
#[must_use]
pub fn canvas_bounds(surface: &dyn Surface) -> Rect {
    surface.canvas_rect().unwrap_or_else(|| {
        let viewport = surface.viewport();
        Rect::new(0.0, 0.0, viewport.width, viewport.height)
    })
}

/// Horizontally centered within `bounds`, with the top edge
/// `offset_from_bottom` pixels above the bottom of `bounds`.
#[must_use]
pub fn default_position(bounds: Rect, element_width: f64, offset_from_bottom: f64) -> Position {
    Position {
        top: bounds.bottom() - offset_from_bottom,
        left: round_half_up(bounds.center_x() - element_width / 2.0),
    }
}
