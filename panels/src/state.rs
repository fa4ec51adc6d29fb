//! Persisted panel state and per-panel configuration.
//!
//! DESIGN
//! ======
//! `centered` and `position` are not contradictory. `centered = true` means
//! the saved position is stale and the panel is re-snapped to the canvas
//! default on resize or reset. `centered = false` means `position` is
//! authoritative. A manual drag always clears `centered`.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_OFFSET_Y, DEFAULT_PANEL_WIDTH, FLOATING_CLASS_PREFIX, RESET_TRANSITION_MS};
use crate::geometry::Position;

// =============================================================================
// PANEL STATE
// =============================================================================

/// Window chrome state for one panel, scoped per user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelState {
    /// Absent until the panel is first placed.
    pub position: Option<Position>,
    /// Dragging is disabled while locked.
    pub locked: bool,
    /// Position follows the canvas default on resize.
    pub centered: bool,
    /// Body visible. Only meaningful for panels that support collapsing.
    pub expanded: bool,
}

impl Default for PanelState {
    fn default() -> Self {
        Self { position: None, locked: false, centered: false, expanded: true }
    }
}

/// A partial update to [`PanelState`]; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanelPatch {
    pub position: Option<Position>,
    pub locked: Option<bool>,
    pub centered: Option<bool>,
    pub expanded: Option<bool>,
}

impl PanelPatch {
    #[must_use]
    pub fn position(position: Position) -> Self {
        Self { position: Some(position), ..Self::default() }
    }

    #[must_use]
    pub fn locked(locked: bool) -> Self {
        Self { locked: Some(locked), ..Self::default() }
    }

    #[must_use]
    pub fn centered(centered: bool) -> Self {
        Self { centered: Some(centered), ..Self::default() }
    }

    #[must_use]
    pub fn expanded(expanded: bool) -> Self {
        Self { expanded: Some(expanded), ..Self::default() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.locked.is_none() && self.centered.is_none() && self.expanded.is_none()
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Settings keys backing each [`PanelState`] field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelKeys {
    pub position: String,
    pub locked: String,
    pub centered: String,
    /// `None` for panels that cannot collapse.
    pub expanded: Option<String>,
}

impl PanelKeys {
    /// Generic per-panel keys: `ui.<id>.<prop>`.
    #[must_use]
    pub fn scoped(id: &str) -> Self {
        Self {
            position: format!("ui.{id}.position"),
            locked: format!("ui.{id}.locked"),
            centered: format!("ui.{id}.centered"),
            expanded: Some(format!("ui.{id}.expanded")),
        }
    }
}

/// Everything that distinguishes one kind of floating panel from another.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    /// Unique panel identifier; also the registry key.
    pub id: String,
    pub keys: PanelKeys,
    /// CSS selector of the element that starts a drag.
    pub drag_handle: String,
    pub locked_class: String,
    pub minimized_class: String,
    pub resetting_class: String,
    pub supports_expand: bool,
    /// Width used for placement before the element has been measured.
    pub default_width: f64,
    /// Distance of the default position above the canvas bottom edge.
    pub offset_y: f64,
    pub reset_transition_ms: u32,
}

impl PanelConfig {
    /// Configuration for a generic collapsible floating panel.
    #[must_use]
    pub fn floating(id: &str) -> Self {
        let prefix = FLOATING_CLASS_PREFIX;
        Self {
            id: id.to_owned(),
            keys: PanelKeys::scoped(id),
            drag_handle: format!(".{prefix}-drag-handle"),
            locked_class: format!("{prefix}-locked"),
            minimized_class: format!("{prefix}-minimized"),
            resetting_class: format!("{prefix}-resetting"),
            supports_expand: true,
            default_width: DEFAULT_PANEL_WIDTH,
            offset_y: DEFAULT_OFFSET_Y,
            reset_transition_ms: RESET_TRANSITION_MS,
        }
    }

    /// Override the placement constants.
    #[must_use]
    pub fn with_placement(mut self, default_width: f64, offset_y: f64, reset_transition_ms: u32) -> Self {
        self.default_width = default_width;
        self.offset_y = offset_y;
        self.reset_transition_ms = reset_transition_ms;
        self
    }
}
