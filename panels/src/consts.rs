//! Shared constants for the panel engine.

// ── Placement ───────────────────────────────────────────────────

/// Fallback element width in pixels when the rendered width is not yet known.
pub const DEFAULT_PANEL_WIDTH: f64 = 280.0;

/// Distance in pixels between the panel top and the bottom edge of the canvas.
pub const DEFAULT_OFFSET_Y: f64 = 160.0;

/// How long the "resetting" transition class stays on after a reset.
pub const RESET_TRANSITION_MS: u32 = 400;

// ── Cursor / CSS ────────────────────────────────────────────────

/// Cursor shown on the panel while a drag gesture is active.
pub const CURSOR_GRABBING: &str = "grabbing";

/// Prefix for the generic floating-panel CSS classes.
pub const FLOATING_CLASS_PREFIX: &str = "dsp-fui";

// ── Negotiation ─────────────────────────────────────────────────

/// Upper bound for the interest counter.
pub const INTEREST_MAX: u8 = 5;

/// Upper bound for the patience counter.
pub const PATIENCE_MAX: u8 = 5;

/// Upper bound for the impression counter.
pub const IMPRESSION_MAX: u8 = 12;
