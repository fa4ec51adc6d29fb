//! Overlay configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;

use panels::consts::{DEFAULT_OFFSET_Y, DEFAULT_PANEL_WIDTH, RESET_TRANSITION_MS};

pub const DEFAULT_MODULE_ID: &str = "draw-steel-plus";
pub const DEFAULT_SYSTEM_ID: &str = "draw-steel";

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    /// Settings namespace owned by the module.
    pub module_id: String,
    /// Game-system namespace (`showPlayerMalice` lives there).
    pub system_id: String,
    /// Broadcast event name.
    pub socket_event: String,
    pub panel_default_width: f64,
    pub panel_offset_y: f64,
    pub reset_transition_ms: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            module_id: DEFAULT_MODULE_ID.to_owned(),
            system_id: DEFAULT_SYSTEM_ID.to_owned(),
            socket_event: socket::DEFAULT_EVENT.to_owned(),
            panel_default_width: DEFAULT_PANEL_WIDTH,
            panel_offset_y: DEFAULT_OFFSET_Y,
            reset_transition_ms: RESET_TRANSITION_MS,
        }
    }
}

impl OverlayConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `DSP_MODULE_ID`: default `draw-steel-plus`
    /// - `DSP_SYSTEM_ID`: default `draw-steel`
    /// - `DSP_SOCKET_EVENT`: default `module.draw-steel-plus`
    /// - `DSP_PANEL_DEFAULT_WIDTH`: default 280
    /// - `DSP_PANEL_OFFSET_Y`: default 160
    /// - `DSP_RESET_TRANSITION_MS`: default 400
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup. Unparseable numbers fall back to
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).filter(|v| !v.trim().is_empty()).unwrap_or(default);
        Self {
            module_id: text("DSP_MODULE_ID", defaults.module_id),
            system_id: text("DSP_SYSTEM_ID", defaults.system_id),
            socket_event: text("DSP_SOCKET_EVENT", defaults.socket_event),
            panel_default_width: parse_or(lookup("DSP_PANEL_DEFAULT_WIDTH"), defaults.panel_default_width),
            panel_offset_y: parse_or(lookup("DSP_PANEL_OFFSET_Y"), defaults.panel_offset_y),
            reset_transition_ms: parse_or(lookup("DSP_RESET_TRANSITION_MS"), defaults.reset_transition_ms),
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}
