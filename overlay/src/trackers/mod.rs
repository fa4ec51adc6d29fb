//! Concrete panels (trackers) built on the floating panel engine.
//!
//! DESIGN
//! ======
//! A panel is a [`panels::panel::FloatingPanel`] (chrome, drag, placement)
//! paired with a [`PanelBehavior`] (content and panel-specific actions).
//! The controller owns both; a behavior never touches the element or the
//! chrome state directly.

pub mod meta_currency;
pub mod negotiation;


use panels::popup::PopupState;
use panels::state::PanelConfig;
use serde_json::Value;

use crate::error::OverlayError;
use crate::host::Host;

pub use meta_currency::{META_CURRENCY_ID, MetaCurrencyTracker};
pub use negotiation::{NEGOTIATION_ID, NegotiationTracker};

/// What the controller should do after a behavior handled an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Render,
    Close,
}

#[async_trait::async_trait(?Send)]
pub trait PanelBehavior {
    fn config(&self) -> &PanelConfig;

    fn template(&self) -> &str;

    /// Template context without the chrome flags; the controller adds
    /// `isLocked` / `isExpanded`.
    fn prepare_context(&self, host: &Host) -> Value;

    /// Handle a panel-specific action.
    async fn on_action(&mut self, host: &Host, action: &str, payload: &Value) -> Result<Outcome, OverlayError>;

    /// Popup state, for panels that have popups.
    fn popup_mut(&mut self) -> Option<&mut PopupState> {
        None
    }
}

// =============================================================================
// PAYLOAD HELPERS
// =============================================================================

pub(crate) fn str_field<'a>(action: &str, payload: &'a Value, key: &str) -> Result<&'a str, OverlayError> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| OverlayError::invalid_payload(action, format!("missing string field `{key}`")))
}

pub(crate) fn int_field(action: &str, payload: &Value, key: &str) -> Result<i32, OverlayError> {
    payload
        .get(key)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| OverlayError::invalid_payload(action, format!("missing integer field `{key}`")))
}

pub(crate) fn require_gm(host: &Host, action: &str) -> Result<(), OverlayError> {
    if host.world.is_gm() { Ok(()) } else { Err(OverlayError::not_permitted(action)) }
}
