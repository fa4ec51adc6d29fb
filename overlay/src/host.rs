//! Collaborator traits for everything the overlay needs from the host.
//!
//! SYSTEM CONTEXT
//! ==============
//! The host is single-threaded, so the async traits are `?Send` and the
//! bundle holds `Rc`s. Suspension points exist only where the host itself
//! suspends: settings writes, resource updates, the confirm dialog and
//! rendering. Socket emission is fire-and-forget.

use std::rc::Rc;

use panels::bounds::Surface;
use panels::geometry::Size;
use panels::panel::Action;
use serde_json::Value;
use socket::SocketMessage;

use crate::error::{RenderError, ResourceError, SocketError, StoreError};

/// Storage scope of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Per user, per browser.
    Client,
    /// Shared by every session in the world.
    World,
}

#[async_trait::async_trait(?Send)]
pub trait SettingsStore {
    fn get(&self, scope: Scope, namespace: &str, key: &str) -> Option<Value>;

    async fn set(&self, scope: Scope, namespace: &str, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Broadcast to every *other* connected session.
pub trait Socket {
    /// # Errors
    ///
    /// Transport failures only; delivery is never acknowledged.
    fn emit(&self, event: &str, message: &SocketMessage) -> Result<(), SocketError>;
}

#[async_trait::async_trait(?Send)]
pub trait HeroTokens {
    fn value(&self) -> u32;
    async fn give_token(&self) -> Result<(), ResourceError>;
    async fn spend_token(&self, reason: &str) -> Result<(), ResourceError>;
    async fn reset_tokens(&self) -> Result<(), ResourceError>;
}

#[async_trait::async_trait(?Send)]
pub trait Malice {
    fn value(&self) -> u32;
    async fn adjust_malice(&self) -> Result<(), ResourceError>;
    async fn reset_malice(&self) -> Result<(), ResourceError>;
}

#[async_trait::async_trait(?Send)]
pub trait ConfirmDialog {
    async fn confirm(&self, title: &str, content: &str) -> bool;
}

/// Paints panels and performs the element-level [`Action`]s.
#[async_trait::async_trait(?Send)]
pub trait Renderer {
    /// Render `template` with `context` into the panel element, creating it
    /// on first use. Returns the rendered size.
    async fn render(&self, panel: &str, template: &str, context: &Value) -> Result<Size, RenderError>;

    /// Perform an element or listener action. Never called with
    /// [`Action::Persist`] or [`Action::RenderNeeded`].
    fn apply(&self, panel: &str, action: &Action);

    /// Remove the panel element.
    fn unmount(&self, panel: &str);
}

pub trait Notifier {
    fn error(&self, message: &str);
}

pub trait World {
    fn is_gm(&self) -> bool;
    fn combat_active(&self) -> bool;
}

/// Everything the controller talks to. Resource pools are optional: the
/// game system may not have created them yet.
#[derive(Clone)]
pub struct Host {
    pub settings: Rc<dyn SettingsStore>,
    pub socket: Rc<dyn Socket>,
    pub hero_tokens: Option<Rc<dyn HeroTokens>>,
    pub malice: Option<Rc<dyn Malice>>,
    pub dialog: Rc<dyn ConfirmDialog>,
    pub renderer: Rc<dyn Renderer>,
    pub notifier: Rc<dyn Notifier>,
    pub world: Rc<dyn World>,
    pub surface: Rc<dyn Surface>,
}
