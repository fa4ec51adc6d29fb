//! Panel registry and the UI controller.
//!
//! DESIGN
//! ======
//! The controller is the only owner of open panels. Each registry entry
//! pairs the engine ([`FloatingPanel`]) with the panel's behavior and its
//! typed settings accessor. Host callbacks (pointer, resize, animation
//! frame, settings changes, socket messages, toolbar clicks) all enter
//! here, are forwarded to the engine or the behavior, and the resulting
//! actions are executed in order: persistence is awaited, element actions
//! go to the renderer, and a requested re-render happens last.
//!
//! ERROR HANDLING
//! ==============
//! Public entry points log failures, pass the message to the host notifier
//! and return the error. Events for a panel that is no longer open are
//! dropped quietly; they are close/teardown races, not failures.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use std::collections::HashMap;

use panels::geometry::{Point, Position};
use panels::input::{Button, Key};
use panels::panel::{Action, FloatingPanel};
use panels::state::PanelKeys;
use serde_json::{Value, json};
use socket::SocketMessage;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::OverlayConfig;
use crate::error::{ErrorCode, OverlayError};
use crate::host::Host;
use crate::settings::{self, META_CURRENCY_ENABLED};
use crate::store::{NEGOTIATION_STATE_KEY, NegotiationStore, PanelStore};
use crate::sync::Envelope;
use crate::trackers::negotiation::emit;
use crate::trackers::{META_CURRENCY_ID, MetaCurrencyTracker, NEGOTIATION_ID, NegotiationTracker, Outcome, PanelBehavior};

// =============================================================================
// REGISTRY
// =============================================================================

pub struct PanelEntry {
    floating: FloatingPanel,
    behavior: Box<dyn PanelBehavior>,
    store: PanelStore,
}

impl PanelEntry {
    pub fn floating(&self) -> &FloatingPanel {
        &self.floating
    }
}

/// Open panels keyed by id. At most one instance per id.
#[derive(Default)]
pub struct PanelRegistry {
    panels: HashMap<String, PanelEntry>,
}

impl PanelRegistry {
    pub fn contains(&self, id: &str) -> bool {
        self.panels.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&PanelEntry> {
        self.panels.get(id)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Open panel ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.panels.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut PanelEntry> {
        self.panels.get_mut(id)
    }

    fn insert(&mut self, id: String, entry: PanelEntry) {
        self.panels.insert(id, entry);
    }

    fn remove(&mut self, id: &str) -> Option<PanelEntry> {
        self.panels.remove(id)
    }
}

// =============================================================================
// HOST EVENTS
// =============================================================================

/// Host notifications the overlay reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    SettingChanged { namespace: String, key: String },
    PlayersRendered,
    CombatCreated,
    CombatUpdated,
    CombatDeleted,
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct UiController {
    host: Host,
    config: OverlayConfig,
    registry: PanelRegistry,
}

impl UiController {
    pub fn new(host: Host, config: OverlayConfig) -> Self {
        Self { host, config, registry: PanelRegistry::default() }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn registry(&self) -> &PanelRegistry {
        &self.registry
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    fn negotiation_store(&self) -> NegotiationStore {
        NegotiationStore::new(self.host.settings.clone(), &self.config.module_id)
    }

    fn report<T>(&self, operation: &str, result: Result<T, OverlayError>) -> Result<T, OverlayError> {
        result.map_err(|err| {
            warn!(operation, code = err.error_code(), error = %err, "overlay operation failed");
            self.host.notifier.error(&err.to_string());
            err
        })
    }

    // --- Lifecycle ---

    /// Ready hook: open the meta-currency tracker if enabled and restore the
    /// negotiation tracker if the world says it is visible.
    ///
    /// # Errors
    ///
    /// Persistence or render failure while opening a panel.
    pub async fn init(&mut self) -> Result<(), OverlayError> {
        if settings::flag(self.host.settings.as_ref(), &self.config.module_id, META_CURRENCY_ENABLED) {
            self.init_meta_currency().await?;
        }
        self.init_negotiation().await
    }

    /// Open the meta-currency tracker. A no-op while one is already open.
    /// Returns whether a panel was opened.
    ///
    /// # Errors
    ///
    /// Persistence or render failure while opening.
    pub async fn init_meta_currency(&mut self) -> Result<bool, OverlayError> {
        let tracker = MetaCurrencyTracker::new(&self.config);
        let result = self.open(Box::new(tracker)).await;
        self.report("initMetaCurrency", result)
    }

    /// Mount or unmount the negotiation tracker to match the world flag.
    ///
    /// # Errors
    ///
    /// Persistence or render failure while opening.
    pub async fn init_negotiation(&mut self) -> Result<(), OverlayError> {
        let visible = self.negotiation_store().visible();
        let result = self.apply_negotiation_visibility(visible).await;
        self.report("initNegotiation", result)
    }

    async fn open(&mut self, behavior: Box<dyn PanelBehavior>) -> Result<bool, OverlayError> {
        let config = behavior.config().clone();
        let id = config.id.clone();
        if self.registry.contains(&id) {
            debug!(panel = %id, "panel already open");
            return Ok(false);
        }

        let store = PanelStore::new(self.host.settings.clone(), &self.config.module_id, config.keys.clone());
        let floating = FloatingPanel::new(config, store.load());
        self.registry.insert(id.clone(), PanelEntry { floating, behavior, store });

        let result = self.first_render(&id).await;
        if let Err(err) = result {
            if let Some(mut entry) = self.registry.remove(&id) {
                for action in entry.floating.close() {
                    self.host.renderer.apply(&id, &action);
                }
            }
            self.host.renderer.unmount(&id);
            return Err(err);
        }
        info!(panel = %id, "panel opened");
        Ok(true)
    }

    async fn first_render(&mut self, id: &str) -> Result<(), OverlayError> {
        let Some(entry) = self.registry.get_mut(id) else {
            return Ok(());
        };
        let actions = entry.floating.pre_first_render(self.host.surface.as_ref());
        perform(&self.host, &entry.store, id, actions).await?;
        self.render_panel(id).await
    }

    /// Close and forget a panel, detaching every listener it holds.
    /// Returns whether it was open.
    pub fn close_panel(&mut self, id: &str) -> bool {
        let Some(mut entry) = self.registry.remove(id) else {
            return false;
        };
        for action in entry.floating.close() {
            self.host.renderer.apply(id, &action);
        }
        self.host.renderer.unmount(id);
        info!(panel = %id, "panel closed");
        true
    }

    /// Re-render an open panel. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Render or persistence failure.
    pub async fn render(&mut self, id: &str) -> Result<(), OverlayError> {
        let result = self.render_panel(id).await;
        self.report("render", result)
    }

    async fn render_panel(&mut self, id: &str) -> Result<(), OverlayError> {
        let Some(entry) = self.registry.get_mut(id) else {
            return Ok(());
        };
        let mut context = entry.behavior.prepare_context(&self.host);
        if let Value::Object(map) = &mut context {
            let chrome = entry.floating.floating_state();
            map.insert("isLocked".into(), json!(chrome.is_locked));
            map.insert("isExpanded".into(), json!(chrome.is_expanded));
        }
        let size = self.host.renderer.render(id, entry.behavior.template(), &context).await?;
        let actions = entry.floating.on_render(size);
        perform(&self.host, &entry.store, id, actions).await?;
        Ok(())
    }

    // --- Actions ---

    /// A `data-action` click inside a panel. Chrome actions (`toggleLock`,
    /// `toggleExpanded`, `resetPosition`) go to the engine, everything else
    /// to the panel's behavior.
    ///
    /// # Errors
    ///
    /// Unknown panel or action, permission, payload, persistence, resource
    /// or render failure.
    pub async fn dispatch(&mut self, panel: &str, action: &str, payload: &Value) -> Result<(), OverlayError> {
        let result = self.dispatch_inner(panel, action, payload).await;
        self.report(action, result)
    }

    async fn dispatch_inner(&mut self, panel: &str, action: &str, payload: &Value) -> Result<(), OverlayError> {
        let entry = self.registry.get_mut(panel).ok_or_else(|| OverlayError::UnknownPanel(panel.to_owned()))?;
        let actions = match action {
            "toggleLock" => entry.floating.toggle_lock(),
            "toggleExpanded" => entry.floating.toggle_expanded(),
            "resetPosition" => entry.floating.reset_position(self.host.surface.as_ref()),
            _ => {
                let outcome = entry.behavior.on_action(&self.host, action, payload).await?;
                debug!(panel, action, ?outcome, "panel action handled");
                return match outcome {
                    Outcome::Unchanged => Ok(()),
                    Outcome::Render => self.render_panel(panel).await,
                    Outcome::Close => {
                        self.close_panel(panel);
                        Ok(())
                    }
                };
            }
        };
        if perform(&self.host, &entry.store, panel, actions).await? {
            self.render_panel(panel).await?;
        }
        Ok(())
    }

    // --- Pointer / window input ---

    /// Pointer-down on a panel's drag handle.
    pub fn pointer_down(&mut self, panel: &str, pointer: Point, button: Button) {
        if let Some(entry) = self.registry.get_mut(panel) {
            for action in entry.floating.on_drag_start(pointer, button) {
                self.host.renderer.apply(panel, &action);
            }
        }
    }

    /// Window pointer-move while a drag is active.
    pub fn pointer_move(&mut self, panel: &str, pointer: Point) {
        if let Some(entry) = self.registry.get_mut(panel) {
            for action in entry.floating.on_drag_move(pointer) {
                self.host.renderer.apply(panel, &action);
            }
        }
    }

    /// Window pointer-up; commits the dragged position.
    ///
    /// # Errors
    ///
    /// Persistence failure.
    pub async fn pointer_up(&mut self, panel: &str, pointer: Point) -> Result<(), OverlayError> {
        let result = match self.registry.get_mut(panel) {
            Some(entry) => {
                let actions = entry.floating.on_drag_end(pointer);
                perform(&self.host, &entry.store, panel, actions).await.map(|_| ())
            }
            None => Ok(()),
        };
        self.report("dragEnd", result)
    }

    /// The host moved a panel element by other means.
    ///
    /// # Errors
    ///
    /// Persistence failure.
    pub async fn element_moved(&mut self, panel: &str, position: Position) -> Result<(), OverlayError> {
        let result = match self.registry.get_mut(panel) {
            Some(entry) => {
                let actions = entry.floating.on_position(position);
                perform(&self.host, &entry.store, panel, actions).await.map(|_| ())
            }
            None => Ok(()),
        };
        self.report("position", result)
    }

    /// Window resize. Panels listening for it schedule one animation frame.
    pub fn window_resized(&mut self) {
        for (id, entry) in &mut self.registry.panels {
            for action in entry.floating.on_resize() {
                self.host.renderer.apply(id, &action);
            }
        }
    }

    /// The animation frame requested after a resize.
    ///
    /// # Errors
    ///
    /// Persistence failure.
    pub async fn animation_frame(&mut self, panel: &str) -> Result<(), OverlayError> {
        let result = match self.registry.get_mut(panel) {
            Some(entry) => {
                let actions = entry.floating.on_animation_frame(self.host.surface.as_ref());
                perform(&self.host, &entry.store, panel, actions).await.map(|_| ())
            }
            None => Ok(()),
        };
        self.report("animationFrame", result)
    }

    /// Document key-down. Escape closes any open popup.
    ///
    /// # Errors
    ///
    /// Render failure.
    pub async fn key_pressed(&mut self, key: &Key) -> Result<(), OverlayError> {
        let mut changed = Vec::new();
        for (id, entry) in &mut self.registry.panels {
            if entry.behavior.popup_mut().is_some_and(|popup| popup.on_key(key)) {
                changed.push(id.clone());
            }
        }
        self.render_all(&changed, "keyPressed").await
    }

    /// Document click. `inside_popup_control` is true when the target is a
    /// popup or the control that opens one.
    ///
    /// # Errors
    ///
    /// Render failure.
    pub async fn outside_click(&mut self, panel: &str, inside_popup_control: bool) -> Result<(), OverlayError> {
        let changed = self
            .registry
            .get_mut(panel)
            .and_then(|entry| entry.behavior.popup_mut())
            .is_some_and(|popup| popup.on_outside_click(inside_popup_control));
        if !changed {
            return Ok(());
        }
        self.render_all(&[panel.to_owned()], "outsideClick").await
    }

    async fn render_all(&mut self, ids: &[String], operation: &str) -> Result<(), OverlayError> {
        let mut result = Ok(());
        for id in ids {
            if let Err(err) = self.render_panel(id).await {
                result = Err(err);
                break;
            }
        }
        self.report(operation, result)
    }

    // --- Host events ---

    /// React to settings changes, player list redraws and combat changes.
    ///
    /// # Errors
    ///
    /// Render or persistence failure.
    pub async fn handle_host_event(&mut self, event: &HostEvent) -> Result<(), OverlayError> {
        let result = self.handle_host_event_inner(event).await;
        self.report("hostEvent", result)
    }

    async fn handle_host_event_inner(&mut self, event: &HostEvent) -> Result<(), OverlayError> {
        match event {
            HostEvent::SettingChanged { namespace, key } if *namespace == self.config.module_id => {
                if key == META_CURRENCY_ENABLED {
                    if settings::flag(self.host.settings.as_ref(), namespace, key) {
                        self.open(Box::new(MetaCurrencyTracker::new(&self.config))).await?;
                    } else {
                        self.close_panel(META_CURRENCY_ID);
                    }
                    return Ok(());
                }
                let mut affected = Vec::new();
                for (id, entry) in &mut self.registry.panels {
                    if owns_key(&entry.floating.config().keys, key) {
                        entry.floating.reload(entry.store.load());
                        affected.push(id.clone());
                    }
                }
                if key == NEGOTIATION_STATE_KEY && self.registry.contains(NEGOTIATION_ID) {
                    affected.push(NEGOTIATION_ID.to_owned());
                }
                for id in affected {
                    self.render_panel(&id).await?;
                }
                Ok(())
            }
            HostEvent::SettingChanged { namespace, .. } if *namespace == self.config.system_id => {
                self.render_panel(META_CURRENCY_ID).await
            }
            HostEvent::SettingChanged { .. } => Ok(()),
            HostEvent::PlayersRendered | HostEvent::CombatCreated | HostEvent::CombatUpdated | HostEvent::CombatDeleted => {
                self.render_panel(META_CURRENCY_ID).await
            }
        }
    }

    // --- Negotiation visibility / broadcast ---

    /// Scene-control button: flip the world visibility flag, apply it here
    /// and tell every other session. GM only. Returns the new visibility.
    ///
    /// # Errors
    ///
    /// Not the GM, or persistence or render failure.
    pub async fn toggle_negotiation(&mut self) -> Result<bool, OverlayError> {
        let result = self.toggle_negotiation_inner().await;
        self.report("toggleNegotiation", result)
    }

    async fn toggle_negotiation_inner(&mut self) -> Result<bool, OverlayError> {
        if !self.host.world.is_gm() {
            return Err(OverlayError::NotPermitted { action: "toggleNegotiation".to_owned() });
        }
        let store = self.negotiation_store();
        let visible = !store.visible();
        store.set_visible(visible).await?;
        // Other sessions follow the saved flag even if this mount fails.
        emit(&self.host, &self.config.socket_event, &SocketMessage::NegotiationVisibility { visible });
        info!(visible, "negotiation visibility toggled");
        self.apply_negotiation_visibility(visible).await?;
        Ok(visible)
    }

    /// Mount or unmount this session's negotiation tracker.
    ///
    /// # Errors
    ///
    /// Persistence or render failure while mounting.
    pub async fn sync_negotiation_visibility(&mut self, visible: bool) -> Result<(), OverlayError> {
        let result = self.apply_negotiation_visibility(visible).await;
        self.report("syncNegotiationVisibility", result)
    }

    async fn apply_negotiation_visibility(&mut self, visible: bool) -> Result<(), OverlayError> {
        if visible {
            let tracker = NegotiationTracker::new(&self.config, self.negotiation_store());
            self.open(Box::new(tracker)).await?;
        } else {
            self.close_panel(NEGOTIATION_ID);
        }
        Ok(())
    }

    /// A payload received on the host socket. Other events and payload
    /// types are ignored.
    ///
    /// # Errors
    ///
    /// Persistence or render failure while reacting.
    pub async fn handle_socket(&mut self, event: &str, payload: &Value) -> Result<(), OverlayError> {
        let result = self.handle_socket_inner(event, payload).await;
        self.report("socket", result)
    }

    async fn handle_socket_inner(&mut self, event: &str, payload: &Value) -> Result<(), OverlayError> {
        if event != self.config.socket_event {
            return Ok(());
        }
        let message = match socket::decode(payload) {
            Ok(message) => message,
            Err(err) => {
                debug!(error = %err, "ignoring socket payload");
                return Ok(());
            }
        };
        debug!(kind = message.kind(), "socket message received");
        match message {
            SocketMessage::NegotiationVisibility { visible } => self.apply_negotiation_visibility(visible).await,
            SocketMessage::NegotiationUpdate => self.render_panel(NEGOTIATION_ID).await,
        }
    }

    /// Handle everything queued for this session. Failures are reported
    /// and do not stop the drain. Returns how many payloads were handled.
    pub async fn drain(&mut self, rx: &mut mpsc::Receiver<Envelope>) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = rx.try_recv() {
            handled += 1;
            if let Err(err) = self.handle_socket(&envelope.event, &envelope.payload).await {
                debug!(error = %err, "continuing drain after failure");
            }
        }
        handled
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Execute engine actions for `id`. Returns whether a re-render was requested.
async fn perform(host: &Host, store: &PanelStore, id: &str, actions: Vec<Action>) -> Result<bool, OverlayError> {
    let mut needs_render = false;
    for action in actions {
        match action {
            Action::Persist(patch) => store.save(&patch).await?,
            Action::RenderNeeded => needs_render = true,
            other => host.renderer.apply(id, &other),
        }
    }
    Ok(needs_render)
}

fn owns_key(keys: &PanelKeys, key: &str) -> bool {
    keys.position == key || keys.locked == key || keys.centered == key || keys.expanded.as_deref() == Some(key)
}
