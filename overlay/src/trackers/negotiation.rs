//! Shared negotiation tracker.
//!
//! DESIGN
//! ======
//! The document lives in world settings and is re-read on every render and
//! every action, so there is no cached copy to go stale. A GM mutation is
//! load, edit, save, then broadcast `negotiationUpdate`; receiving sessions
//! simply re-render. Concurrent GM edits are last write wins.
//!
//! Players get a filtered view: unrevealed counters are omitted, only
//! discovered entries are listed, and GM bookkeeping (attitude, appealed /
//! triggered flags, the add lists) is left out entirely.

use panels::negotiation::{Attitude, Counter, Entry, EntryList, Field, NegotiationState};
use panels::popup::{Popup, PopupState};
use panels::state::{PanelConfig, PanelKeys};
use serde_json::{Map, Value, json};
use socket::SocketMessage;
use tracing::{info, warn};

use super::{Outcome, PanelBehavior, int_field, require_gm, str_field};
use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::host::Host;
use crate::store::NegotiationStore;

pub const NEGOTIATION_ID: &str = "dsp-negotiation";

const END_TITLE: &str = "DRAW_STEEL_PLUS.Negotiation.endTitle";
const END_CONTENT: &str = "DRAW_STEEL_PLUS.Negotiation.endContent";

pub struct NegotiationTracker {
    config: PanelConfig,
    template: String,
    event: String,
    store: NegotiationStore,
    popup: PopupState,
}

impl NegotiationTracker {
    pub fn new(overlay: &OverlayConfig, store: NegotiationStore) -> Self {
        let config = PanelConfig {
            keys: PanelKeys {
                position: "negotiationPosition".to_owned(),
                locked: "negotiationLocked".to_owned(),
                centered: "negotiationCentered".to_owned(),
                expanded: None,
            },
            drag_handle: ".dsp-mc-drag-handle".to_owned(),
            locked_class: "dsp-mc-locked".to_owned(),
            supports_expand: false,
            ..PanelConfig::floating(NEGOTIATION_ID)
        }
        .with_placement(overlay.panel_default_width, overlay.panel_offset_y, overlay.reset_transition_ms);

        Self {
            config,
            template: format!("modules/{}/templates/ui/negotiation.hbs", overlay.module_id),
            event: overlay.socket_event.clone(),
            store,
            popup: PopupState::default(),
        }
    }

    pub fn popup(&self) -> Popup {
        self.popup.current()
    }

    /// Load, edit, save, broadcast.
    async fn mutate<T>(
        &self,
        host: &Host,
        action: &str,
        edit: impl FnOnce(&mut NegotiationState) -> Result<T, OverlayError>,
    ) -> Result<T, OverlayError> {
        require_gm(host, action)?;
        let mut state = self.store.load();
        let result = edit(&mut state)?;
        self.store.save(&state).await?;
        emit(host, &self.event, &SocketMessage::NegotiationUpdate);
        Ok(result)
    }

    async fn end(&mut self, host: &Host) -> Result<Outcome, OverlayError> {
        require_gm(host, "endNegotiation")?;
        if !host.dialog.confirm(END_TITLE, END_CONTENT).await {
            return Ok(Outcome::Unchanged);
        }
        self.store.save(&NegotiationState::ended()).await?;
        self.store.set_visible(false).await?;
        self.popup.close();
        emit(host, &self.event, &SocketMessage::NegotiationVisibility { visible: false });
        info!("negotiation ended");
        Ok(Outcome::Close)
    }
}

/// Broadcast failures are logged and otherwise ignored.
pub(crate) fn emit(host: &Host, event: &str, message: &SocketMessage) {
    if let Err(err) = host.socket.emit(event, message) {
        warn!(error = %err, kind = message.kind(), "broadcast failed");
    }
}

fn parse_list(action: &str, payload: &Value) -> Result<EntryList, OverlayError> {
    Ok(EntryList::parse(str_field(action, payload, "list")?)?)
}

fn parse_field(action: &str, payload: &Value) -> Result<Field, OverlayError> {
    Ok(Field::parse(str_field(action, payload, "field")?)?)
}

// =============================================================================
// CONTEXT
// =============================================================================

fn counter_view(field: Field, counter: &Counter, gm: bool) -> Value {
    if !gm && !counter.visible {
        return Value::Null;
    }
    json!({ "value": counter.value, "max": field.max(), "visible": counter.visible })
}

fn entry_view(list: EntryList, entry: &Entry, gm: bool) -> Value {
    let mut view = Map::new();
    view.insert("id".into(), json!(entry.id));
    view.insert("label".into(), json!(entry.label.as_deref().unwrap_or(&entry.id)));
    view.insert("custom".into(), json!(entry.custom));
    view.insert("discovered".into(), json!(entry.discovered));
    if gm {
        view.insert(list.engaged_key().into(), json!(entry.engaged));
    }
    Value::Object(view)
}

fn entries_view(state: &NegotiationState, list: EntryList, gm: bool) -> Value {
    state
        .entries(list)
        .iter()
        .filter(|e| gm || e.discovered)
        .map(|e| entry_view(list, e, gm))
        .collect()
}

#[async_trait::async_trait(?Send)]
impl PanelBehavior for NegotiationTracker {
    fn config(&self) -> &PanelConfig {
        &self.config
    }

    fn template(&self) -> &str {
        &self.template
    }

    fn prepare_context(&self, host: &Host) -> Value {
        let gm = host.world.is_gm();
        let state = self.store.load();

        let mut context = Map::new();
        context.insert("isGM".into(), json!(gm));
        context.insert("npcName".into(), json!(state.npc_name));
        for field in Field::ALL {
            context.insert(field.key().into(), counter_view(field, state.counter(field), gm));
        }
        for list in EntryList::ALL {
            context.insert(list.key().into(), entries_view(&state, list, gm));
        }
        if gm {
            let attitudes: Vec<Value> = Attitude::ALL
                .iter()
                .map(|a| {
                    json!({
                        "key": a.key(),
                        "interest": a.interest(),
                        "patience": a.patience(),
                        "selected": state.attitude == Some(*a),
                    })
                })
                .collect();
            context.insert("attitude".into(), json!(state.attitude.map_or("", Attitude::key)));
            context.insert("attitudes".into(), Value::Array(attitudes));
            context.insert("available".into(), json!(state.available()));
            context.insert("openPopup".into(), json!(self.popup.current().key()));
        }
        Value::Object(context)
    }

    async fn on_action(&mut self, host: &Host, action: &str, payload: &Value) -> Result<Outcome, OverlayError> {
        match action {
            "setNpcName" => {
                let name = str_field(action, payload, "name")?;
                self.mutate(host, action, |s| {
                    s.set_npc_name(name);
                    Ok(())
                })
                .await?;
            }
            "setAttitude" => {
                let key = str_field(action, payload, "attitude")?;
                let attitude = if key.is_empty() { None } else { Some(Attitude::parse(key)?) };
                self.mutate(host, action, |s| {
                    s.set_attitude(attitude);
                    Ok(())
                })
                .await?;
                self.popup.close();
            }
            "adjust" => {
                let field = parse_field(action, payload)?;
                let delta = int_field(action, payload, "delta")?;
                self.mutate(host, action, |s| Ok(s.adjust(field, delta))).await?;
            }
            "resetField" => {
                let field = parse_field(action, payload)?;
                self.mutate(host, action, |s| Ok(s.reset_field(field))).await?;
            }
            "toggleVisible" => {
                let field = parse_field(action, payload)?;
                self.mutate(host, action, |s| Ok(s.toggle_visible(field))).await?;
            }
            "toggleDiscovered" | "toggleEngaged" | "removeEntry" => {
                let list = parse_list(action, payload)?;
                let id = str_field(action, payload, "id")?;
                self.mutate(host, action, |s| {
                    match action {
                        "toggleDiscovered" => {
                            s.toggle_discovered(list, id)?;
                        }
                        "toggleEngaged" => {
                            s.toggle_engaged(list, id)?;
                        }
                        _ => {
                            s.remove_entry(list, id)?;
                        }
                    }
                    Ok(())
                })
                .await?;
            }
            "addEntry" => {
                let list = parse_list(action, payload)?;
                let id = str_field(action, payload, "id")?;
                self.mutate(host, action, |s| Ok(s.add_canonical(list, id)?)).await?;
                self.popup.close();
            }
            "addCustomEntry" => {
                let list = parse_list(action, payload)?;
                let label = str_field(action, payload, "label")?;
                self.mutate(host, action, |s| Ok(s.add_custom(list, label)?)).await?;
                self.popup.close();
            }
            "openPopup" => {
                let key = str_field(action, payload, "popup")?;
                let popup = Popup::parse(key)
                    .ok_or_else(|| OverlayError::invalid_payload(action, format!("unknown popup `{key}`")))?;
                self.popup.toggle(popup);
            }
            "closePopup" => {
                if !self.popup.close() {
                    return Ok(Outcome::Unchanged);
                }
            }
            "endNegotiation" => return self.end(host).await,
            _ => {
                return Err(OverlayError::UnknownAction { panel: NEGOTIATION_ID.to_owned(), action: action.to_owned() });
            }
        }
        Ok(Outcome::Render)
    }

    fn popup_mut(&mut self) -> Option<&mut PopupState> {
        Some(&mut self.popup)
    }
}
