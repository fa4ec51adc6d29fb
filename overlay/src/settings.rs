//! The module's registered settings.
//!
//! Every key the overlay reads is declared here with its scope and default.
//! Hosts register them at startup; the sandbox seeds them into memory.

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;

use panels::negotiation::NegotiationState;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::host::{Scope, SettingsStore};
use crate::store::{NEGOTIATION_STATE_KEY, NEGOTIATION_VISIBLE_KEY};

pub const META_CURRENCY_ENABLED: &str = "metaCurrencyEnabled";
pub const SHOW_PLAYER_MALICE: &str = "showPlayerMalice";

/// Settings-menu grouping; `reset_defaults` works one group at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingGroup {
    Interface,
    Headers,
    Npc,
    MetaCurrency,
    Negotiation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingDef {
    pub key: &'static str,
    pub scope: Scope,
    pub group: SettingGroup,
    pub default: Value,
}

fn def(key: &'static str, scope: Scope, group: SettingGroup, default: Value) -> SettingDef {
    SettingDef { key, scope, group, default }
}

/// Every module setting, in registration order.
pub fn registry() -> Vec<SettingDef> {
    use Scope::{Client, World};
    use SettingGroup::*;

    let negotiation_default = serde_json::to_value(NegotiationState::default()).unwrap_or(Value::Null);

    vec![
        def("floatingNavTabs", Client, Interface, json!(true)),
        def("parallaxHeaderArt", Client, Interface, json!(false)),
        def("improvedChat", Client, Interface, json!(true)),
        def("heroHeaderEnabled", World, Headers, json!(true)),
        def("heroHeaderImage", World, Headers, json!("")),
        def("npcHeaderEnabled", World, Headers, json!(true)),
        def("npcHeaderImage", World, Headers, json!("")),
        def("npcFavoritesEnabled", World, Npc, json!(true)),
        def(META_CURRENCY_ENABLED, Client, MetaCurrency, json!(true)),
        def("metaCurrencyPosition", Client, MetaCurrency, Value::Null),
        def("metaCurrencyExpanded", Client, MetaCurrency, json!(true)),
        def("metaCurrencyLocked", Client, MetaCurrency, json!(false)),
        def("metaCurrencyCentered", Client, MetaCurrency, json!(false)),
        def("negotiationPosition", Client, Negotiation, Value::Null),
        def("negotiationLocked", Client, Negotiation, json!(false)),
        def("negotiationCentered", Client, Negotiation, json!(false)),
        def(NEGOTIATION_VISIBLE_KEY, World, Negotiation, json!(false)),
        def(NEGOTIATION_STATE_KEY, World, Negotiation, negotiation_default),
    ]
}

pub fn lookup(key: &str) -> Option<SettingDef> {
    registry().into_iter().find(|d| d.key == key)
}

/// Read a boolean setting, falling back to its registered default.
pub fn flag(settings: &dyn SettingsStore, namespace: &str, key: &str) -> bool {
    let Some(def) = lookup(key) else {
        return false;
    };
    settings
        .get(def.scope, namespace, key)
        .and_then(|v| v.as_bool())
        .or_else(|| def.default.as_bool())
        .unwrap_or(false)
}

/// Write defaults for keys that have no stored value. Returns how many
/// were written.
///
/// # Errors
///
/// Stops at the first failed write.
pub async fn seed_defaults(settings: &dyn SettingsStore, namespace: &str) -> Result<usize, StoreError> {
    let mut written = 0;
    for def in registry() {
        if settings.get(def.scope, namespace, def.key).is_some() {
            continue;
        }
        settings.set(def.scope, namespace, def.key, def.default).await?;
        written += 1;
    }
    Ok(written)
}

/// Restore every setting in `group` to its default. All writes are
/// attempted and awaited before returning, so a caller can re-render
/// straight after.
///
/// # Errors
///
/// Returns the first failure once every write has been attempted.
pub async fn reset_defaults(
    settings: &dyn SettingsStore,
    namespace: &str,
    group: SettingGroup,
) -> Result<usize, StoreError> {
    let mut first_error = None;
    let mut written = 0;
    for def in registry().into_iter().filter(|d| d.group == group) {
        match settings.set(def.scope, namespace, def.key, def.default).await {
            Ok(()) => written += 1,
            Err(err) => {
                warn!(key = def.key, error = %err, "reset write failed");
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => {
            info!(?group, written, "settings reset to defaults");
            Ok(written)
        }
    }
}
