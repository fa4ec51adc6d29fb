//! Typed accessors over the settings collaborator.
//!
//! DESIGN
//! ======
//! Each state bag has exactly one `load` / `save` pair, and merging stored
//! values with defaults happens only here. A missing key and an unreadable
//! value both load as the default; the unreadable case is logged so a
//! corrupted setting does not keep a panel from opening.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use panels::negotiation::NegotiationState;
use panels::state::{PanelKeys, PanelPatch, PanelState};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::StoreError;
use crate::host::{Scope, SettingsStore};

pub const NEGOTIATION_STATE_KEY: &str = "negotiationState";
pub const NEGOTIATION_VISIBLE_KEY: &str = "negotiationUIVisible";

// =============================================================================
// HELPERS
// =============================================================================

/// Read and decode one setting. `None` when missing, null or unreadable.
pub fn read<T: DeserializeOwned>(settings: &dyn SettingsStore, scope: Scope, namespace: &str, key: &str) -> Option<T> {
    let value = settings.get(scope, namespace, key)?;
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(source) => {
            let err = StoreError::Decode { key: key.to_owned(), source };
            warn!(error = %err, namespace, "ignoring stored value");
            None
        }
    }
}

/// Encode and write one setting.
///
/// # Errors
///
/// Propagates the collaborator's write failure.
pub async fn write<T: Serialize>(
    settings: &dyn SettingsStore,
    scope: Scope,
    namespace: &str,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let value = serde_json::to_value(value).map_err(|source| StoreError::Encode { key: key.to_owned(), source })?;
    settings.set(scope, namespace, key, value).await
}

// =============================================================================
// PANEL STATE
// =============================================================================

/// Per-user chrome state of one panel.
#[derive(Clone)]
pub struct PanelStore {
    settings: Rc<dyn SettingsStore>,
    namespace: String,
    keys: PanelKeys,
}

impl PanelStore {
    pub fn new(settings: Rc<dyn SettingsStore>, namespace: &str, keys: PanelKeys) -> Self {
        Self { settings, namespace: namespace.to_owned(), keys }
    }

    pub fn load(&self) -> PanelState {
        let defaults = PanelState::default();
        let get_bool = |key: &str, default: bool| {
            read::<bool>(self.settings.as_ref(), Scope::Client, &self.namespace, key).unwrap_or(default)
        };
        PanelState {
            position: read(self.settings.as_ref(), Scope::Client, &self.namespace, &self.keys.position),
            locked: get_bool(&self.keys.locked, defaults.locked),
            centered: get_bool(&self.keys.centered, defaults.centered),
            expanded: self
                .keys
                .expanded
                .as_deref()
                .map_or(defaults.expanded, |key| get_bool(key, defaults.expanded)),
        }
    }

    /// Write every field present in `patch`, in field order. Expanded is
    /// dropped for panels without an expanded key.
    ///
    /// # Errors
    ///
    /// Stops at the first failed write.
    pub async fn save(&self, patch: &PanelPatch) -> Result<(), StoreError> {
        let settings = self.settings.as_ref();
        if let Some(position) = patch.position {
            write(settings, Scope::Client, &self.namespace, &self.keys.position, &position).await?;
        }
        if let Some(locked) = patch.locked {
            write(settings, Scope::Client, &self.namespace, &self.keys.locked, &locked).await?;
        }
        if let Some(centered) = patch.centered {
            write(settings, Scope::Client, &self.namespace, &self.keys.centered, &centered).await?;
        }
        if let (Some(expanded), Some(key)) = (patch.expanded, self.keys.expanded.as_deref()) {
            write(settings, Scope::Client, &self.namespace, key, &expanded).await?;
        }
        Ok(())
    }
}

// =============================================================================
// NEGOTIATION STATE
// =============================================================================

/// The world-scoped negotiation document and its visibility flag.
#[derive(Clone)]
pub struct NegotiationStore {
    settings: Rc<dyn SettingsStore>,
    namespace: String,
}

impl NegotiationStore {
    pub fn new(settings: Rc<dyn SettingsStore>, namespace: &str) -> Self {
        Self { settings, namespace: namespace.to_owned() }
    }

    /// Stored document merged over defaults.
    pub fn load(&self) -> NegotiationState {
        read(self.settings.as_ref(), Scope::World, &self.namespace, NEGOTIATION_STATE_KEY).unwrap_or_default()
    }

    /// # Errors
    ///
    /// Propagates the collaborator's write failure.
    pub async fn save(&self, state: &NegotiationState) -> Result<(), StoreError> {
        write(self.settings.as_ref(), Scope::World, &self.namespace, NEGOTIATION_STATE_KEY, state).await
    }

    pub fn visible(&self) -> bool {
        read(self.settings.as_ref(), Scope::World, &self.namespace, NEGOTIATION_VISIBLE_KEY).unwrap_or(false)
    }

    /// # Errors
    ///
    /// Propagates the collaborator's write failure.
    pub async fn set_visible(&self, visible: bool) -> Result<(), StoreError> {
        write(self.settings.as_ref(), Scope::World, &self.namespace, NEGOTIATION_VISIBLE_KEY, &visible).await
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// World-scoped values shared between several [`MemoryStore`]s, one per
/// simulated session.
pub type SharedWorld = Rc<RefCell<HashMap<String, Value>>>;

/// A [`SettingsStore`] backed by maps. Client values are private to the
/// store; world values live in a [`SharedWorld`].
#[derive(Default)]
pub struct MemoryStore {
    client: RefCell<HashMap<String, Value>>,
    world: SharedWorld,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that shares world settings with every other store built
    /// from the same `world`.
    pub fn with_world(world: SharedWorld) -> Self {
        Self { world, ..Self::default() }
    }

    pub fn world(&self) -> SharedWorld {
        Rc::clone(&self.world)
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    fn full_key(namespace: &str, key: &str) -> String {
        format!("{namespace}.{key}")
    }
}

#[async_trait::async_trait(?Send)]
impl SettingsStore for MemoryStore {
    fn get(&self, scope: Scope, namespace: &str, key: &str) -> Option<Value> {
        let key = Self::full_key(namespace, key);
        match scope {
            Scope::Client => self.client.borrow().get(&key).cloned(),
            Scope::World => self.world.borrow().get(&key).cloned(),
        }
    }

    async fn set(&self, scope: Scope, namespace: &str, key: &str, value: Value) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Write { key: key.to_owned(), message: "storage unavailable".to_owned() });
        }
        let key = Self::full_key(namespace, key);
        match scope {
            Scope::Client => self.client.borrow_mut().insert(key, value),
            Scope::World => self.world.borrow_mut().insert(key, value),
        };
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
