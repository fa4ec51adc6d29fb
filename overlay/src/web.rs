//! Browser bindings (`hydrate` only).
//!
//! SYSTEM CONTEXT
//! ==============
//! The tabletop host owns the page; this module only measures the board
//! canvas and keeps per-client settings in `localStorage` when the overlay
//! runs outside the host's own settings API. World-scope keys get a separate
//! prefix so a local preview never mixes them with client keys.

use panels::bounds::Surface;
use panels::geometry::{Rect, Size};
use serde_json::Value;
use tracing::warn;
use wasm_bindgen::prelude::*;

use crate::error::StoreError;
use crate::host::{Scope, SettingsStore};

/// Selector for the host's main drawing surface.
pub const BOARD_SELECTOR: &str = "#board";

const WORLD_PREFIX: &str = "world:";

/// Route panics to the browser console.
pub fn install_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Module entry point run once when the wasm bundle is instantiated.
#[wasm_bindgen(start)]
pub fn start() {
    install_panic_hook();
}

/// The live board canvas, measured on every call.
pub struct DomSurface {
    selector: String,
}

impl DomSurface {
    pub fn new(selector: impl Into<String>) -> Self {
        Self { selector: selector.into() }
    }
}

impl Default for DomSurface {
    fn default() -> Self {
        Self::new(BOARD_SELECTOR)
    }
}

impl Surface for DomSurface {
    fn canvas_rect(&self) -> Option<Rect> {
        let document = web_sys::window().and_then(|w| w.document())?;
        let element = document.query_selector(&self.selector).ok().flatten()?;
        let rect = element.get_bounding_client_rect();
        Some(Rect::new(rect.left(), rect.top(), rect.width(), rect.height()))
    }

    fn viewport(&self) -> Size {
        let Some(window) = web_sys::window() else {
            return Size::default();
        };
        let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Size::new(width, height)
    }
}

/// Settings persisted as JSON strings in `localStorage`.
#[derive(Default)]
pub struct LocalStorageStore;

impl LocalStorageStore {
    fn storage_key(scope: Scope, namespace: &str, key: &str) -> String {
        match scope {
            Scope::Client => format!("{namespace}.{key}"),
            Scope::World => format!("{WORLD_PREFIX}{namespace}.{key}"),
        }
    }

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }
}

#[async_trait::async_trait(?Send)]
impl SettingsStore for LocalStorageStore {
    fn get(&self, scope: Scope, namespace: &str, key: &str) -> Option<Value> {
        let storage_key = Self::storage_key(scope, namespace, key);
        let raw = Self::storage()?.get_item(&storage_key).ok().flatten()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key = %storage_key, error = %err, "discarding unreadable stored setting");
                None
            }
        }
    }

    async fn set(&self, scope: Scope, namespace: &str, key: &str, value: Value) -> Result<(), StoreError> {
        let storage = Self::storage()
            .ok_or_else(|| StoreError::Write { key: key.to_owned(), message: "localStorage unavailable".to_owned() })?;
        let raw = value.to_string();
        storage
            .set_item(&Self::storage_key(scope, namespace, key), &raw)
            .map_err(|err| StoreError::Write { key: key.to_owned(), message: format!("{err:?}") })
    }
}
