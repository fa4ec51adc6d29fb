//! In-memory collaborators.
//!
//! These back the `dsp-sandbox` binary and the controller tests. Each one
//! records what was asked of it so a caller can inspect the outcome without
//! a browser.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use panels::bounds::{FixedSurface, Surface};
use panels::geometry::{Rect, Size};
use panels::panel::Action;
use serde_json::Value;
use socket::SocketMessage;

use crate::error::{RenderError, ResourceError, SocketError};
use crate::host::{ConfirmDialog, HeroTokens, Host, Malice, Notifier, Renderer, Socket, World};
use crate::store::{MemoryStore, SharedWorld};

// =============================================================================
// RENDERER
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub panel: String,
    pub template: String,
    pub context: Value,
}

/// Records every render and action; every panel measures `size`.
pub struct RecordingRenderer {
    size: Cell<Size>,
    fail: Cell<bool>,
    renders: RefCell<Vec<Rendered>>,
    applied: RefCell<Vec<(String, Action)>>,
    unmounted: RefCell<Vec<String>>,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self {
            size: Cell::new(Size::new(280.0, 120.0)),
            fail: Cell::new(false),
            renders: RefCell::default(),
            applied: RefCell::default(),
            unmounted: RefCell::default(),
        }
    }
}

impl RecordingRenderer {
    pub fn set_size(&self, size: Size) {
        self.size.set(size);
    }

    pub fn fail_renders(&self, fail: bool) {
        self.fail.set(fail);
    }

    pub fn render_count(&self, panel: &str) -> usize {
        self.renders.borrow().iter().filter(|r| r.panel == panel).count()
    }

    pub fn last_context(&self, panel: &str) -> Option<Value> {
        self.renders.borrow().iter().rev().find(|r| r.panel == panel).map(|r| r.context.clone())
    }

    pub fn applied(&self, panel: &str) -> Vec<Action> {
        self.applied.borrow().iter().filter(|(p, _)| p == panel).map(|(_, a)| a.clone()).collect()
    }

    pub fn clear_applied(&self) {
        self.applied.borrow_mut().clear();
    }

    pub fn unmounted(&self) -> Vec<String> {
        self.unmounted.borrow().clone()
    }
}

#[async_trait::async_trait(?Send)]
impl Renderer for RecordingRenderer {
    async fn render(&self, panel: &str, template: &str, context: &Value) -> Result<Size, RenderError> {
        if self.fail.get() {
            return Err(RenderError::Failed { panel: panel.to_owned(), message: "template missing".to_owned() });
        }
        self.renders.borrow_mut().push(Rendered {
            panel: panel.to_owned(),
            template: template.to_owned(),
            context: context.clone(),
        });
        Ok(self.size.get())
    }

    fn apply(&self, panel: &str, action: &Action) {
        self.applied.borrow_mut().push((panel.to_owned(), action.clone()));
    }

    fn unmount(&self, panel: &str) {
        self.unmounted.borrow_mut().push(panel.to_owned());
    }
}

// =============================================================================
// SOCKET / DIALOG / NOTIFIER
// =============================================================================

/// Keeps emitted messages instead of delivering them.
#[derive(Default)]
pub struct RecordingSocket {
    sent: RefCell<Vec<(String, SocketMessage)>>,
}

impl RecordingSocket {
    pub fn sent(&self) -> Vec<(String, SocketMessage)> {
        self.sent.borrow().clone()
    }
}

impl Socket for RecordingSocket {
    fn emit(&self, event: &str, message: &SocketMessage) -> Result<(), SocketError> {
        self.sent.borrow_mut().push((event.to_owned(), *message));
        Ok(())
    }
}

/// Answers every confirmation with a preset value.
pub struct ScriptedDialog {
    answer: Cell<bool>,
    asked: Cell<usize>,
}

impl ScriptedDialog {
    pub fn answering(answer: bool) -> Self {
        Self { answer: Cell::new(answer), asked: Cell::new(0) }
    }

    pub fn set_answer(&self, answer: bool) {
        self.answer.set(answer);
    }

    pub fn asked(&self) -> usize {
        self.asked.get()
    }
}

#[async_trait::async_trait(?Send)]
impl ConfirmDialog for ScriptedDialog {
    async fn confirm(&self, _title: &str, _content: &str) -> bool {
        self.asked.set(self.asked.get() + 1);
        self.answer.get()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    errors: RefCell<Vec<String>>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_owned());
    }
}

// =============================================================================
// RESOURCES / WORLD / SURFACE
// =============================================================================

#[derive(Default)]
pub struct CountingTokens {
    value: Cell<u32>,
    spent_for: RefCell<Vec<String>>,
}

impl CountingTokens {
    pub fn spent_for(&self) -> Vec<String> {
        self.spent_for.borrow().clone()
    }
}

#[async_trait::async_trait(?Send)]
impl HeroTokens for CountingTokens {
    fn value(&self) -> u32 {
        self.value.get()
    }

    async fn give_token(&self) -> Result<(), ResourceError> {
        self.value.set(self.value.get() + 1);
        Ok(())
    }

    async fn spend_token(&self, reason: &str) -> Result<(), ResourceError> {
        let Some(next) = self.value.get().checked_sub(1) else {
            return Err(ResourceError::Rejected { resource: "hero tokens", message: "pool is empty".to_owned() });
        };
        self.value.set(next);
        self.spent_for.borrow_mut().push(reason.to_owned());
        Ok(())
    }

    async fn reset_tokens(&self) -> Result<(), ResourceError> {
        self.value.set(0);
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingMalice {
    value: Cell<u32>,
}

#[async_trait::async_trait(?Send)]
impl Malice for CountingMalice {
    fn value(&self) -> u32 {
        self.value.get()
    }

    async fn adjust_malice(&self) -> Result<(), ResourceError> {
        self.value.set(self.value.get() + 1);
        Ok(())
    }

    async fn reset_malice(&self) -> Result<(), ResourceError> {
        self.value.set(0);
        Ok(())
    }
}

pub struct FixedWorld {
    gm: bool,
    combat: Cell<bool>,
}

impl FixedWorld {
    pub fn new(gm: bool) -> Self {
        Self { gm, combat: Cell::new(false) }
    }

    pub fn set_combat(&self, active: bool) {
        self.combat.set(active);
    }
}

impl World for FixedWorld {
    fn is_gm(&self) -> bool {
        self.gm
    }

    fn combat_active(&self) -> bool {
        self.combat.get()
    }
}

/// A surface whose geometry can change between frames.
pub struct MemorySurface {
    current: Cell<FixedSurface>,
}

impl MemorySurface {
    pub fn new(canvas: Rect, viewport: Size) -> Self {
        Self { current: Cell::new(FixedSurface::ready(canvas, viewport)) }
    }

    pub fn resize(&self, canvas: Option<Rect>, viewport: Size) {
        self.current.set(FixedSurface { canvas, viewport });
    }
}

impl Surface for MemorySurface {
    fn canvas_rect(&self) -> Option<Rect> {
        self.current.get().canvas
    }

    fn viewport(&self) -> Size {
        self.current.get().viewport
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// One simulated client: concrete collaborators plus the [`Host`] built
/// from them.
pub struct MemorySession {
    pub settings: Rc<MemoryStore>,
    pub renderer: Rc<RecordingRenderer>,
    pub dialog: Rc<ScriptedDialog>,
    pub notifier: Rc<RecordingNotifier>,
    pub world: Rc<FixedWorld>,
    pub hero_tokens: Rc<CountingTokens>,
    pub malice: Rc<CountingMalice>,
    pub surface: Rc<MemorySurface>,
    pub socket: Rc<dyn Socket>,
}

impl MemorySession {
    /// A session on a 1000x800 canvas inside a 1300x800 window.
    pub fn new(world: SharedWorld, socket: Rc<dyn Socket>, gm: bool) -> Self {
        Self {
            settings: Rc::new(MemoryStore::with_world(world)),
            renderer: Rc::new(RecordingRenderer::default()),
            dialog: Rc::new(ScriptedDialog::answering(true)),
            notifier: Rc::new(RecordingNotifier::default()),
            world: Rc::new(FixedWorld::new(gm)),
            hero_tokens: Rc::new(CountingTokens::default()),
            malice: Rc::new(CountingMalice::default()),
            surface: Rc::new(MemorySurface::new(Rect::new(0.0, 0.0, 1000.0, 800.0), Size::new(1300.0, 800.0))),
            socket,
        }
    }

    pub fn host(&self) -> Host {
        Host {
            settings: self.settings.clone(),
            socket: Rc::clone(&self.socket),
            hero_tokens: Some(self.hero_tokens.clone()),
            malice: Some(self.malice.clone()),
            dialog: self.dialog.clone(),
            renderer: self.renderer.clone(),
            notifier: self.notifier.clone(),
            world: self.world.clone(),
            surface: self.surface.clone(),
        }
    }
}
