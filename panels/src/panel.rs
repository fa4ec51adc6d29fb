//! The floating panel state machine.
//!
//! `FloatingPanel` owns one panel's cached [`PanelState`], its transient
//! [`DragSession`], and the bookkeeping for the listeners it asked the host
//! to install. Every hook returns the [`Action`]s the host must perform, in
//! order. Hooks never fail: when the element is not mounted (the panel was
//! closed while a render or event was in flight) they return no actions.

#[cfg(test)]
#[path = "panel_test.rs"]
mod panel_test;

use serde::Serialize;

use crate::bounds::{Surface, canvas_bounds, default_position};
use crate::consts::CURSOR_GRABBING;
use crate::geometry::{Point, Position, Size};
use crate::input::{Button, DragSession};
use crate::state::{PanelConfig, PanelPatch, PanelState};

/// Side effects requested from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Write these fields to the per-user panel settings.
    Persist(PanelPatch),
    /// Move the panel element through the host's positioning API.
    MoveTo(Position),
    /// Set the element's inline offsets directly (live drag feedback only).
    SetStyle(Position),
    /// Set the element cursor; `None` restores the default.
    SetCursor(Option<&'static str>),
    /// Cancel the browser default for the current pointer event.
    PreventDefault,
    /// Add (`on = true`) or remove a CSS class on the element.
    ToggleClass { class: String, on: bool },
    /// Remove a CSS class after a delay.
    ClearClassAfter { class: String, ms: u32 },
    /// Remove then re-add the drag-start listener on the handle element.
    BindDragHandle { selector: String },
    /// Attach pointer move/up listeners to the window.
    ListenPointer,
    /// Detach the window pointer move/up listeners.
    UnlistenPointer,
    /// Attach the window resize listener.
    ListenResize,
    /// Detach the window resize listener.
    UnlistenResize,
    /// Call back into [`FloatingPanel::on_animation_frame`] on the next frame.
    RequestAnimationFrame,
    /// Re-render the panel.
    RenderNeeded,
}

/// Chrome flags exposed to templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatingState {
    pub is_locked: bool,
    pub is_expanded: bool,
}

/// A draggable, lockable, optionally collapsible screen-anchored panel.
#[derive(Debug, Clone)]
pub struct FloatingPanel {
    config: PanelConfig,
    state: PanelState,
    drag: Option<DragSession>,
    /// Current screen position of the element.
    position: Option<Position>,
    /// Rendered size; `None` until the first render and after close.
    size: Option<Size>,
    resize_listening: bool,
    resize_scheduled: bool,
}

impl FloatingPanel {
    #[must_use]
    pub fn new(config: PanelConfig, state: PanelState) -> Self {
        Self {
            config,
            state,
            drag: None,
            position: None,
            size: None,
            resize_listening: false,
            resize_scheduled: false,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.config.id
    }

    #[must_use]
    pub fn state(&self) -> &PanelState {
        &self.state
    }

    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.size.is_some()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    #[must_use]
    pub fn is_listening_resize(&self) -> bool {
        self.resize_listening
    }

    #[must_use]
    pub fn floating_state(&self) -> FloatingState {
        FloatingState { is_locked: self.state.locked, is_expanded: self.state.expanded }
    }

    /// Replace the cached state after an external settings change.
    pub fn reload(&mut self, state: PanelState) {
        self.state = state;
    }

    // --- Lifecycle hooks ---

    /// Decide where the panel is first painted.
    ///
    /// A centered panel, or one without saved history, lands on the canvas
    /// default. A panel the user has placed is restored verbatim.
    pub fn pre_first_render(&mut self, surface: &dyn Surface) -> Vec<Action> {
        let mut actions = Vec::new();
        let position = match self.state.position {
            Some(saved) if !self.state.centered => saved,
            _ => {
                if !self.state.centered {
                    self.state.centered = true;
                    actions.push(Action::Persist(PanelPatch::centered(true)));
                }
                self.default_for(surface, self.config.default_width)
            }
        };
        self.position = Some(position);
        actions.push(Action::MoveTo(position));
        actions
    }

    /// The element moved by any means. Ignored mid-drag: the drag handler
    /// commits the final value on release.
    pub fn on_position(&mut self, position: Position) -> Vec<Action> {
        self.position = Some(position);
        if self.drag.is_some() {
            return Vec::new();
        }
        self.state.position = Some(position);
        vec![Action::Persist(PanelPatch::position(position))]
    }

    /// Apply chrome classes and (re)bind listeners after the host painted the
    /// panel at `size`.
    pub fn on_render(&mut self, size: Size) -> Vec<Action> {
        self.size = Some(size);
        let mut actions = vec![Action::ToggleClass { class: self.config.locked_class.clone(), on: self.state.locked }];
        if self.config.supports_expand {
            actions.push(Action::ToggleClass { class: self.config.minimized_class.clone(), on: !self.state.expanded });
        }
        actions.push(Action::BindDragHandle { selector: self.config.drag_handle.clone() });

        if self.resize_listening {
            self.resize_listening = false;
            actions.push(Action::UnlistenResize);
        }
        if self.state.locked && self.state.centered {
            self.resize_listening = true;
            actions.push(Action::ListenResize);
        }
        actions
    }

    /// First paint: [`Self::pre_first_render`] followed by [`Self::on_render`].
    pub fn mount(&mut self, surface: &dyn Surface, size: Size) -> Vec<Action> {
        let mut actions = self.pre_first_render(surface);
        actions.extend(self.on_render(size));
        actions
    }

    /// Window resized. Coalesced to one recompute per animation frame.
    pub fn on_resize(&mut self) -> Vec<Action> {
        if !self.resize_listening || self.resize_scheduled {
            return Vec::new();
        }
        self.resize_scheduled = true;
        vec![Action::RequestAnimationFrame]
    }

    /// Scheduled frame after a resize: re-snap a locked, centered panel.
    pub fn on_animation_frame(&mut self, surface: &dyn Surface) -> Vec<Action> {
        self.resize_scheduled = false;
        if !self.state.locked || !self.state.centered {
            return Vec::new();
        }
        let Some(width) = self.rendered_width() else {
            return Vec::new();
        };
        let position = self.default_for(surface, width);
        self.move_to(position)
    }

    /// Detach everything this panel registered.
    pub fn close(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.resize_listening {
            self.resize_listening = false;
            actions.push(Action::UnlistenResize);
        }
        if self.drag.take().is_some() {
            actions.push(Action::UnlistenPointer);
        }
        self.resize_scheduled = false;
        self.size = None;
        actions
    }

    // --- Drag ---

    /// Pointer-down on the drag handle.
    pub fn on_drag_start(&mut self, pointer: Point, button: Button) -> Vec<Action> {
        if button != Button::Primary || self.state.locked || self.drag.is_some() || self.size.is_none() {
            return Vec::new();
        }
        let Some(origin) = self.position else {
            return Vec::new();
        };
        self.drag = Some(DragSession::new(pointer, origin));
        vec![Action::PreventDefault, Action::SetCursor(Some(CURSOR_GRABBING)), Action::ListenPointer]
    }

    /// Pointer moved anywhere in the window.
    pub fn on_drag_move(&mut self, pointer: Point) -> Vec<Action> {
        let Some(session) = self.drag else {
            return Vec::new();
        };
        let position = session.position_at(pointer);
        self.position = Some(position);
        vec![Action::SetStyle(position)]
    }

    /// Pointer released. The user has taken manual control: `centered` is
    /// cleared and the rounded final position is committed.
    pub fn on_drag_end(&mut self, pointer: Point) -> Vec<Action> {
        let Some(session) = self.drag.take() else {
            return Vec::new();
        };
        let mut actions = vec![Action::SetCursor(None), Action::UnlistenPointer];
        self.state.centered = false;
        actions.push(Action::Persist(PanelPatch::centered(false)));
        let position = session.position_at(pointer).rounded();
        actions.extend(self.move_to(position));
        actions
    }

    // --- Toolbar actions ---

    pub fn toggle_lock(&mut self) -> Vec<Action> {
        self.state.locked = !self.state.locked;
        vec![Action::Persist(PanelPatch::locked(self.state.locked)), Action::RenderNeeded]
    }

    pub fn toggle_expanded(&mut self) -> Vec<Action> {
        if !self.config.supports_expand {
            return Vec::new();
        }
        self.state.expanded = !self.state.expanded;
        vec![Action::Persist(PanelPatch::expanded(self.state.expanded)), Action::RenderNeeded]
    }

    /// Return to centered mode and snap to the canvas default immediately.
    pub fn reset_position(&mut self, surface: &dyn Surface) -> Vec<Action> {
        let Some(width) = self.rendered_width() else {
            return Vec::new();
        };
        self.state.centered = true;
        let mut actions = vec![
            Action::Persist(PanelPatch::centered(true)),
            Action::ToggleClass { class: self.config.resetting_class.clone(), on: true },
        ];
        let position = self.default_for(surface, width);
        actions.extend(self.move_to(position));
        actions.push(Action::RenderNeeded);
        actions.push(Action::ClearClassAfter {
            class: self.config.resetting_class.clone(),
            ms: self.config.reset_transition_ms,
        });
        actions
    }

    // --- Internals ---

    fn move_to(&mut self, position: Position) -> Vec<Action> {
        let mut actions = vec![Action::MoveTo(position)];
        actions.extend(self.on_position(position));
        actions
    }

    fn rendered_width(&self) -> Option<f64> {
        let size = self.size?;
        Some(if size.width > 0.0 { size.width } else { self.config.default_width })
    }

    fn default_for(&self, surface: &dyn Surface, width: f64) -> Position {
        default_position(canvas_bounds(surface), width, self.config.offset_y)
    }
}
