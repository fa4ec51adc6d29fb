use super::*;
use crate::bounds::FixedSurface;
use crate::geometry::Rect;

fn surface() -> FixedSurface {
    FixedSurface::ready(Rect::new(0.0, 0.0, 1000.0, 800.0), Size::new(1300.0, 800.0))
}

fn wide_surface() -> FixedSurface {
    FixedSurface::ready(Rect::new(0.0, 0.0, 1200.0, 900.0), Size::new(1500.0, 900.0))
}

fn panel(state: PanelState) -> FloatingPanel {
    FloatingPanel::new(PanelConfig::floating("dsp-test"), state)
}

/// A panel that has been placed and painted at 200x100.
fn mounted(state: PanelState) -> FloatingPanel {
    let mut p = panel(state);
    p.pre_first_render(&surface());
    p.on_render(Size::new(200.0, 100.0));
    p
}

fn persisted(actions: &[Action]) -> Vec<PanelPatch> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::Persist(patch) => Some(*patch),
            _ => None,
        })
        .collect()
}

// =============================================================
// pre_first_render
// =============================================================

#[test]
fn first_render_without_history_uses_default_and_sets_centered() {
    let mut p = panel(PanelState::default());
    let actions = p.pre_first_render(&surface());
    let expected = Position::new(800.0 - 160.0, 500.0 - 140.0);
    assert_eq!(actions, vec![Action::Persist(PanelPatch::centered(true)), Action::MoveTo(expected)]);
    assert!(p.state().centered);
    assert_eq!(p.position(), Some(expected));
}

#[test]
fn first_render_with_centered_flag_ignores_saved_position() {
    let state = PanelState { position: Some(Position::new(5.0, 5.0)), centered: true, ..PanelState::default() };
    let mut p = panel(state);
    let actions = p.pre_first_render(&surface());
    assert_eq!(actions, vec![Action::MoveTo(Position::new(640.0, 360.0))]);
}

#[test]
fn first_render_restores_saved_position_verbatim() {
    let saved = Position::new(123.0, 456.0);
    let mut p = panel(PanelState { position: Some(saved), ..PanelState::default() });
    let actions = p.pre_first_render(&surface());
    assert_eq!(actions, vec![Action::MoveTo(saved)]);
    assert!(!p.state().centered);
}

#[test]
fn first_render_without_canvas_uses_viewport() {
    let mut p = panel(PanelState::default());
    let actions = p.pre_first_render(&FixedSurface::window_only(Size::new(600.0, 400.0)));
    assert_eq!(actions.last(), Some(&Action::MoveTo(Position::new(240.0, 160.0))));
}

// =============================================================
// on_position
// =============================================================

#[test]
fn position_change_is_persisted() {
    let mut p = mounted(PanelState::default());
    let actions = p.on_position(Position::new(10.0, 20.0));
    assert_eq!(actions, vec![Action::Persist(PanelPatch::position(Position::new(10.0, 20.0)))]);
    assert_eq!(p.state().position, Some(Position::new(10.0, 20.0)));
}

#[test]
fn position_change_is_ignored_while_dragging() {
    let mut p = mounted(PanelState::default());
    p.on_drag_start(Point::new(0.0, 0.0), Button::Primary);
    assert!(p.on_position(Position::new(10.0, 20.0)).is_empty());
}

// =============================================================
// on_render
// =============================================================

#[test]
fn render_applies_classes_and_binds_handle() {
    let mut p = panel(PanelState { expanded: false, ..PanelState::default() });
    p.pre_first_render(&surface());
    let actions = p.on_render(Size::new(200.0, 100.0));
    assert_eq!(
        actions,
        vec![
            Action::ToggleClass { class: "dsp-fui-locked".into(), on: false },
            Action::ToggleClass { class: "dsp-fui-minimized".into(), on: true },
            Action::BindDragHandle { selector: ".dsp-fui-drag-handle".into() },
        ]
    );
    assert!(p.is_mounted());
}

#[test]
fn render_skips_minimized_class_when_collapse_unsupported() {
    let mut config = PanelConfig::floating("dsp-negotiation");
    config.supports_expand = false;
    let mut p = FloatingPanel::new(config, PanelState::default());
    let actions = p.on_render(Size::new(10.0, 10.0));
    assert!(!actions.iter().any(|a| matches!(a, Action::ToggleClass { class, .. } if class.contains("minimized"))));
}

#[test]
fn resize_listener_only_when_locked_and_centered() {
    let mut p = mounted(PanelState { locked: true, ..PanelState::default() });
    assert!(p.state().centered);
    assert!(p.is_listening_resize());

    let mut unlocked = mounted(PanelState::default());
    assert!(!unlocked.is_listening_resize());
    let actions = unlocked.on_render(Size::new(200.0, 100.0));
    assert!(!actions.contains(&Action::ListenResize));
}

#[test]
fn rerender_rebinds_resize_listener_exactly_once() {
    let mut p = mounted(PanelState { locked: true, ..PanelState::default() });
    let actions = p.on_render(Size::new(200.0, 100.0));
    let unlisten = actions.iter().filter(|a| **a == Action::UnlistenResize).count();
    let listen = actions.iter().filter(|a| **a == Action::ListenResize).count();
    assert_eq!((unlisten, listen), (1, 1));
}

#[test]
fn mount_places_then_paints() {
    let mut p = panel(PanelState { locked: true, ..PanelState::default() });
    let actions = p.mount(&surface(), Size::new(200.0, 100.0));
    assert_eq!(actions[0], Action::Persist(PanelPatch::centered(true)));
    assert_eq!(actions[1], Action::MoveTo(Position::new(640.0, 360.0)));
    assert_eq!(actions.last(), Some(&Action::ListenResize));
    assert!(p.is_mounted());
}

// =============================================================
// resize
// =============================================================

#[test]
fn resize_is_coalesced_per_frame() {
    let mut p = mounted(PanelState { locked: true, ..PanelState::default() });
    assert_eq!(p.on_resize(), vec![Action::RequestAnimationFrame]);
    assert!(p.on_resize().is_empty());
    assert!(p.on_resize().is_empty());
    p.on_animation_frame(&wide_surface());
    assert_eq!(p.on_resize(), vec![Action::RequestAnimationFrame]);
}

#[test]
fn locked_centered_panel_follows_canvas_on_resize() {
    let mut p = mounted(PanelState { locked: true, ..PanelState::default() });
    p.on_resize();
    let actions = p.on_animation_frame(&wide_surface());
    let expected = Position::new(900.0 - 160.0, 600.0 - 100.0);
    assert_eq!(actions, vec![Action::MoveTo(expected), Action::Persist(PanelPatch::position(expected))]);
    assert_eq!(p.position(), Some(expected));
}

#[test]
fn unlocked_panel_does_not_move_on_resize() {
    let mut p = mounted(PanelState::default());
    let before = p.position();
    assert!(p.on_resize().is_empty());
    assert!(p.on_animation_frame(&wide_surface()).is_empty());
    assert_eq!(p.position(), before);
}

#[test]
fn animation_frame_after_unlock_does_nothing() {
    let mut p = mounted(PanelState { locked: true, ..PanelState::default() });
    p.on_resize();
    p.toggle_lock();
    assert!(p.on_animation_frame(&wide_surface()).is_empty());
}

#[test]
fn resize_uses_default_width_when_unmeasured() {
    let mut p = panel(PanelState { locked: true, ..PanelState::default() });
    p.pre_first_render(&surface());
    p.on_render(Size::new(0.0, 0.0));
    p.on_resize();
    let actions = p.on_animation_frame(&wide_surface());
    assert_eq!(actions.first(), Some(&Action::MoveTo(Position::new(740.0, 460.0))));
}

// =============================================================
// drag
// =============================================================

#[test]
fn drag_commits_offset_and_clears_centered() {
    let mut p = mounted(PanelState::default());
    let origin = p.position().unwrap();
    assert!(p.state().centered);

    let start = p.on_drag_start(Point::new(100.0, 100.0), Button::Primary);
    assert_eq!(start, vec![Action::PreventDefault, Action::SetCursor(Some("grabbing")), Action::ListenPointer]);

    p.on_drag_move(Point::new(110.0, 90.0));
    let end = p.on_drag_end(Point::new(130.4, 70.6));
    let expected = Position::new(origin.top - 29.0, origin.left + 30.0);

    assert_eq!(
        persisted(&end),
        vec![PanelPatch::centered(false), PanelPatch::position(expected)]
    );
    assert!(end.contains(&Action::UnlistenPointer));
    assert!(end.contains(&Action::SetCursor(None)));
    assert!(!p.state().centered);
    assert_eq!(p.state().position, Some(expected));
    assert!(!p.is_dragging());
}

#[test]
fn drag_move_is_additive_to_origin_not_previous_frame() {
    let mut p = mounted(PanelState { position: Some(Position::new(50.0, 50.0)), ..PanelState::default() });
    p.on_drag_start(Point::new(0.0, 0.0), Button::Primary);
    p.on_drag_move(Point::new(5.0, 5.0));
    let actions = p.on_drag_move(Point::new(7.0, 3.0));
    assert_eq!(actions, vec![Action::SetStyle(Position::new(53.0, 57.0))]);
}

#[test]
fn drag_move_does_not_persist() {
    let mut p = mounted(PanelState::default());
    p.on_drag_start(Point::new(0.0, 0.0), Button::Primary);
    let actions = p.on_drag_move(Point::new(40.0, 40.0));
    assert!(persisted(&actions).is_empty());
}

#[test]
fn locked_panel_cannot_be_dragged() {
    let mut p = mounted(PanelState { locked: true, ..PanelState::default() });
    let before = p.position();
    assert!(p.on_drag_start(Point::new(0.0, 0.0), Button::Primary).is_empty());
    assert!(p.on_drag_move(Point::new(50.0, 50.0)).is_empty());
    assert!(p.on_drag_end(Point::new(50.0, 50.0)).is_empty());
    assert_eq!(p.position(), before);
}

#[test]
fn non_primary_button_does_not_start_drag() {
    let mut p = mounted(PanelState::default());
    assert!(p.on_drag_start(Point::new(0.0, 0.0), Button::Secondary).is_empty());
    assert!(!p.is_dragging());
}

#[test]
fn drag_on_unmounted_panel_is_noop() {
    let mut p = panel(PanelState::default());
    p.pre_first_render(&surface());
    assert!(p.on_drag_start(Point::new(0.0, 0.0), Button::Primary).is_empty());
}

#[test]
fn drag_end_without_session_is_noop() {
    let mut p = mounted(PanelState::default());
    assert!(p.on_drag_end(Point::new(1.0, 1.0)).is_empty());
}

// =============================================================
// toolbar actions
// =============================================================

#[test]
fn toggle_lock_persists_and_rerenders() {
    let mut p = mounted(PanelState::default());
    assert_eq!(p.toggle_lock(), vec![Action::Persist(PanelPatch::locked(true)), Action::RenderNeeded]);
    assert!(p.state().locked);
    assert_eq!(p.toggle_lock(), vec![Action::Persist(PanelPatch::locked(false)), Action::RenderNeeded]);
}

#[test]
fn toggle_expanded_respects_support_flag() {
    let mut p = mounted(PanelState::default());
    assert_eq!(p.toggle_expanded(), vec![Action::Persist(PanelPatch::expanded(false)), Action::RenderNeeded]);
    assert!(!p.floating_state().is_expanded);

    let mut config = PanelConfig::floating("fixed");
    config.supports_expand = false;
    let mut fixed = FloatingPanel::new(config, PanelState::default());
    assert!(fixed.toggle_expanded().is_empty());
}

#[test]
fn reset_position_recenters_after_drag() {
    let mut p = mounted(PanelState::default());
    p.on_drag_start(Point::new(0.0, 0.0), Button::Primary);
    p.on_drag_end(Point::new(-300.0, -300.0));
    assert!(!p.state().centered);

    let actions = p.reset_position(&surface());
    let expected = Position::new(640.0, 400.0);
    assert_eq!(
        actions,
        vec![
            Action::Persist(PanelPatch::centered(true)),
            Action::ToggleClass { class: "dsp-fui-resetting".into(), on: true },
            Action::MoveTo(expected),
            Action::Persist(PanelPatch::position(expected)),
            Action::RenderNeeded,
            Action::ClearClassAfter { class: "dsp-fui-resetting".into(), ms: 400 },
        ]
    );
    assert!(p.state().centered);
}

#[test]
fn reset_position_on_unmounted_panel_is_noop() {
    let mut p = panel(PanelState::default());
    assert!(p.reset_position(&surface()).is_empty());
}

// =============================================================
// close
// =============================================================

#[test]
fn close_detaches_listeners_and_unmounts() {
    let mut p = mounted(PanelState { locked: true, ..PanelState::default() });
    let actions = p.close();
    assert_eq!(actions, vec![Action::UnlistenResize]);
    assert!(!p.is_mounted());
    assert!(p.on_resize().is_empty());
}

#[test]
fn close_mid_drag_detaches_pointer_listeners() {
    let mut p = mounted(PanelState::default());
    p.on_drag_start(Point::new(0.0, 0.0), Button::Primary);
    assert_eq!(p.close(), vec![Action::UnlistenPointer]);
    assert!(!p.is_dragging());
}
