use super::*;

// =============================================================
// Button
// =============================================================

#[test]
fn button_from_dom_maps_standard_codes() {
    assert_eq!(Button::from_dom(0), Some(Button::Primary));
    assert_eq!(Button::from_dom(1), Some(Button::Middle));
    assert_eq!(Button::from_dom(2), Some(Button::Secondary));
}

#[test]
fn button_from_dom_rejects_extra_buttons() {
    assert_eq!(Button::from_dom(3), None);
    assert_eq!(Button::from_dom(-1), None);
}

// =============================================================
// Key
// =============================================================

#[test]
fn key_escape_detection() {
    assert!(Key("Escape".into()).is_escape());
    assert!(!Key("Enter".into()).is_escape());
}

// =============================================================
// DragSession
// =============================================================

#[test]
fn drag_session_offsets_from_origin() {
    let session = DragSession::new(Point::new(10.0, 20.0), Position::new(300.0, 400.0));
    let pos = session.position_at(Point::new(25.0, 5.0));
    assert_eq!(pos, Position::new(285.0, 415.0));
}

#[test]
fn drag_session_ignores_intermediate_frames() {
    let session = DragSession::new(Point::new(0.0, 0.0), Position::new(0.0, 0.0));
    let _ = session.position_at(Point::new(0.3, 0.3));
    let _ = session.position_at(Point::new(0.6, 0.6));
    assert_eq!(session.position_at(Point::new(1.0, 1.0)), Position::new(1.0, 1.0));
}
