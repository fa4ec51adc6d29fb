//! Floating panel engine for the tabletop overlay.
//!
//! This crate is host-independent: it owns the positioning, drag, lock and
//! recentering behavior of screen-anchored panels, plus the negotiation
//! state model. It performs no I/O. Input handlers return [`panel::Action`]s
//! and the host layer is responsible for executing them (persisting patches,
//! moving elements, binding listeners, re-rendering).
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`panel`] | The [`panel::FloatingPanel`] state machine and its [`panel::Action`]s |
//! | [`state`] | Persisted panel state, patches, storage keys, and panel configuration |
//! | [`bounds`] | Canvas bounds resolution and default placement |
//! | [`geometry`] | Points, positions, sizes and rectangles in screen pixels |
//! | [`input`] | Pointer buttons, keys and the transient drag session |
//! | [`negotiation`] | Shared negotiation document and its editing rules |
//! | [`popup`] | Mutually exclusive popup state for the negotiation tracker |
//! | [`consts`] | Shared numeric and CSS constants |

pub mod bounds;
pub mod consts;
pub mod geometry;
pub mod input;
pub mod negotiation;
pub mod panel;
pub mod popup;
pub mod state;
