//! Host integration for the floating panels.
//!
//! ARCHITECTURE
//! ============
//! `panels` decides *what* should happen; this crate makes it happen against
//! the tabletop host. The host is reached only through the collaborator
//! traits in [`host`], so the same controller drives the browser build
//! (`hydrate`), the in-memory sandbox and the tests.
//!
//! | Module | Role |
//! |--------|------|
//! | [`controller`] | Panel registry and the UI controller entry points |
//! | [`trackers`] | Concrete panels: meta-currency and negotiation trackers |
//! | [`store`] | Typed load/save accessors over the settings collaborator |
//! | [`sync`] | In-process session hub for the broadcast channel |
//! | [`settings`] | Registered module settings and their defaults |
//! | [`memory`] | In-memory collaborators for the sandbox and tests |
//! | [`host`] | Collaborator traits and the [`host::Host`] bundle |
//! | [`error`] | Error types and stable error codes |
//! | [`config`] | Environment-driven configuration |

pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod memory;
pub mod settings;
pub mod store;
pub mod sync;
pub mod trackers;
#[cfg(feature = "hydrate")]
pub mod web;
