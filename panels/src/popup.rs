//! Which negotiation popup, if any, is open.
//!
//! One value per tracker instance, never persisted. Opening a popup replaces
//! whatever was open before, so two popups cannot be open at once.

#[cfg(test)]
#[path = "popup_test.rs"]
mod popup_test;

use crate::input::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Popup {
    #[default]
    None,
    Attitude,
    Motivations,
    Pitfalls,
    MotivationsAddList,
    PitfallsAddList,
}

impl Popup {
    const ALL: [Self; 6] = [
        Self::None,
        Self::Attitude,
        Self::Motivations,
        Self::Pitfalls,
        Self::MotivationsAddList,
        Self::PitfallsAddList,
    ];

    /// Identifier used by templates and action payloads.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Attitude => "attitude",
            Self::Motivations => "motivations",
            Self::Pitfalls => "pitfalls",
            Self::MotivationsAddList => "motivations-add",
            Self::PitfallsAddList => "pitfalls-add",
        }
    }

    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopupState {
    current: Popup,
}

impl PopupState {
    #[must_use]
    pub fn current(&self) -> Popup {
        self.current
    }

    #[must_use]
    pub fn is_open(&self, popup: Popup) -> bool {
        popup != Popup::None && self.current == popup
    }

    /// The only setter. Returns whether anything changed.
    pub fn set(&mut self, popup: Popup) -> bool {
        let changed = self.current != popup;
        self.current = popup;
        changed
    }

    /// Open `popup`, or close it if it is already the open one.
    pub fn toggle(&mut self, popup: Popup) -> bool {
        if self.current == popup {
            self.set(Popup::None)
        } else {
            self.set(popup)
        }
    }

    pub fn close(&mut self) -> bool {
        self.set(Popup::None)
    }

    /// A click landed somewhere in the document. Clicks on popup controls
    /// are handled by their own actions.
    pub fn on_outside_click(&mut self, inside_popup_control: bool) -> bool {
        if inside_popup_control {
            return false;
        }
        self.close()
    }

    pub fn on_key(&mut self, key: &Key) -> bool {
        if key.is_escape() { self.close() } else { false }
    }
}
