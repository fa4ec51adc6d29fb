//! Negotiation document and the rules for editing it.
//!
//! DESIGN
//! ======
//! One world-scoped `NegotiationState` is shared by every client. The GM
//! edits it; everyone else only reads it. Every setter here is a pure
//! in-memory mutation; persisting and broadcasting the result is the host
//! layer's job.
//!
//! A canonical vocabulary id may be active in at most one list at a time.
//! That is enforced when offering and adding entries, not by the storage
//! shape: a hand-edited document that violates it still loads.
//!
//! STORED FORM
//! ===========
//! Loading is lenient field by field. A value of the wrong type falls back
//! to its default, counters are clamped into range, an unknown attitude
//! reads as none and entries without an id are skipped, so one bad field
//! never costs the rest of the document. Entries are written with the
//! list's own flag name (`appealed` for motivations, `triggered` for
//! pitfalls).

#[cfg(test)]
#[path = "negotiation_test.rs"]
mod negotiation_test;

use serde::de::IgnoredAny;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{IMPRESSION_MAX, INTEREST_MAX, PATIENCE_MAX};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NegotiationError {
    #[error("unknown vocabulary entry: {0}")]
    UnknownEntry(String),
    #[error("entry already active: {0}")]
    AlreadyActive(String),
    #[error("no entry {id} in {list}")]
    NotFound { list: &'static str, id: String },
    #[error("custom entry label is empty")]
    EmptyLabel,
    #[error("unknown attitude: {0}")]
    UnknownAttitude(String),
    #[error("unknown counter: {0}")]
    UnknownField(String),
    #[error("unknown entry list: {0}")]
    UnknownList(String),
}

// =============================================================================
// ATTITUDE
// =============================================================================

/// Starting disposition of the NPC. Each carries default interest and patience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Attitude {
    Hostile,
    Suspicious,
    Neutral,
    Open,
    Friendly,
}

impl Attitude {
    pub const ALL: [Self; 5] = [Self::Hostile, Self::Suspicious, Self::Neutral, Self::Open, Self::Friendly];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Hostile => "hostile",
            Self::Suspicious => "suspicious",
            Self::Neutral => "neutral",
            Self::Open => "open",
            Self::Friendly => "friendly",
        }
    }

    /// # Errors
    ///
    /// Returns [`NegotiationError::UnknownAttitude`] for keys outside the table.
    pub fn parse(key: &str) -> Result<Self, NegotiationError> {
        Self::from_key(key).ok_or_else(|| NegotiationError::UnknownAttitude(key.to_owned()))
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key() == key)
    }

    #[must_use]
    pub fn interest(self) -> u8 {
        match self {
            Self::Hostile => 1,
            Self::Suspicious | Self::Neutral => 2,
            Self::Open | Self::Friendly => 3,
        }
    }

    #[must_use]
    pub fn patience(self) -> u8 {
        match self {
            Self::Hostile | Self::Suspicious => 2,
            Self::Neutral | Self::Open => 3,
            Self::Friendly => 4,
        }
    }
}

// =============================================================================
// COUNTERS
// =============================================================================

/// A bounded counter that the GM can reveal to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Counter {
    pub value: u8,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Interest,
    Patience,
    Impression,
}

impl Field {
    pub const ALL: [Self; 3] = [Self::Interest, Self::Patience, Self::Impression];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Interest => "interest",
            Self::Patience => "patience",
            Self::Impression => "impression",
        }
    }

    /// # Errors
    ///
    /// Returns [`NegotiationError::UnknownField`] for unknown keys.
    pub fn parse(key: &str) -> Result<Self, NegotiationError> {
        Self::ALL
            .into_iter()
            .find(|f| f.key() == key)
            .ok_or_else(|| NegotiationError::UnknownField(key.to_owned()))
    }

    #[must_use]
    pub fn max(self) -> u8 {
        match self {
            Self::Interest => INTEREST_MAX,
            Self::Patience => PATIENCE_MAX,
            Self::Impression => IMPRESSION_MAX,
        }
    }
}

// =============================================================================
// ENTRIES
// =============================================================================

/// Canonical motivation / pitfall identifiers.
pub const VOCABULARY: [&str; 12] = [
    "benevolence",
    "discovery",
    "freedom",
    "greed",
    "higher_authority",
    "justice",
    "legacy",
    "peace",
    "power",
    "protection",
    "revelry",
    "vengeance",
];

/// One motivation or pitfall.
///
/// `engaged` is "appealed to" for motivations and "triggered" for pitfalls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    pub id: String,
    pub custom: bool,
    pub label: Option<String>,
    pub discovered: bool,
    pub engaged: bool,
}

impl Entry {
    #[must_use]
    pub fn canonical(id: &str) -> Self {
        Self { id: id.to_owned(), ..Self::default() }
    }

    #[must_use]
    pub fn custom(label: &str) -> Self {
        Self {
            id: format!("custom-{}", Uuid::new_v4().simple()),
            custom: true,
            label: Some(label.to_owned()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryList {
    Motivations,
    Pitfalls,
}

impl EntryList {
    pub const ALL: [Self; 2] = [Self::Motivations, Self::Pitfalls];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Motivations => "motivations",
            Self::Pitfalls => "pitfalls",
        }
    }

    /// Name of the `engaged` flag for this list in templates.
    #[must_use]
    pub fn engaged_key(self) -> &'static str {
        match self {
            Self::Motivations => "appealed",
            Self::Pitfalls => "triggered",
        }
    }

    /// # Errors
    ///
    /// Returns [`NegotiationError::UnknownList`] for unknown keys.
    pub fn parse(key: &str) -> Result<Self, NegotiationError> {
        Self::ALL
            .into_iter()
            .find(|l| l.key() == key)
            .ok_or_else(|| NegotiationError::UnknownList(key.to_owned()))
    }
}

// =============================================================================
// STATE
// =============================================================================

/// The shared negotiation document. Missing or unreadable fields load as
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredState")]
pub struct NegotiationState {
    pub npc_name: String,
    pub attitude: Option<Attitude>,
    pub interest: Counter,
    pub patience: Counter,
    pub impression: Counter,
    #[serde(serialize_with = "serialize_motivations")]
    pub motivations: Vec<Entry>,
    #[serde(serialize_with = "serialize_pitfalls")]
    pub pitfalls: Vec<Entry>,
}

impl NegotiationState {
    /// The state after "end negotiation".
    #[must_use]
    pub fn ended() -> Self {
        Self::default()
    }

    pub fn set_npc_name(&mut self, name: &str) {
        name.trim().clone_into(&mut self.npc_name);
    }

    /// Select (or clear) the attitude. Selecting overwrites interest and
    /// patience with the attitude's defaults.
    pub fn set_attitude(&mut self, attitude: Option<Attitude>) {
        self.attitude = attitude;
        if let Some(a) = attitude {
            self.interest.value = a.interest();
            self.patience.value = a.patience();
        }
    }

    #[must_use]
    pub fn counter(&self, field: Field) -> &Counter {
        match field {
            Field::Interest => &self.interest,
            Field::Patience => &self.patience,
            Field::Impression => &self.impression,
        }
    }

    fn counter_mut(&mut self, field: Field) -> &mut Counter {
        match field {
            Field::Interest => &mut self.interest,
            Field::Patience => &mut self.patience,
            Field::Impression => &mut self.impression,
        }
    }

    /// Step a counter, clamped to `0..=field.max()`. Returns the new value.
    pub fn adjust(&mut self, field: Field, delta: i32) -> u8 {
        let counter = self.counter_mut(field);
        let next = i32::from(counter.value).saturating_add(delta).clamp(0, i32::from(field.max()));
        counter.value = u8::try_from(next).unwrap_or(field.max());
        counter.value
    }

    /// Restore the attitude default for interest / patience; impression and
    /// attitude-less counters reset to zero.
    pub fn reset_field(&mut self, field: Field) -> u8 {
        let value = match (field, self.attitude) {
            (Field::Interest, Some(a)) => a.interest(),
            (Field::Patience, Some(a)) => a.patience(),
            _ => 0,
        };
        self.counter_mut(field).value = value;
        value
    }

    /// Flip whether players can see a counter. Returns the new visibility.
    pub fn toggle_visible(&mut self, field: Field) -> bool {
        let counter = self.counter_mut(field);
        counter.visible = !counter.visible;
        counter.visible
    }

    #[must_use]
    pub fn entries(&self, list: EntryList) -> &[Entry] {
        match list {
            EntryList::Motivations => &self.motivations,
            EntryList::Pitfalls => &self.pitfalls,
        }
    }

    fn entries_mut(&mut self, list: EntryList) -> &mut Vec<Entry> {
        match list {
            EntryList::Motivations => &mut self.motivations,
            EntryList::Pitfalls => &mut self.pitfalls,
        }
    }

    /// Whether canonical `id` is active in either list.
    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.motivations
            .iter()
            .chain(&self.pitfalls)
            .any(|e| !e.custom && e.id == id)
    }

    /// Canonical ids that can still be added to either list.
    #[must_use]
    pub fn available(&self) -> Vec<&'static str> {
        VOCABULARY.into_iter().filter(|id| !self.is_active(id)).collect()
    }

    /// # Errors
    ///
    /// Fails for ids outside [`VOCABULARY`] and ids already active in either list.
    pub fn add_canonical(&mut self, list: EntryList, id: &str) -> Result<(), NegotiationError> {
        if !VOCABULARY.contains(&id) {
            return Err(NegotiationError::UnknownEntry(id.to_owned()));
        }
        if self.is_active(id) {
            return Err(NegotiationError::AlreadyActive(id.to_owned()));
        }
        self.entries_mut(list).push(Entry::canonical(id));
        Ok(())
    }

    /// Add a free-text entry and return its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::EmptyLabel`] for blank labels.
    pub fn add_custom(&mut self, list: EntryList, label: &str) -> Result<String, NegotiationError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(NegotiationError::EmptyLabel);
        }
        let entry = Entry::custom(label);
        let id = entry.id.clone();
        self.entries_mut(list).push(entry);
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns [`NegotiationError::NotFound`] if `id` is not in `list`.
    pub fn remove_entry(&mut self, list: EntryList, id: &str) -> Result<Entry, NegotiationError> {
        let entries = self.entries_mut(list);
        let index = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| NegotiationError::NotFound { list: list.key(), id: id.to_owned() })?;
        Ok(entries.remove(index))
    }

    /// Flip the player-visible "discovered" flag. Returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::NotFound`] if `id` is not in `list`.
    pub fn toggle_discovered(&mut self, list: EntryList, id: &str) -> Result<bool, NegotiationError> {
        let entry = self.entry_mut(list, id)?;
        entry.discovered = !entry.discovered;
        Ok(entry.discovered)
    }

    /// Flip the GM-only appealed / triggered flag. Returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::NotFound`] if `id` is not in `list`.
    pub fn toggle_engaged(&mut self, list: EntryList, id: &str) -> Result<bool, NegotiationError> {
        let entry = self.entry_mut(list, id)?;
        entry.engaged = !entry.engaged;
        Ok(entry.engaged)
    }

    fn entry_mut(&mut self, list: EntryList, id: &str) -> Result<&mut Entry, NegotiationError> {
        self.entries_mut(list)
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| NegotiationError::NotFound { list: list.key(), id: id.to_owned() })
    }
}

// =============================================================================
// STORED FORM
// =============================================================================

/// A stored value that either decodes as `T` or is ignored.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(T),
    Invalid(IgnoredAny),
}

impl<T> Default for Lenient<T> {
    fn default() -> Self {
        Self::Invalid(IgnoredAny)
    }
}

impl<T> Lenient<T> {
    fn valid(self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct StoredCounter {
    value: Lenient<i64>,
    visible: Lenient<bool>,
}

impl StoredCounter {
    fn into_counter(self, field: Field) -> Counter {
        let max = field.max();
        let value = self
            .value
            .valid()
            .map_or(0, |v| u8::try_from(v.clamp(0, i64::from(max))).unwrap_or(max));
        Counter { value, visible: self.visible.valid().unwrap_or(false) }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct StoredEntry {
    id: Lenient<String>,
    custom: Lenient<bool>,
    label: Lenient<String>,
    discovered: Lenient<bool>,
    #[serde(alias = "appealed", alias = "triggered")]
    engaged: Lenient<bool>,
}

impl StoredEntry {
    fn into_entry(self) -> Option<Entry> {
        let id = self.id.valid().filter(|id| !id.is_empty())?;
        Some(Entry {
            id,
            custom: self.custom.valid().unwrap_or(false),
            label: self.label.valid(),
            discovered: self.discovered.valid().unwrap_or(false),
            engaged: self.engaged.valid().unwrap_or(false),
        })
    }
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredState {
    npc_name: Lenient<String>,
    attitude: Lenient<String>,
    interest: Lenient<StoredCounter>,
    patience: Lenient<StoredCounter>,
    impression: Lenient<StoredCounter>,
    motivations: Lenient<Vec<Lenient<StoredEntry>>>,
    pitfalls: Lenient<Vec<Lenient<StoredEntry>>>,
}

fn stored_entries(raw: Lenient<Vec<Lenient<StoredEntry>>>) -> Vec<Entry> {
    raw.valid()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|e| e.valid().and_then(StoredEntry::into_entry))
        .collect()
}

impl From<StoredState> for NegotiationState {
    fn from(raw: StoredState) -> Self {
        let counter = |stored: Lenient<StoredCounter>, field: Field| stored.valid().unwrap_or_default().into_counter(field);
        Self {
            npc_name: raw.npc_name.valid().unwrap_or_default(),
            attitude: raw.attitude.valid().and_then(|key| Attitude::from_key(&key)),
            interest: counter(raw.interest, Field::Interest),
            patience: counter(raw.patience, Field::Patience),
            impression: counter(raw.impression, Field::Impression),
            motivations: stored_entries(raw.motivations),
            pitfalls: stored_entries(raw.pitfalls),
        }
    }
}

/// An entry as written, with the list's flag name.
struct StoredEntryRef<'a> {
    entry: &'a Entry,
    list: EntryList,
}

impl Serialize for StoredEntryRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("id", &self.entry.id)?;
        map.serialize_entry("custom", &self.entry.custom)?;
        map.serialize_entry("label", &self.entry.label)?;
        map.serialize_entry("discovered", &self.entry.discovered)?;
        map.serialize_entry(self.list.engaged_key(), &self.entry.engaged)?;
        map.end()
    }
}

fn serialize_entries<S: Serializer>(entries: &[Entry], list: EntryList, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(entries.iter().map(|entry| StoredEntryRef { entry, list }))
}

fn serialize_motivations<S: Serializer>(entries: &[Entry], serializer: S) -> Result<S::Ok, S::Error> {
    serialize_entries(entries, EntryList::Motivations, serializer)
}

fn serialize_pitfalls<S: Serializer>(entries: &[Entry], serializer: S) -> Result<S::Ok, S::Error> {
    serialize_entries(entries, EntryList::Pitfalls, serializer)
}
