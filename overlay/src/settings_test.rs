use std::collections::HashSet;

use super::*;
use crate::store::MemoryStore;

#[test]
fn keys_are_unique() {
    let defs = registry();
    let keys: HashSet<&str> = defs.iter().map(|d| d.key).collect();
    assert_eq!(keys.len(), defs.len());
}

#[test]
fn chrome_settings_are_per_user_and_negotiation_is_shared() {
    assert_eq!(lookup("metaCurrencyLocked").map(|d| d.scope), Some(Scope::Client));
    assert_eq!(lookup("negotiationCentered").map(|d| d.scope), Some(Scope::Client));
    assert_eq!(lookup(NEGOTIATION_VISIBLE_KEY).map(|d| d.scope), Some(Scope::World));
    assert_eq!(lookup(NEGOTIATION_STATE_KEY).map(|d| d.scope), Some(Scope::World));
}

#[test]
fn negotiation_has_no_expanded_setting() {
    assert!(lookup("negotiationExpanded").is_none());
    assert!(lookup("metaCurrencyExpanded").is_some());
}

#[test]
fn flag_falls_back_to_registered_default() {
    let settings = MemoryStore::new();
    assert!(flag(&settings, "dsp", "floatingNavTabs"));
    assert!(!flag(&settings, "dsp", "parallaxHeaderArt"));
    assert!(!flag(&settings, "dsp", "notRegistered"));
}

#[tokio::test]
async fn seed_skips_existing_values() {
    let settings = MemoryStore::new();
    settings.set(Scope::Client, "dsp", "improvedChat", json!(false)).await.expect("seed");
    let written = seed_defaults(&settings, "dsp").await.expect("seed defaults");
    assert_eq!(written, registry().len() - 1);
    assert!(!flag(&settings, "dsp", "improvedChat"));
    assert_eq!(seed_defaults(&settings, "dsp").await.expect("reseed"), 0);
}

#[tokio::test]
async fn reset_restores_only_the_group() {
    let settings = MemoryStore::new();
    settings.set(Scope::World, "dsp", "heroHeaderImage", json!("art.webp")).await.expect("seed");
    settings.set(Scope::Client, "dsp", "improvedChat", json!(false)).await.expect("seed");

    let written = reset_defaults(&settings, "dsp", SettingGroup::Headers).await.expect("reset");
    assert_eq!(written, 4);
    assert_eq!(settings.get(Scope::World, "dsp", "heroHeaderImage"), Some(json!("")));
    assert_eq!(settings.get(Scope::Client, "dsp", "improvedChat"), Some(json!(false)));
}

#[tokio::test]
async fn reset_reports_failure_after_attempting_all() {
    let settings = MemoryStore::new();
    settings.fail_writes(true);
    let err = reset_defaults(&settings, "dsp", SettingGroup::Interface).await.expect_err("fails");
    assert!(matches!(err, StoreError::Write { ref key, .. } if key == "floatingNavTabs"));
}

#[test]
fn negotiation_default_decodes_to_default_state() {
    let def = lookup(NEGOTIATION_STATE_KEY).expect("registered");
    let state: NegotiationState = serde_json::from_value(def.default).expect("decodes");
    assert_eq!(state, NegotiationState::default());
}
