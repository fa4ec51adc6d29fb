//! Hero tokens and malice at a glance, with GM adjustment buttons.

use panels::state::{PanelConfig, PanelKeys};
use serde_json::{Value, json};
use tracing::debug;

use super::{Outcome, PanelBehavior, require_gm};
use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::host::{Host, Scope};
use crate::settings::SHOW_PLAYER_MALICE;

pub const META_CURRENCY_ID: &str = "dsp-meta-currency";

/// Reason passed to the hero token pool when spending from the tracker.
const SPEND_REASON: &str = "generic";

pub struct MetaCurrencyTracker {
    config: PanelConfig,
    template: String,
    system_id: String,
}

impl MetaCurrencyTracker {
    pub fn new(overlay: &OverlayConfig) -> Self {
        let config = PanelConfig {
            keys: PanelKeys {
                position: "metaCurrencyPosition".to_owned(),
                locked: "metaCurrencyLocked".to_owned(),
                centered: "metaCurrencyCentered".to_owned(),
                expanded: Some("metaCurrencyExpanded".to_owned()),
            },
            drag_handle: ".dsp-mc-drag-handle".to_owned(),
            locked_class: "dsp-mc-locked".to_owned(),
            minimized_class: "dsp-mc-minimized".to_owned(),
            resetting_class: "dsp-mc-resetting".to_owned(),
            ..PanelConfig::floating(META_CURRENCY_ID)
        }
        .with_placement(overlay.panel_default_width, overlay.panel_offset_y, overlay.reset_transition_ms);

        Self {
            config,
            template: format!("modules/{}/templates/ui/meta-currency.hbs", overlay.module_id),
            system_id: overlay.system_id.clone(),
        }
    }

    /// Malice is shown during combat, to the GM always and to players only
    /// when the game system allows it.
    fn show_malice(&self, host: &Host) -> bool {
        let players_may_see = host
            .settings
            .get(Scope::World, &self.system_id, SHOW_PLAYER_MALICE)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        (players_may_see || host.world.is_gm()) && host.world.combat_active()
    }
}

#[async_trait::async_trait(?Send)]
impl PanelBehavior for MetaCurrencyTracker {
    fn config(&self) -> &PanelConfig {
        &self.config
    }

    fn template(&self) -> &str {
        &self.template
    }

    fn prepare_context(&self, host: &Host) -> Value {
        json!({
            "heroTokens": host.hero_tokens.as_ref().map_or(0, |t| t.value()),
            "heroTokensLabel": "DRAW_STEEL_PLUS.MetaCurrency.heroTokens",
            "malice": host.malice.as_ref().map_or(0, |m| m.value()),
            "maliceLabel": "DRAW_STEEL_PLUS.MetaCurrency.malice",
            "showMalice": self.show_malice(host),
            "isGM": host.world.is_gm(),
        })
    }

    async fn on_action(&mut self, host: &Host, action: &str, _payload: &Value) -> Result<Outcome, OverlayError> {
        match action {
            "giveToken" | "spendToken" | "resetTokens" => {
                require_gm(host, action)?;
                let Some(tokens) = &host.hero_tokens else {
                    debug!(action, "hero token pool not available");
                    return Ok(Outcome::Unchanged);
                };
                match action {
                    "giveToken" => tokens.give_token().await?,
                    "spendToken" => tokens.spend_token(SPEND_REASON).await?,
                    _ => tokens.reset_tokens().await?,
                }
            }
            "adjustMalice" | "resetMalice" => {
                require_gm(host, action)?;
                let Some(malice) = &host.malice else {
                    debug!(action, "malice pool not available");
                    return Ok(Outcome::Unchanged);
                };
                if action == "adjustMalice" {
                    malice.adjust_malice().await?;
                } else {
                    malice.reset_malice().await?;
                }
            }
            _ => {
                return Err(OverlayError::UnknownAction { panel: META_CURRENCY_ID.to_owned(), action: action.to_owned() });
            }
        }
        Ok(Outcome::Render)
    }
}
