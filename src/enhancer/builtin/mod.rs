//! Enhancers shipped with the client, assembled from configuration.

pub mod emote;
pub mod mention;
pub mod slash;

use crate::model::config::AppConfig;
use crate::model::mode::InputMode;

use super::Registry;
use emote::Emotes;
use mention::Mentions;
use slash::SlashCommands;

pub const KNOWN_IDS: [&str; 3] = [slash::ID, mention::ID, emote::ID];

/// Build the registry for `mode`, in the priority order given by
/// `composer.enhancers`. Restricted mode keeps only the allow-listed ids.
pub fn registry_for(config: &AppConfig, mode: InputMode) -> Registry {
    let limit = config.composer.max_candidates;
    let mut registry = Registry::new();

    for id in &config.composer.enhancers {
        if mode == InputMode::Restricted && !config.restricted.enhancers.contains(id) {
            continue;
        }

        match id.as_str() {
            slash::ID => registry.push(SlashCommands::new(config.commands.clone(), limit)),
            mention::ID => registry.push(Mentions::new(config.mentions.users.clone(), limit)),
            emote::ID => registry.push(Emotes::new(
                config.emotes.clone(),
                config.composer.emote_min_query,
                limit,
            )),
            other => tracing::warn!("unknown enhancer id in config: {other}"),
        }
    }

    tracing::info!(mode = mode.label(), enhancers = ?registry.ids(), "enhancers registered");
    registry
}
