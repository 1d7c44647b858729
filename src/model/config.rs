use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::enhancer::DetectionPolicy;
use crate::enhancer::builtin::KNOWN_IDS;
use crate::enhancer::builtin::emote::Emote;
use crate::enhancer::builtin::slash::CommandSpec;

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown enhancer `{0}` (expected one of: slash, mention, emote)")]
    UnknownEnhancer(String),
    #[error("composer.menu_rows must be at least 1")]
    NoMenuRows,
    #[error("composer.max_candidates must be at least 1")]
    NoCandidates,
    #[error("duplicate command `/{0}`")]
    DuplicateCommand(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub composer: ComposerConfig,
    pub restricted: RestrictedConfig,
    pub mentions: MentionsConfig,
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
    #[serde(default)]
    pub emotes: Vec<Emote>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub nick: String,
    pub max_transcript: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComposerConfig {
    /// Enhancer ids in priority order.
    pub enhancers: Vec<String>,
    pub detect_on_caret_move: bool,
    pub max_candidates: usize,
    pub menu_rows: usize,
    pub emote_min_query: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestrictedConfig {
    /// Enhancers kept while restricted input mode is on.
    pub enhancers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MentionsConfig {
    pub users: Vec<String>,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        let user = Self::user_config_path();
        Self::load_layered(user.as_deref())
    }

    /// Built-in defaults only.
    pub fn defaults() -> Result<Self> {
        Self::load_layered(None)
    }

    /// Defaults with the file at `user` (if it exists) merged over them.
    pub fn load_layered(user: Option<&Path>) -> Result<Self> {
        let mut base: toml::Table = toml::from_str(DEFAULTS)?;

        if let Some(path) = user
            && path.exists()
        {
            let user_str = fs::read_to_string(path)?;
            let overlay: toml::Table = toml::from_str(&user_str)?;
            merge_tables(&mut base, overlay);
            tracing::info!("loaded user config from {}", path.display());
        }

        let config: AppConfig = toml::Value::Table(base).try_into()?;
        config.validate()?;
        Ok(config)
    }

    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "relay")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn detection_policy(&self) -> DetectionPolicy {
        DetectionPolicy {
            on_caret_move: self.composer.detect_on_caret_move,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ids = self
            .composer
            .enhancers
            .iter()
            .chain(&self.restricted.enhancers);
        for id in ids {
            if !KNOWN_IDS.contains(&id.as_str()) {
                return Err(ConfigError::UnknownEnhancer(id.clone()));
            }
        }

        if self.composer.menu_rows == 0 {
            return Err(ConfigError::NoMenuRows);
        }

        if self.composer.max_candidates == 0 {
            return Err(ConfigError::NoCandidates);
        }

        for (idx, cmd) in self.commands.iter().enumerate() {
            if self.commands[..idx].iter().any(|c| c.name == cmd.name) {
                return Err(ConfigError::DuplicateCommand(cmd.name.clone()));
            }
        }

        Ok(())
    }
}

/// Merge `overlay` into `base`. Tables merge key by key; every other value
/// (arrays included) replaces the base value.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(overlay_table) => {
                if let Some(toml::Value::Table(base_table)) = base.get_mut(&key) {
                    merge_tables(base_table, overlay_table);
                } else {
                    base.insert(key, toml::Value::Table(overlay_table));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_user_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_parse() {
        let config = AppConfig::defaults().unwrap();
        assert_eq!(config.composer.enhancers, vec!["slash", "mention", "emote"]);
        assert!(config.commands.iter().any(|c| c.name == "help"));
        assert!(!config.mentions.users.is_empty());
        assert!(config.detection_policy().on_caret_move);
    }

    #[test]
    fn partial_user_config_merges_over_defaults() {
        let file = write_user_config(
            r#"
[general]
nick = "zed"

[composer]
menu_rows = 3
"#,
        );

        let config = AppConfig::load_layered(Some(file.path())).unwrap();
        assert_eq!(config.general.nick, "zed");
        assert_eq!(config.composer.menu_rows, 3);
        assert_eq!(config.composer.max_candidates, 50);
        assert!(!config.commands.is_empty());
    }

    #[test]
    fn arrays_replace_instead_of_appending() {
        let file = write_user_config(
            r#"
[mentions]
users = ["only"]
"#,
        );

        let config = AppConfig::load_layered(Some(file.path())).unwrap();
        assert_eq!(config.mentions.users, vec!["only"]);
    }

    #[test]
    fn missing_user_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_layered(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(config.general.nick, AppConfig::defaults().unwrap().general.nick);
    }

    #[test]
    fn rejects_unknown_enhancer() {
        let file = write_user_config(
            r#"
[composer]
enhancers = ["slash", "hashtag"]
"#,
        );

        let err = AppConfig::load_layered(Some(file.path())).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UnknownEnhancer("hashtag".to_string()))
        );
    }

    #[test]
    fn rejects_zero_candidate_cap() {
        let file = write_user_config(
            r#"
[composer]
max_candidates = 0
"#,
        );

        let err = AppConfig::load_layered(Some(file.path())).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::NoCandidates)
        );
    }

    #[test]
    fn rejects_malformed_toml() {
        let file = write_user_config("[composer\nmenu_rows = ");
        assert!(AppConfig::load_layered(Some(file.path())).is_err());
    }
}
