use crate::links::{LinkSettings, NewLinkFormat};
use anyhow::Context;
use log::warn;
use roster_core::{PEOPLE_PREFIX, PLAYERS_KEY};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = ".roster.json";
pub const APP_CONFIG_FILE: &str = ".obsidian/app.json";
pub const VAULT_ENV: &str = "ROSTER_VAULT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Only link targets under this folder are offered as people.
    pub people_prefix: String,
    /// Front-matter key holding the players list.
    pub property_key: String,
    pub links: LinkSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            people_prefix: PEOPLE_PREFIX.to_string(),
            property_key: PLAYERS_KEY.to_string(),
            links: LinkSettings::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    people_prefix: Option<String>,
    property_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AppConfigFile {
    use_markdown_links: Option<bool>,
    new_link_format: Option<NewLinkFormat>,
}

impl Settings {
    /// Defaults, overridden by `.roster.json` and the vault's link settings.
    pub fn load(vault_root: &Path) -> anyhow::Result<Self> {
        let mut settings = Self::default();

        let path = vault_root.join(SETTINGS_FILE);
        if path.exists() {
            let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
            let file: SettingsFile =
                serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
            if let Some(prefix) = file.people_prefix {
                settings.people_prefix = prefix;
            }
            if let Some(key) = file.property_key.filter(|key| !key.is_empty()) {
                settings.property_key = key;
            }
        }

        let path = vault_root.join(APP_CONFIG_FILE);
        if path.exists() {
            match load_app_config(&path) {
                Ok(app) => {
                    if let Some(markdown) = app.use_markdown_links {
                        settings.links.use_markdown_links = markdown;
                    }
                    if let Some(format) = app.new_link_format {
                        settings.links.new_link_format = format;
                    }
                }
                Err(err) => warn!("ignoring {}: {err:#}", path.display()),
            }
        }
        Ok(settings)
    }
}

fn load_app_config(path: &Path) -> anyhow::Result<AppConfigFile> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let config = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(config)
}

/// Vault root: the explicit flag, then `ROSTER_VAULT`, then the current
/// directory.
pub fn resolve_vault_root(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(VAULT_ENV) {
        return Ok(PathBuf::from(path));
    }
    std::env::current_dir().context("resolve current directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_give_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::load(dir.path()).expect("load");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.people_prefix, "People/");
        assert_eq!(settings.property_key, "players");
    }

    #[test]
    fn files_override_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"people_prefix":"Contacts/","property_key":"attendees"}"#,
        )
        .expect("write");
        fs::create_dir_all(dir.path().join(".obsidian")).expect("mkdir");
        fs::write(
            dir.path().join(APP_CONFIG_FILE),
            r#"{"useMarkdownLinks":true,"newLinkFormat":"relative","theme":"moonstone"}"#,
        )
        .expect("write");
        let settings = Settings::load(dir.path()).expect("load");
        assert_eq!(settings.people_prefix, "Contacts/");
        assert_eq!(settings.property_key, "attendees");
        assert!(settings.links.use_markdown_links);
        assert_eq!(settings.links.new_link_format, NewLinkFormat::Relative);
    }

    #[test]
    fn broken_app_config_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join(".obsidian")).expect("mkdir");
        fs::write(dir.path().join(APP_CONFIG_FILE), "{not json").expect("write");
        let settings = Settings::load(dir.path()).expect("load");
        assert_eq!(settings.links, LinkSettings::default());
    }

    #[test]
    fn broken_settings_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(SETTINGS_FILE), "[").expect("write");
        assert!(Settings::load(dir.path()).is_err());
    }
}
