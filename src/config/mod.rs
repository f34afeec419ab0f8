use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::dispatcher::Variant;
use crate::error::{PaletteError, Result};
use crate::protocol::{ActionKind, ROOT_ELEMENT_ID};

/// Default bridge port (must match the extension's bridge URL).
pub const DEFAULT_BRIDGE_PORT: u16 = 19322;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub palette: PaletteConfig,

    #[serde(default)]
    pub pages: PagesConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Loopback port the bridge listens on
    #[serde(default = "default_bridge_port")]
    pub port: u16,

    /// Fixed session token. A fresh one is generated per `serve` when unset.
    pub token: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: default_bridge_port(),
            token: None,
        }
    }
}

fn default_bridge_port() -> u16 {
    DEFAULT_BRIDGE_PORT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteConfig {
    #[serde(default)]
    pub variant: Variant,

    /// Stylesheet injected before the script, relative to the extension root
    #[serde(default = "default_stylesheet")]
    pub stylesheet: String,

    /// Script bundle that mounts the palette
    #[serde(default = "default_script")]
    pub script: String,

    /// Id the palette mounts its root at and the presence check looks for
    #[serde(default = "default_root_element_id")]
    pub root_element_id: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            stylesheet: default_stylesheet(),
            script: default_script(),
            root_element_id: default_root_element_id(),
        }
    }
}

fn default_stylesheet() -> String {
    "dist/app.css".to_string()
}

fn default_script() -> String {
    "dist/app.js".to_string()
}

fn default_root_element_id() -> String {
    ROOT_ELEMENT_ID.to_string()
}

/// Internal browser pages opened by the fixed-page actions.
/// Chromium forks use their own scheme (`brave://`, `edge://`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagesConfig {
    pub clear_history: String,
    pub downloads: String,
    pub extensions: String,
    pub history: String,
    pub settings: String,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self::for_scheme("chrome")
    }
}

impl PagesConfig {
    pub fn for_scheme(scheme: &str) -> Self {
        Self {
            clear_history: format!("{}://settings/clearBrowserData", scheme),
            downloads: format!("{}://downloads", scheme),
            extensions: format!("{}://extensions", scheme),
            history: format!("{}://history", scheme),
            settings: format!("{}://settings", scheme),
        }
    }

    pub fn url_for(&self, kind: ActionKind) -> Option<&str> {
        match kind {
            ActionKind::ClearHistory => Some(&self.clear_history),
            ActionKind::OpenDownloads => Some(&self.downloads),
            ActionKind::OpenExtensions => Some(&self.extensions),
            ActionKind::OpenHistory => Some(&self.history),
            ActionKind::OpenSettings => Some(&self.settings),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Web search URL used for incognito searches; `{query}` is replaced
    #[serde(default = "default_incognito_url")]
    pub incognito_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            incognito_url: default_incognito_url(),
        }
    }
}

fn default_incognito_url() -> String {
    "https://google.com/search?q={query}".to_string()
}

impl Config {
    /// Load configuration from all sources (file, env, defaults)
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load with an explicit config file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            // COMMAND_PALETTE_BRIDGE__PORT=19400 -> bridge.port
            .merge(Env::prefixed("COMMAND_PALETTE_").split("__"))
            .extract()
            .map_err(|e| PaletteError::ConfigError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("command-palette")
            .join("config.toml")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| PaletteError::ConfigError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !self.search.incognito_url.contains("{query}") {
            return Err(PaletteError::ConfigError(
                "search.incognito_url must contain a {query} placeholder".to_string(),
            ));
        }
        if self.palette.root_element_id.trim().is_empty() {
            return Err(PaletteError::ConfigError(
                "palette.root_element_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Read a value by dotted key, as shown by `config get`.
    pub fn get_key(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "bridge.port" => Some(self.bridge.port.to_string()),
            "bridge.token" => self.bridge.token.clone(),
            "palette.variant" => Some(self.palette.variant.to_string()),
            "palette.stylesheet" => Some(self.palette.stylesheet.clone()),
            "palette.script" => Some(self.palette.script.clone()),
            "palette.root_element_id" => Some(self.palette.root_element_id.clone()),
            "pages.clear_history" => Some(self.pages.clear_history.clone()),
            "pages.downloads" => Some(self.pages.downloads.clone()),
            "pages.extensions" => Some(self.pages.extensions.clone()),
            "pages.history" => Some(self.pages.history.clone()),
            "pages.settings" => Some(self.pages.settings.clone()),
            "search.incognito_url" => Some(self.search.incognito_url.clone()),
            _ => {
                return Err(PaletteError::ConfigError(format!(
                    "Unknown config key: {}",
                    key
                )))
            }
        };
        Ok(value)
    }

    /// Set a value by dotted key, as used by `config set`.
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "bridge.port" => {
                self.bridge.port = value.parse().map_err(|_| {
                    PaletteError::ConfigError("bridge.port must be a port number".to_string())
                })?
            }
            "bridge.token" => self.bridge.token = Some(value.to_string()),
            "palette.variant" => {
                self.palette.variant = value.parse().map_err(PaletteError::ConfigError)?
            }
            "palette.stylesheet" => self.palette.stylesheet = value.to_string(),
            "palette.script" => self.palette.script = value.to_string(),
            "palette.root_element_id" => self.palette.root_element_id = value.to_string(),
            "pages.scheme" => self.pages = PagesConfig::for_scheme(value),
            "pages.clear_history" => self.pages.clear_history = value.to_string(),
            "pages.downloads" => self.pages.downloads = value.to_string(),
            "pages.extensions" => self.pages.extensions = value.to_string(),
            "pages.history" => self.pages.history = value.to_string(),
            "pages.settings" => self.pages.settings = value.to_string(),
            "search.incognito_url" => self.search.incognito_url = value.to_string(),
            _ => {
                return Err(PaletteError::ConfigError(format!(
                    "Unknown config key: {}",
                    key
                )))
            }
        }
        self.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_pages_are_chrome_internal() {
        let pages = PagesConfig::default();
        assert_eq!(pages.clear_history, "chrome://settings/clearBrowserData");
        assert_eq!(pages.url_for(ActionKind::OpenDownloads), Some("chrome://downloads"));
        assert_eq!(pages.url_for(ActionKind::OpenTab), None);
    }

    #[test]
    fn pages_scheme_switches_every_page() {
        let mut config = Config::default();
        config.set_key("pages.scheme", "brave").unwrap();
        assert_eq!(config.pages.history, "brave://history");
        assert_eq!(config.pages.clear_history, "brave://settings/clearBrowserData");
    }

    #[test]
    fn set_key_rejects_bad_values() {
        let mut config = Config::default();
        assert!(matches!(
            config.set_key("bridge.port", "nope"),
            Err(PaletteError::ConfigError(_))
        ));
        assert!(matches!(
            config.set_key("palette.variant", "tiny"),
            Err(PaletteError::ConfigError(_))
        ));
        assert!(matches!(
            config.set_key("search.incognito_url", "https://example.com"),
            Err(PaletteError::ConfigError(_))
        ));
        assert!(matches!(
            config.get_key("missing.key"),
            Err(PaletteError::ConfigError(_))
        ));
    }

    #[test]
    #[serial]
    fn load_merges_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[palette]\nvariant = \"compact\"\n\n[bridge]\nport = 20000\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.palette.variant, Variant::Compact);
        assert_eq!(config.bridge.port, 20000);
        assert_eq!(config.palette.script, "dist/app.js");
    }

    #[test]
    #[serial]
    fn load_applies_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        std::env::set_var("COMMAND_PALETTE_BRIDGE__PORT", "20111");
        let config = Config::load_from(&path);
        std::env::remove_var("COMMAND_PALETTE_BRIDGE__PORT");

        assert_eq!(config.unwrap().bridge.port, 20111);
    }

    #[test]
    #[serial]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set_key("pages.scheme", "edge").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.pages.settings, "edge://settings");
    }
}
