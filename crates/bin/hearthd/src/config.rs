//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `hearth.toml` in the working directory (override the path with
//! `HEARTH_CONFIG`). Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Expire service settings.
    pub expire: ExpireConfig,
    /// Demo traffic settings.
    pub demo: DemoConfig,
    /// Items seeded into the registry at startup.
    pub items: Vec<ItemConfig>,
    /// Thing status triggers installed at startup.
    pub triggers: Vec<TriggerConfig>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Expire service toggle.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExpireConfig {
    /// Run the expire manager.
    pub enabled: bool,
}

/// Demo traffic toggle.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Seed a demo switch and turn it on at startup.
    pub enabled: bool,
}

/// One item to register at startup.
#[derive(Debug, Deserialize)]
pub struct ItemConfig {
    /// Item name as it appears in topics.
    pub name: String,
    /// Item kind (e.g. `Switch`, `Number`, `Group:Switch`).
    pub kind: String,
    /// Optional human-readable label.
    pub label: Option<String>,
    /// Optional expire metadata (e.g. `10m,command=OFF`).
    pub expire: Option<String>,
}

/// One thing status trigger to install at startup.
#[derive(Debug, Deserialize)]
pub struct TriggerConfig {
    /// Trigger module id, unique among triggers.
    pub id: String,
    /// Whether to fire on every status report or only on changes.
    pub kind: TriggerKind,
    /// Thing selector; `*` and `?` wildcards are allowed.
    pub thing_uid: String,
    /// Only fire when the (new) status has this name.
    pub status: Option<String>,
    /// Only fire when the previous status has this name (change triggers).
    pub previous_status: Option<String>,
}

/// Trigger flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Update,
    Change,
}

impl Config {
    /// Load configuration from `hearth.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// loaded values fail validation.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("HEARTH_CONFIG").unwrap_or_else(|_| "hearth.toml".to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HEARTH_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut item_names = std::collections::HashSet::new();
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "item name must not be empty".to_string(),
                ));
            }
            if !item_names.insert(item.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate item name `{}`",
                    item.name
                )));
            }
        }
        let mut trigger_ids = std::collections::HashSet::new();
        for trigger in &self.triggers {
            if trigger.id.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "trigger id must not be empty".to_string(),
                ));
            }
            if !trigger_ids.insert(trigger.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate trigger id `{}`",
                    trigger.id
                )));
            }
            if trigger.thing_uid.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "trigger `{}` needs a thing_uid",
                    trigger.id
                )));
            }
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hearthd=info,hearth_app=info,hearth_domain=info".to_string(),
        }
    }
}

impl Default for ExpireConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
