use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use anyhow::{Context, Result};
use toml::Value;
use log::{debug, info};
use crate::display::{ColourConfig, ColourTheme};
use crate::source::drive::DEFAULT_API_BASE;
use crate::stats::WordOptions;
use crate::sweep::SweepConfig;

/// Configuration storage - section_name -> key -> value
pub type Configuration = HashMap<String, HashMap<String, String>>;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "DOCSTATS_CONFIG";

/// Environment variable holding the document API access token
pub const ACCESS_TOKEN_ENV: &str = "DOCSTATS_ACCESS_TOKEN";

/// Connection settings for the Drive document source
#[derive(Debug, Clone, PartialEq)]
pub struct DriveSettings {
    pub api_base: String,
    pub access_token: Option<String>,
}

/// Configuration manager
pub struct ConfigManager {
    config: Configuration,
    config_file_path: Option<PathBuf>,
    selected_section: Option<String>,
}

impl ConfigManager {
    /// Create a new ConfigManager from a Configuration (primarily for testing)
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config,
            config_file_path: None,
            selected_section: None,
        }
    }

    /// Load configuration using discovery hierarchy
    pub fn load() -> Result<Self> {
        debug!("Starting configuration discovery");

        for path in discover_config_files() {
            debug!("Attempting to load config from: {}", path.display());
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        info!("No configuration file found, using defaults");
        Ok(Self::from_config(Configuration::new()))
    }

    /// Load configuration from explicit file path
    pub fn load_from_file(path: PathBuf) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = parse_toml_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Loaded configuration from: {}", path.display());
        Ok(Self {
            config,
            config_file_path: Some(path),
            selected_section: None,
        })
    }

    /// File the configuration was read from, if any
    pub fn config_file_path(&self) -> Option<&PathBuf> {
        self.config_file_path.as_ref()
    }

    /// Get value from configuration with section fallback
    pub fn get_value(&self, section: &str, key: &str) -> Option<&String> {
        // Priority: selected_section -> specified section -> base
        if let Some(selected) = &self.selected_section {
            if let Some(value) = self.config.get(selected).and_then(|s| s.get(key)) {
                return Some(value);
            }
        }

        if let Some(value) = self.config.get(section).and_then(|s| s.get(key)) {
            return Some(value);
        }

        self.config.get("base").and_then(|s| s.get(key))
    }

    /// Select configuration section for --config-name
    pub fn select_section(&mut self, section: String) {
        debug!("Selecting configuration section: {}", section);
        self.selected_section = Some(section);
    }

    /// Get boolean value with type conversion
    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>> {
        match self.get_value(section, key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                _ => Err(anyhow::anyhow!("Invalid boolean value for {}.{}: {}", section, key, value)),
            },
            None => Ok(None),
        }
    }

    /// Get a numeric value with type conversion
    pub fn get_number<T>(&self, section: &str, key: &str) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get_value(section, key) {
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .with_context(|| format!("Invalid {}.{} value in config: {}", section, key, value)),
            None => Ok(None),
        }
    }

    /// Get log level value with type conversion
    pub fn get_log_level(&self, section: &str, key: &str) -> Result<Option<log::LevelFilter>> {
        match self.get_value(section, key) {
            Some(value) => Ok(Some(crate::logging::parse_log_level(value)?)),
            None => Ok(None),
        }
    }

    /// Get path value with type conversion
    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_value(section, key).map(|v| expand_home(v))
    }

    /// Word counting options from the `[words]` section
    pub fn get_word_options(&self) -> Result<WordOptions> {
        let mut options = WordOptions::default();

        if let Some(length) = self.get_number("words", "min-word-length")? {
            options.min_word_length = length;
        }
        if let Some(limit) = self.get_number("words", "top-words")? {
            options.top_limit = limit;
        }
        if let Some(frequency) = self.get_number("words", "min-frequency")? {
            options.min_frequency = frequency;
        }

        options.validate()
            .map_err(|e| anyhow::anyhow!("Word options validation failed: {}", e))?;
        Ok(options)
    }

    /// Get sweep configuration from config file
    pub fn get_sweep_config(&self) -> Result<SweepConfig> {
        let mut config = SweepConfig {
            words: self.get_word_options()?,
            ..SweepConfig::default()
        };

        if let Some(workers) = self.get_number("sweep", "max-workers")? {
            config.max_workers = Some(workers);
        }
        if let Some(rate) = self.get_number("sweep", "requests-per-second")? {
            config.requests_per_second = rate;
        }
        if let Some(query) = self.get_value("sweep", "query") {
            config.query = query.clone();
        }
        if let Some(window) = self.get_number("sweep", "window-days")? {
            config.window_days = window;
        }

        config.validate()
            .map_err(|e| anyhow::anyhow!("Sweep configuration validation failed: {}", e))?;
        Ok(config)
    }

    /// Statistics database location
    pub fn get_database_path(&self) -> PathBuf {
        self.get_path("base", "database").unwrap_or_else(default_database_path)
    }

    /// Drive connection settings; the token may also come from the environment
    pub fn get_drive_settings(&self) -> DriveSettings {
        let api_base = self
            .get_value("drive", "api-base")
            .cloned()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let access_token = env::var(ACCESS_TOKEN_ENV)
            .ok()
            .or_else(|| self.get_value("drive", "access-token").cloned())
            .filter(|t| !t.is_empty());

        DriveSettings { api_base, access_token }
    }

    /// Colour settings from the `[display]` section
    pub fn get_colour_config(&self) -> Result<ColourConfig> {
        let mut config = ColourConfig::default();

        if let Some(enabled) = self.get_bool("display", "color")? {
            config.enabled = enabled;
        }
        if let Some(respect) = self.get_bool("display", "respect-no-color")? {
            config.respect_no_color = respect;
        }
        if let Some(theme) = self.get_value("display", "theme") {
            config.theme = ColourTheme::from_name(theme)
                .ok_or_else(|| anyhow::anyhow!("Unknown theme '{}'. Valid themes: auto, light, dark", theme))?;
        }

        Ok(config)
    }
}

/// Default database location under the user's data directory
pub fn default_database_path() -> PathBuf {
    match dirs::data_dir() {
        Some(dir) => dir.join("docstats").join("stats.db"),
        None => PathBuf::from("./docstats.db"),
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Discover configuration files in order of precedence
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = env::var(CONFIG_ENV) {
        paths.push(PathBuf::from(env_path));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("docstats").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".docstats.toml"));
    }

    paths.push(PathBuf::from("./.docstats.toml"));

    debug!("Config discovery paths: {:?}", paths);
    paths
}

/// Parse TOML content to string-based configuration
pub fn parse_toml_config(content: &str) -> Result<Configuration> {
    let toml_value: Value = content.parse()
        .context("Failed to parse TOML content")?;

    let mut config = Configuration::new();

    if let Value::Table(table) = toml_value {
        flatten_toml_table(&table, String::new(), &mut config);
    }

    debug!("Parsed configuration sections: {:?}", config.keys().collect::<Vec<_>>());
    Ok(config)
}

/// Recursively flatten TOML tables into section.subsection format
fn flatten_toml_table(table: &toml::Table, prefix: String, config: &mut Configuration) {
    for (key, value) in table {
        let section_name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Table(subtable) if subtable.values().all(|v| !matches!(v, Value::Table(_))) => {
                let section_map = subtable
                    .iter()
                    .map(|(subkey, subvalue)| (subkey.clone(), toml_value_to_string(subvalue)))
                    .collect();
                config.insert(section_name, section_map);
            }
            Value::Table(subtable) => flatten_toml_table(subtable, section_name, config),
            _ => {
                // Top-level keys outside any table belong to [base]
                config
                    .entry("base".to_string())
                    .or_default()
                    .insert(key.clone(), toml_value_to_string(value));
            }
        }
    }
}

/// Convert TOML Value to string representation
fn toml_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(d) => d.to_string(),
        Value::Array(_) | Value::Table(_) => value.to_string(),
    }
}
