//! Configuration management for aichat.
//!
//! Loads configuration from ${AICHAT_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::providers::Provider;

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
/// To update, run `cargo run -p xtask -- update-default-config`.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Merges user config values into the default template.
///
/// New comments and sections from the template stay present while the
/// user's customized values are preserved.
fn merge_with_template(user_config: &str) -> Result<String> {
    use toml_edit::DocumentMut;

    let mut doc: DocumentMut = default_config_template()
        .parse()
        .context("Failed to parse default config template")?;

    let user_doc: DocumentMut = user_config.parse().context("Failed to parse user config")?;

    merge_items(doc.as_table_mut(), user_doc.as_table());

    Ok(doc.to_string())
}

/// Recursively merges items from source table into target table.
fn merge_items(target: &mut toml_edit::Table, source: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in source {
        match value {
            Item::Value(v) => {
                target[key] = Item::Value(v.clone());
            }
            Item::Table(src_table) => {
                if let Some(Item::Table(target_table)) = target.get_mut(key) {
                    merge_items(target_table, src_table);
                } else {
                    target[key] = Item::Table(src_table.clone());
                }
            }
            Item::ArrayOfTables(src_arr) => {
                target[key] = Item::ArrayOfTables(src_arr.clone());
            }
            Item::None => {}
        }
    }
}

pub mod paths {
    //! Path resolution for aichat configuration and data directories.
    //!
    //! AICHAT_HOME resolution order:
    //! 1. AICHAT_HOME environment variable (if set)
    //! 2. ~/.config/aichat (default)
    //! 3. ./.aichat when no home directory can be determined

    use std::path::PathBuf;

    /// Returns the aichat home directory.
    pub fn aichat_home() -> PathBuf {
        if let Ok(home) = std::env::var("AICHAT_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".aichat"),
            |h| h.join(".config").join("aichat"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        aichat_home().join("config.toml")
    }

    /// Returns the directory for rolling log files.
    pub fn logs_dir() -> PathBuf {
        aichat_home().join("logs")
    }
}

/// Stream consumption settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Process an unterminated final line when the stream ends.
    pub flush_trailing_fragment: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `AICHAT_LOG` is unset
    pub level: String,
    /// Write to daily files under `$AICHAT_HOME/logs` instead of stderr
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: false,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub base_url: String,

    /// Provider sent with every request
    pub provider: Provider,

    /// Default language tag for code reviews
    pub language: String,

    /// Whole-request timeout in seconds (0 disables)
    pub request_timeout_secs: u32,

    /// Connection timeout in seconds (0 disables)
    pub connect_timeout_secs: u32,

    /// Placeholder text path, relative to `base_url`
    pub placeholder_path: String,

    #[serde(default)]
    pub stream: StreamConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            provider: Provider::default(),
            language: Self::DEFAULT_LANGUAGE.to_string(),
            request_timeout_secs: 0,
            connect_timeout_secs: Self::DEFAULT_CONNECT_TIMEOUT_SECS,
            placeholder_path: Self::DEFAULT_PLACEHOLDER_PATH.to_string(),
            stream: StreamConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    const DEFAULT_BASE_URL: &str = "http://localhost:8080";
    const DEFAULT_LANGUAGE: &str = "java";
    const DEFAULT_CONNECT_TIMEOUT_SECS: u32 = 10;
    const DEFAULT_PLACEHOLDER_PATH: &str = "code-review-placeholder.txt";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the base URL with precedence: override > config > default.
    ///
    /// The CLI fills the override from `--base-url` or `AICHAT_BASE_URL`.
    ///
    /// # Errors
    /// Returns an error if the winning value is not a valid URL.
    pub fn effective_base_url(&self, base_url_override: Option<&str>) -> Result<url::Url> {
        let candidates = [base_url_override, Some(self.base_url.as_str())];

        let raw = candidates
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or(Self::DEFAULT_BASE_URL);

        url::Url::parse(raw).with_context(|| format!("Invalid base URL: {raw}"))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        secs_to_duration(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        secs_to_duration(self.connect_timeout_secs)
    }

    /// Saves only the provider field to a specific config file path.
    ///
    /// Creates the file with default template if it doesn't exist.
    /// If file exists, merges user values into the latest template.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or written.
    pub fn save_provider_to(path: &Path, provider: Provider) -> Result<()> {
        use toml_edit::{DocumentMut, value};

        let contents = if path.exists() {
            let user_config = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            merge_with_template(&user_config)?
        } else {
            default_config_template().to_string()
        };

        let mut doc: DocumentMut = contents
            .parse()
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        doc["provider"] = value(provider.id());

        Self::write_config(path, &doc.to_string())
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// Used by `xtask update-default-config` to keep `default_config.toml`
    /// in sync with `Config::default()`. Comments come from the embedded
    /// template; values come from the defaults.
    ///
    /// # Errors
    /// Returns an error if serialization or template parsing fails.
    pub fn generate() -> Result<String> {
        use toml_edit::DocumentMut;

        let config = Config::default();
        let generated_toml =
            toml::to_string(&config).context("Failed to serialize default config to TOML")?;

        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;

        let generated_doc: DocumentMut = generated_toml
            .parse()
            .context("Failed to parse generated config")?;

        merge_items(doc.as_table_mut(), generated_doc.as_table());

        Ok(doc.to_string())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to move {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

fn secs_to_duration(secs: u32) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(u64::from(secs)))
}
