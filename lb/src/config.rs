//! LessonBot configuration types and loading
//!
//! Settings come from a YAML file; secrets (bot token, sheet id, service
//! account key) are read from environment variables named in the config.

use eyre::{Context, Result};
use planstore::{ServiceAccountKey, SheetsOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main LessonBot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[serde(rename = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Telegram Bot API configuration
    pub telegram: TelegramConfig,

    /// Google Sheets configuration
    pub sheets: SheetsConfig,

    /// Which row store backs the bot
    pub store: StoreConfig,

    /// Keep-alive HTTP endpoint
    pub keepalive: KeepaliveConfig,
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the environment variables the configured store needs are
    /// set. Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        self.validate_with(env_lookup)
    }

    /// Validate against a custom environment lookup
    pub fn validate_with<F: Fn(&str) -> Option<String>>(&self, env: F) -> Result<()> {
        if self.store.backend == StoreBackend::Sheets {
            if env(&self.sheets.sheet_id_env).is_none() {
                return Err(eyre::eyre!(
                    "Spreadsheet id not found. Set the {} environment variable.",
                    self.sheets.sheet_id_env
                ));
            }
            self.sheets.credentials_with(&env)?;
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .lessonbot.yml
        let local_config = PathBuf::from(".lessonbot.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/lessonbot/lessonbot.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("lessonbot").join("lessonbot.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Telegram Bot API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Environment variable containing the bot token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// API base URL
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Long-poll timeout in seconds
    #[serde(rename = "poll-timeout-secs")]
    pub poll_timeout_secs: u64,

    /// Request timeout in milliseconds (added on top of the long poll)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token_env: "BOT_TOKEN".to_string(),
            api_url: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
            timeout_ms: 10_000,
        }
    }
}

/// Telegram settings with the token looked up
#[derive(Clone)]
pub struct ResolvedTelegramConfig {
    pub token: String,
    pub api_url: String,
    pub poll_timeout_secs: u64,
    pub timeout_ms: u64,
}

impl std::fmt::Debug for ResolvedTelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedTelegramConfig")
            .field("api_url", &self.api_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("timeout_ms", &self.timeout_ms)
            .finish_non_exhaustive()
    }
}

impl TelegramConfig {
    /// Look up the bot token from the environment
    pub fn resolve(&self) -> Result<ResolvedTelegramConfig> {
        self.resolve_with(env_lookup)
    }

    /// Look up the bot token with a custom environment lookup
    pub fn resolve_with<F: Fn(&str) -> Option<String>>(&self, env: F) -> Result<ResolvedTelegramConfig> {
        let token = env(&self.token_env).ok_or_else(|| {
            eyre::eyre!(
                "Bot token not found. Set the {} environment variable.",
                self.token_env
            )
        })?;

        Ok(ResolvedTelegramConfig {
            token,
            api_url: self.api_url.clone(),
            poll_timeout_secs: self.poll_timeout_secs,
            timeout_ms: self.timeout_ms,
        })
    }
}

/// Google Sheets configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    /// Environment variable containing the spreadsheet id
    #[serde(rename = "sheet-id-env")]
    pub sheet_id_env: String,

    /// Environment variable holding the service-account key as inline JSON
    #[serde(rename = "credentials-json-env")]
    pub credentials_json_env: String,

    /// Environment variable holding the path of the service-account key file
    #[serde(rename = "credentials-file-env")]
    pub credentials_file_env: String,

    /// Key file used when neither environment variable is set
    #[serde(rename = "credentials-file")]
    pub credentials_file: PathBuf,

    /// Worksheet (tab) name
    pub worksheet: String,

    /// API base URL
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            sheet_id_env: "GOOGLE_SHEET_ID".to_string(),
            credentials_json_env: "GOOGLE_CREDENTIALS_JSON".to_string(),
            credentials_file_env: "GOOGLE_CREDENTIALS_FILE".to_string(),
            credentials_file: PathBuf::from("service_account.json"),
            worksheet: planstore::sheets::DEFAULT_WORKSHEET.to_string(),
            api_url: planstore::sheets::DEFAULT_API_URL.to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl SheetsConfig {
    /// Connection options with the spreadsheet id looked up
    pub fn options_with<F: Fn(&str) -> Option<String>>(&self, env: F) -> Result<SheetsOptions> {
        let sheet_id = env(&self.sheet_id_env).ok_or_else(|| {
            eyre::eyre!(
                "Spreadsheet id not found. Set the {} environment variable.",
                self.sheet_id_env
            )
        })?;

        let mut options = SheetsOptions::new(sheet_id);
        options.worksheet = self.worksheet.clone();
        options.api_url = self.api_url.clone();
        options.timeout = Duration::from_millis(self.timeout_ms);
        Ok(options)
    }

    pub fn options(&self) -> Result<SheetsOptions> {
        self.options_with(env_lookup)
    }

    /// Service-account key: inline JSON first, then the key file
    pub fn credentials_with<F: Fn(&str) -> Option<String>>(&self, env: F) -> Result<ServiceAccountKey> {
        if let Some(json) = env(&self.credentials_json_env) {
            return ServiceAccountKey::from_json(&json)
                .context(format!("Failed to parse {}", self.credentials_json_env));
        }

        let path = env(&self.credentials_file_env)
            .map(PathBuf::from)
            .unwrap_or_else(|| self.credentials_file.clone());
        ServiceAccountKey::from_file(&path).context(format!(
            "Failed to load service account key (set {} or {})",
            self.credentials_json_env, self.credentials_file_env
        ))
    }

    pub fn credentials(&self) -> Result<ServiceAccountKey> {
        self.credentials_with(env_lookup)
    }
}

/// Row store backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Google Sheets (production)
    #[default]
    Sheets,
    /// Process-local rows, lost on exit
    Memory,
}

/// Row store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

/// Keep-alive HTTP endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeepaliveConfig {
    /// Serve the endpoint at all
    pub enabled: bool,

    /// Address to bind
    pub bind: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    fn key_json() -> &'static str {
        r#"{"client_email": "bot@example.iam.gserviceaccount.com", "private_key": "pem"}"#
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.telegram.token_env, "BOT_TOKEN");
        assert_eq!(config.sheets.worksheet, "Plans");
        assert_eq!(config.sheets.credentials_file, PathBuf::from("service_account.json"));
        assert_eq!(config.store.backend, StoreBackend::Sheets);
        assert!(config.keepalive.enabled);
        assert_eq!(config.keepalive.port, 8080);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug

telegram:
  token-env: LESSON_BOT_TOKEN
  poll-timeout-secs: 50

sheets:
  sheet-id-env: PLANS_SHEET
  worksheet: Lessons
  timeout-ms: 5000

store:
  backend: memory

keepalive:
  enabled: false
  port: 9090
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.telegram.token_env, "LESSON_BOT_TOKEN");
        assert_eq!(config.telegram.poll_timeout_secs, 50);
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.sheets.sheet_id_env, "PLANS_SHEET");
        assert_eq!(config.sheets.worksheet, "Lessons");
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert!(!config.keepalive.enabled);
        assert_eq!(config.keepalive.port, 9090);
        assert_eq!(config.keepalive.bind, "0.0.0.0");
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log-level: warn\nkeepalive:\n  port: 3000").unwrap();
        let path = file.path().to_path_buf();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.keepalive.port, 3000);
        assert_eq!(config.log_level.as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let path = PathBuf::from("/nonexistent/lessonbot.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_telegram_resolve() {
        let config = TelegramConfig::default();
        let resolved = config.resolve_with(env_from(&[("BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(resolved.token, "123:abc");
        assert!(!format!("{:?}", resolved).contains("123:abc"));

        let err = config.resolve_with(env_from(&[])).unwrap_err();
        assert!(err.to_string().contains("BOT_TOKEN"));
    }

    #[test]
    fn test_sheets_options() {
        let config = SheetsConfig::default();
        let options = config.options_with(env_from(&[("GOOGLE_SHEET_ID", "doc123")])).unwrap();
        assert_eq!(options.sheet_id, "doc123");
        assert_eq!(options.worksheet, "Plans");
        assert_eq!(options.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_credentials_prefer_inline_json() {
        let config = SheetsConfig {
            credentials_file: PathBuf::from("/nonexistent/key.json"),
            ..Default::default()
        };
        let key = config
            .credentials_with(env_from(&[("GOOGLE_CREDENTIALS_JSON", key_json())]))
            .unwrap();
        assert_eq!(key.client_email, "bot@example.iam.gserviceaccount.com");
    }

    #[test]
    fn test_credentials_from_file_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", key_json()).unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let config = SheetsConfig::default();
        let key = config
            .credentials_with(env_from(&[("GOOGLE_CREDENTIALS_FILE", &path)]))
            .unwrap();
        assert_eq!(key.client_email, "bot@example.iam.gserviceaccount.com");
    }

    #[test]
    fn test_validate_sheets_requires_env() {
        let config = Config::default();
        let err = config.validate_with(env_from(&[])).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_SHEET_ID"));

        let result = config.validate_with(env_from(&[
            ("GOOGLE_SHEET_ID", "doc123"),
            ("GOOGLE_CREDENTIALS_JSON", key_json()),
        ]));
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_memory_needs_nothing() {
        let mut config = Config::default();
        config.store.backend = StoreBackend::Memory;
        assert!(config.validate_with(env_from(&[])).is_ok());
    }
}
