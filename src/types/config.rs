//! Configuration for jakas.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::JakasResult;

/// Main configuration for jakas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Persistent storage settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// External scorer settings.
    #[serde(default)]
    pub scorer: ScorerConfig,

    /// Score cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Client retry policy used by `jakas score`.
    #[serde(default)]
    pub poll: PollConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Persistent storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path (restaurants, reviews and scores).
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".jakas/jakas.db")
}

/// External scorer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Command to execute.
    #[serde(default = "default_scorer_command")]
    pub command: String,

    /// Default arguments, passed before the prompt.
    #[serde(default = "default_scorer_args")]
    pub args: Vec<String>,

    /// Model requested from the CLI.
    #[serde(default = "default_scorer_model")]
    pub model: String,

    /// Upper bound for a single scorer invocation (in seconds).
    #[serde(default = "default_scorer_timeout")]
    pub timeout_secs: u64,
}

impl ScorerConfig {
    /// Creates a scorer configuration for the given command.
    pub fn new(command: &str, args: &[&str]) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            model: default_scorer_model(),
            timeout_secs: default_scorer_timeout(),
        }
    }

    /// Timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            command: default_scorer_command(),
            args: default_scorer_args(),
            model: default_scorer_model(),
            timeout_secs: default_scorer_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_scorer_command() -> String {
    "gemini".to_string()
}

fn default_scorer_args() -> Vec<String> {
    vec!["-o".to_string(), "json".to_string()]
}

fn default_scorer_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_scorer_timeout() -> u64 {
    30
}

/// Score cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enables the in-memory LRU in front of the database.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum LRU capacity (number of records).
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// How long a score record stays fresh, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    /// Treat a record as stale once the reviews it was computed from change.
    #[serde(default)]
    pub invalidate_on_review_change: bool,
}

impl CacheConfig {
    /// TTL as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
            invalidate_on_review_change: false,
        }
    }
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_cache_ttl() -> u64 {
    600 // 10 minutes
}

/// Client retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between attempts when nothing is in flight (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,

    /// Maximum number of `request_score` attempts before giving up.
    #[serde(default = "default_poll_attempts")]
    pub max_attempts: u32,
}

impl PollConfig {
    /// Interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            max_attempts: default_poll_attempts(),
        }
    }
}

fn default_poll_interval() -> u64 {
    500
}

fn default_poll_attempts() -> u32 {
    20
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> JakasResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> JakasResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            store: StoreConfig::default(),
            scorer: ScorerConfig::default(),
            cache: CacheConfig::default(),
            poll: PollConfig::default(),
        }
    }

    /// Loads `path`, falling back to defaults when it is missing or invalid.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default_config();
        }
        Self::load(path).unwrap_or_else(|_| Self::default_config())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_secs, 600);
        assert_eq!(config.scorer.command, "gemini");
        assert_eq!(config.scorer.timeout(), Duration::from_secs(30));
        assert!(!config.cache.invalidate_on_review_change);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            ttl_secs = 60

            [scorer]
            command = "my-llm"
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.ttl(), Duration::from_secs(60));
        assert_eq!(config.cache.capacity, 1000);
        assert_eq!(config.scorer.command, "my-llm");
        assert_eq!(config.scorer.args, vec!["-o", "json"]);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jakas.toml");

        let mut config = Config::default();
        config.poll.max_attempts = 3;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.poll.max_attempts, 3);
        assert_eq!(loaded.store.db_path, PathBuf::from(".jakas/jakas.db"));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert_eq!(Config::load_or_default(&missing).cache.ttl_secs, 600);

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[cache\nttl_secs = ").unwrap();
        assert_eq!(Config::load_or_default(&broken).poll.max_attempts, 20);
    }
}
