//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::utils::geo::Coordinates;

/// Upper bound for `watch.closing_window_hours` (one year).
pub const MAX_CLOSING_WINDOW_HOURS: i64 = 24 * 366;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Registry API endpoints and fetch behavior
    #[serde(default)]
    pub api: ApiConfig,

    /// Proximity and registration window rules
    #[serde(default)]
    pub watch: WatchConfig,

    /// Snapshot location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Discord delivery settings
    #[serde(default)]
    pub discord: DiscordConfig,

    /// Membership directory settings
    #[serde(default)]
    pub directory: DirectoryConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override secrets and channel ids from the environment.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("DISCORD_BOT_TOKEN") {
            self.discord.bot_token = Some(token);
        }
        if let Ok(channel) = std::env::var("DISCORD_CHANNEL_ID") {
            self.discord.channel_id = Some(channel);
        }
        if let Ok(url) = std::env::var("SUPABASE_URL") {
            self.directory.supabase_url = Some(url);
        }
        if let Ok(key) = std::env::var("SUPABASE_KEY") {
            self.directory.supabase_key = Some(key);
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::validation("api.base_url is empty"));
        }
        url::Url::parse(&self.api.base_url)?;
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.api.max_attempts == 0 {
            return Err(AppError::validation("api.max_attempts must be > 0"));
        }
        if !(-90.0..=90.0).contains(&self.watch.latitude) {
            return Err(AppError::validation("watch.latitude out of range"));
        }
        if !(-180.0..=180.0).contains(&self.watch.longitude) {
            return Err(AppError::validation("watch.longitude out of range"));
        }
        if self.watch.radius_km <= 0.0 {
            return Err(AppError::validation("watch.radius_km must be > 0"));
        }
        if !(0..=MAX_CLOSING_WINDOW_HOURS).contains(&self.watch.closing_window_hours) {
            return Err(AppError::validation(format!(
                "watch.closing_window_hours must be between 0 and {}",
                MAX_CLOSING_WINDOW_HOURS
            )));
        }
        if self.directory.supabase_url.is_some() != self.directory.supabase_key.is_some() {
            return Err(AppError::validation(
                "directory.supabase_url and directory.supabase_key must be set together",
            ));
        }
        Ok(())
    }
}

/// Registry API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base of the v0 API, without trailing slash
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Public site used to build competition links
    #[serde(default = "defaults::site_url")]
    pub site_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Attempts per URL before giving up
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Pause after every attempt in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,
}

impl ApiConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            site_url: defaults::site_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_attempts: defaults::max_attempts(),
            retry_delay_ms: defaults::retry_delay(),
        }
    }
}

/// Proximity gate and registration window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Reference latitude in degrees
    #[serde(default = "defaults::latitude")]
    pub latitude: f64,

    /// Reference longitude in degrees
    #[serde(default = "defaults::longitude")]
    pub longitude: f64,

    /// Competitions closer than this are announced
    #[serde(default = "defaults::radius_km")]
    pub radius_km: f64,

    /// Hours before close at which registration counts as closing
    #[serde(default = "defaults::closing_window_hours")]
    pub closing_window_hours: i64,
}

impl WatchConfig {
    pub fn reference(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Closing window, clamped to the range `validate` accepts.
    pub fn closing_window(&self) -> chrono::Duration {
        chrono::Duration::hours(
            self.closing_window_hours
                .clamp(0, MAX_CLOSING_WINDOW_HOURS),
        )
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            latitude: defaults::latitude(),
            longitude: defaults::longitude(),
            radius_km: defaults::radius_km(),
            closing_window_hours: defaults::closing_window_hours(),
        }
    }
}

/// Snapshot storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::storage_dir")]
    pub dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
        }
    }
}

/// Discord bot settings. Token and channel usually come from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default = "defaults::discord_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub bot_token: Option<String>,

    #[serde(default)]
    pub channel_id: Option<String>,

    /// Role mentioned on announcements; omitted when unset
    #[serde(default)]
    pub role_id: Option<String>,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_url: defaults::discord_api_url(),
            bot_token: None,
            channel_id: None,
            role_id: None,
        }
    }
}

/// Membership directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,

    #[serde(default)]
    pub supabase_key: Option<String>,

    #[serde(default = "defaults::directory_table")]
    pub table: String,

    #[serde(default = "defaults::directory_column")]
    pub column: String,

    /// Fixed member list used when no Supabase project is configured
    #[serde(default)]
    pub members: Vec<String>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_key: None,
            table: defaults::directory_table(),
            column: defaults::directory_column(),
            members: Vec::new(),
        }
    }
}

mod defaults {
    // API defaults
    pub fn base_url() -> String {
        "https://www.worldcubeassociation.org/api/v0".into()
    }
    pub fn site_url() -> String {
        "https://www.worldcubeassociation.org".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; compwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        1000
    }

    // Watch defaults (Davis, CA)
    pub fn latitude() -> f64 {
        38.5427
    }
    pub fn longitude() -> f64 {
        -121.75797
    }
    pub fn radius_km() -> f64 {
        300.0
    }
    pub fn closing_window_hours() -> i64 {
        6
    }

    // Storage defaults
    pub fn storage_dir() -> String {
        "api".into()
    }

    // Discord defaults
    pub fn discord_api_url() -> String {
        "https://discord.com/api/v10".into()
    }

    // Directory defaults
    pub fn directory_table() -> String {
        "users".into()
    }
    pub fn directory_column() -> String {
        "wca_id".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.api.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_radius() {
        let mut config = Config::default();
        config.watch.radius_km = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_closing_window() {
        let mut config = Config::default();
        config.watch.closing_window_hours = -1;
        assert!(config.validate().is_err());

        config.watch.closing_window_hours = i64::MAX;
        assert!(config.validate().is_err());
        assert_eq!(
            config.watch.closing_window(),
            chrono::Duration::hours(MAX_CLOSING_WINDOW_HOURS)
        );

        config.watch.closing_window_hours = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_half_configured_supabase() {
        let mut config = Config::default();
        config.directory.supabase_url = Some("https://example.supabase.co".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [watch]
            radius_km = 150.0

            [discord]
            role_id = "1341617955053506570"
            "#,
        )
        .unwrap();

        assert_eq!(config.watch.radius_km, 150.0);
        assert_eq!(config.watch.closing_window_hours, 6);
        assert_eq!(config.api.max_attempts, 3);
        assert_eq!(config.discord.role_id.as_deref(), Some("1341617955053506570"));
        assert_eq!(config.storage.dir, "api");
    }

    #[test]
    fn load_or_default_falls_back() {
        let config = Config::load_or_default("/nonexistent/compwatch.toml");
        assert_eq!(config.api.retry_delay(), Duration::from_millis(1000));
    }
}
