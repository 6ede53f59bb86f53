//! Session configuration.
//!
//! Built with `with_*` setters on top of [`SessionConfig::default`], or read
//! once from the environment with [`SessionConfig::from_env`]. Nothing reads
//! the environment again after the session is built.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::auth::api::API_URL;
use crate::auth::defaults::{DefaultSettingsConfig, DEFAULTS_FILE};
use crate::auth::welcome::WelcomeMode;
use crate::scheduler::{RESYNC_INTERVAL, REVALIDATE_INTERVAL};

pub const ENV_API_URL: &str = "COSMETICA_API_URL";
pub const ENV_CACHE_DIR: &str = "COSMETICA_CACHE_DIR";
pub const ENV_CONFIG_DIR: &str = "COSMETICA_CONFIG_DIR";
pub const ENV_TOKEN: &str = "COSMETICA_TOKEN";
pub const ENV_CLIENT: &str = "COSMETICA_CLIENT";
pub const ENV_WELCOME: &str = "COSMETICA_WELCOME";
pub const ENV_DEBUG: &str = "COSMETICA_DEBUG";

/// Client identifier sent with token exchanges unless overridden.
pub const DEFAULT_CLIENT_ID: &str = "cosmetica";

const APP_DIR: &str = "cosmetica";

/// Configuration for one [`Session`](crate::session::Session).
///
/// # Example
///
/// ```ignore
/// use cosmetica_auth::config::SessionConfig;
///
/// let config = SessionConfig::default()
///     .with_api_base_url("http://localhost:8080")
///     .with_cache_dir("/tmp/cosmetica");
/// ```
#[derive(Clone)]
pub struct SessionConfig {
    pub api_base_url: String,
    /// Directory holding the `tokens` file.
    pub cache_dir: PathBuf,
    /// Operator-supplied master token. Bypasses cache and exchange.
    pub override_token: Option<String>,
    pub client_id: String,
    pub welcome_mode: WelcomeMode,
    pub may_show_welcome_screen: bool,
    /// Ask about per-region effects when the server has no preference.
    pub regional_effects_prompt: bool,
    /// Verbose diagnostics, including raw bodies of undecodable responses.
    pub elevated_logging: bool,
    pub resync_interval: Duration,
    pub revalidate_interval: Duration,
    /// First-login defaults (not loaded unless a file was found).
    pub defaults: DefaultSettingsConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: API_URL.to_string(),
            cache_dir: default_dir(dirs::cache_dir()),
            override_token: None,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            welcome_mode: WelcomeMode::Full,
            may_show_welcome_screen: true,
            regional_effects_prompt: true,
            elevated_logging: false,
            resync_interval: RESYNC_INTERVAL,
            revalidate_interval: REVALIDATE_INTERVAL,
            defaults: DefaultSettingsConfig::default(),
        }
    }
}

fn default_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(std::env::temp_dir).join(APP_DIR)
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str) -> bool {
    env_non_empty(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_override_token(mut self, token: impl Into<String>) -> Self {
        self.override_token = Some(token.into());
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_welcome_mode(mut self, mode: WelcomeMode) -> Self {
        self.welcome_mode = mode;
        self
    }

    pub fn with_may_show_welcome_screen(mut self, allowed: bool) -> Self {
        self.may_show_welcome_screen = allowed;
        self
    }

    pub fn with_regional_effects_prompt(mut self, prompt: bool) -> Self {
        self.regional_effects_prompt = prompt;
        self
    }

    pub fn with_elevated_logging(mut self, elevated: bool) -> Self {
        self.elevated_logging = elevated;
        self
    }

    pub fn with_resync_interval(mut self, interval: Duration) -> Self {
        self.resync_interval = interval;
        self
    }

    pub fn with_revalidate_interval(mut self, interval: Duration) -> Self {
        self.revalidate_interval = interval;
        self
    }

    pub fn with_defaults(mut self, defaults: DefaultSettingsConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Load first-login defaults from `<config_dir>/default-settings.json`.
    ///
    /// An unusable file is logged and ignored.
    pub fn with_defaults_from(mut self, config_dir: &Path) -> Self {
        self.defaults = match DefaultSettingsConfig::load(&config_dir.join(DEFAULTS_FILE)) {
            Ok(defaults) => defaults,
            Err(e) => {
                warn!(code = e.error_code(), "Ignoring default settings: {}", e);
                DefaultSettingsConfig::default()
            }
        };
        self
    }

    /// Path of the token cache file.
    pub fn tokens_path(&self) -> PathBuf {
        self.cache_dir.join(crate::auth::token_store::TOKENS_FILE)
    }

    /// Just the `COSMETICA_DEBUG` flag, for setting up logging before
    /// [`SessionConfig::from_env`] has anything to warn about.
    pub fn elevated_logging_from_env() -> bool {
        env_flag(ENV_DEBUG)
    }

    /// Read configuration from `COSMETICA_*` environment variables.
    ///
    /// Unset or empty variables keep their defaults. An unknown welcome mode
    /// is logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = env_non_empty(ENV_API_URL) {
            config.api_base_url = url;
        }
        if let Some(dir) = env_non_empty(ENV_CACHE_DIR) {
            config.cache_dir = PathBuf::from(dir);
        }
        config.override_token = env_non_empty(ENV_TOKEN);
        if let Some(client) = env_non_empty(ENV_CLIENT) {
            config.client_id = client;
        }
        if let Some(mode) = env_non_empty(ENV_WELCOME) {
            match mode.parse() {
                Ok(mode) => config.welcome_mode = mode,
                Err(e) => warn!("{}: {}", ENV_WELCOME, e),
            }
        }
        config.elevated_logging = Self::elevated_logging_from_env();

        let config_dir = env_non_empty(ENV_CONFIG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| default_dir(dirs::config_dir()));
        config.with_defaults_from(&config_dir)
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("api_base_url", &self.api_base_url)
            .field("cache_dir", &self.cache_dir)
            .field(
                "override_token",
                &self.override_token.as_ref().map(|_| "<redacted>"),
            )
            .field("client_id", &self.client_id)
            .field("welcome_mode", &self.welcome_mode)
            .field("may_show_welcome_screen", &self.may_show_welcome_screen)
            .field("regional_effects_prompt", &self.regional_effects_prompt)
            .field("elevated_logging", &self.elevated_logging)
            .field("resync_interval", &self.resync_interval)
            .field("revalidate_interval", &self.revalidate_interval)
            .field("defaults_loaded", &self.defaults.was_loaded)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ALL_VARS: [&str; 7] = [
        ENV_API_URL,
        ENV_CACHE_DIR,
        ENV_CONFIG_DIR,
        ENV_TOKEN,
        ENV_CLIENT,
        ENV_WELCOME,
        ENV_DEBUG,
    ];

    fn clear_env() {
        for var in ALL_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.api_base_url, "https://api.cosmetica.cc");
        assert_eq!(config.client_id, "cosmetica");
        assert_eq!(config.welcome_mode, WelcomeMode::Full);
        assert!(config.cache_dir.ends_with("cosmetica"));
        assert!(config.tokens_path().ends_with("cosmetica/tokens"));
        assert!(config.override_token.is_none());
        assert!(!config.defaults.was_loaded);
        assert_eq!(config.resync_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::new()
            .with_api_base_url("http://localhost:1")
            .with_client_id("fabric")
            .with_welcome_mode(WelcomeMode::Off)
            .with_revalidate_interval(Duration::from_secs(1));
        assert_eq!(config.api_base_url, "http://localhost:1");
        assert_eq!(config.client_id, "fabric");
        assert_eq!(config.welcome_mode, WelcomeMode::Off);
        assert_eq!(config.revalidate_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_debug_redacts_override_token() {
        let config = SessionConfig::new().with_override_token("dev-secret");
        let dbg = format!("{:?}", config);
        assert!(!dbg.contains("dev-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_overrides() {
        clear_env();
        let config_dir = TempDir::new().unwrap();
        std::fs::write(config_dir.path().join(DEFAULTS_FILE), r#"{"hats": true}"#).unwrap();

        std::env::set_var(ENV_API_URL, "http://localhost:9000");
        std::env::set_var(ENV_CACHE_DIR, "/tmp/cosmetica-test");
        std::env::set_var(ENV_CONFIG_DIR, config_dir.path());
        std::env::set_var(ENV_TOKEN, "dev");
        std::env::set_var(ENV_CLIENT, "quilt");
        std::env::set_var(ENV_WELCOME, "chat");
        std::env::set_var(ENV_DEBUG, "1");

        let config = SessionConfig::from_env();
        clear_env();

        assert_eq!(config.api_base_url, "http://localhost:9000");
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/cosmetica-test"));
        assert_eq!(config.override_token.as_deref(), Some("dev"));
        assert_eq!(config.client_id, "quilt");
        assert_eq!(config.welcome_mode, WelcomeMode::Chat);
        assert!(config.elevated_logging);
        assert!(config.defaults.was_loaded);
        assert_eq!(config.defaults.hats, Some(true));
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_empty_and_bad_values() {
        clear_env();
        let config_dir = TempDir::new().unwrap();
        std::env::set_var(ENV_CONFIG_DIR, config_dir.path());
        std::env::set_var(ENV_TOKEN, "   ");
        std::env::set_var(ENV_WELCOME, "loud");
        std::env::set_var(ENV_DEBUG, "0");

        let config = SessionConfig::from_env();
        clear_env();

        assert!(config.override_token.is_none());
        assert_eq!(config.welcome_mode, WelcomeMode::Full);
        assert!(!config.elevated_logging);
        assert!(!config.defaults.was_loaded);
    }

    #[test]
    #[serial]
    fn test_elevated_logging_from_env() {
        clear_env();
        assert!(!SessionConfig::elevated_logging_from_env());

        std::env::set_var(ENV_DEBUG, "1");
        let elevated = SessionConfig::elevated_logging_from_env();
        let config = SessionConfig::from_env();
        clear_env();

        assert!(elevated);
        assert!(config.elevated_logging);
    }
}
