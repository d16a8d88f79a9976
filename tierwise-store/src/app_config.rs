use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Without a url the service keeps everything in memory, seeded with the default tiers.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    #[serde(default = "default_dedup_window_ms")]
    pub dedup_window_ms: i64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_max_tracked_users")]
    pub max_tracked_users: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dedup_window_ms: default_dedup_window_ms(),
            channel_capacity: default_channel_capacity(),
            max_tracked_users: default_max_tracked_users(),
        }
    }
}

fn default_dedup_window_ms() -> i64 { 3000 }

fn default_channel_capacity() -> usize { 100 }

fn default_max_tracked_users() -> usize { 10_000 }

#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    /// Cost multiplier for cart lines when no tier resolves and no wholesale price is stored
    #[serde(default = "default_guest_fallback_multiplier")]
    pub guest_fallback_multiplier: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self { guest_fallback_multiplier: default_guest_fallback_multiplier() }
    }
}

fn default_guest_fallback_multiplier() -> f64 { 2.0 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `TIERWISE__SERVER__PORT=9000`
            .add_source(environment())
            .build()?;

        s.try_deserialize()
    }
}

/// `__` separates the prefix from the key as well as nested keys.
fn environment() -> config::Environment {
    config::Environment::with_prefix("TIERWISE").separator("__")
}
