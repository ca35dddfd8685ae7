//! Emitter configuration with defaults, file, and environment overrides.

use std::time::Duration;

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use ormcast_core::DEFAULT_SOURCE;

use crate::client::ClientConfig;

const CONFIG_FILE: &str = "ormcast.toml";

/// Emitter configuration.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`ormcast.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// An absent sink is the intended disabled state: envelopes are still
/// built, dispatch becomes a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// Sink URL receiving dispatched envelopes. Absent disables
    /// dispatch.
    ///
    /// Environment variable: `K_SINK`
    #[serde(default, alias = "K_SINK", alias = "k_sink")]
    pub sink: Option<String>,

    /// Source identifier stamped on every envelope.
    ///
    /// Environment variable: `CLOUDEVENT_SOURCE`
    #[serde(default = "default_source", alias = "CLOUDEVENT_SOURCE", alias = "cloudevent_source")]
    pub source: String,

    /// HTTP request timeout for dispatch in seconds.
    ///
    /// Environment variable: `DELIVERY_TIMEOUT_SECONDS`
    #[serde(default = "default_delivery_timeout", alias = "DELIVERY_TIMEOUT_SECONDS")]
    pub delivery_timeout_seconds: u64,
}

impl EmitterConfig {
    /// Load configuration from defaults, config file, and environment
    /// variable overrides.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Convert to the dispatch client's configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.delivery_timeout_seconds),
            ..ClientConfig::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if let Some(sink) = &self.sink {
            if !sink.starts_with("http://") && !sink.starts_with("https://") {
                anyhow::bail!("sink must be an http(s) URL, got {sink:?}");
            }
        }

        if self.source.is_empty() {
            anyhow::bail!("source must not be empty");
        }

        if self.delivery_timeout_seconds == 0 {
            anyhow::bail!("delivery_timeout_seconds must be greater than 0");
        }

        Ok(())
    }
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            sink: None,
            source: default_source(),
            delivery_timeout_seconds: default_delivery_timeout(),
        }
    }
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

fn default_delivery_timeout() -> u64 {
    crate::DEFAULT_TIMEOUT_SECONDS
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, env, sync::Mutex};

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct TestEnvGuard {
        _lock: std::sync::MutexGuard<'static, ()>,
        originals: HashMap<String, Option<String>>,
    }

    impl TestEnvGuard {
        fn new() -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Self { _lock: lock, originals: HashMap::new() }
        }

        fn set_var(&mut self, key: &str, value: &str) {
            self.originals.entry(key.to_string()).or_insert_with(|| env::var(key).ok());
            env::set_var(key, value);
        }
    }

    impl Drop for TestEnvGuard {
        fn drop(&mut self) {
            for (var, original) in &self.originals {
                match original {
                    Some(value) => env::set_var(var, value),
                    None => env::remove_var(var),
                }
            }
        }
    }

    #[test]
    fn defaults_disable_dispatch() {
        let config = EmitterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sink, None);
        assert_eq!(config.source, "django-orm");
        assert_eq!(config.delivery_timeout_seconds, 30);
    }

    #[test]
    fn env_overrides_take_priority() {
        let mut guard = TestEnvGuard::new();
        guard.set_var("K_SINK", "http://sink.example.com/events");
        guard.set_var("CLOUDEVENT_SOURCE", "orders-service");
        guard.set_var("DELIVERY_TIMEOUT_SECONDS", "5");

        let config = EmitterConfig::load().expect("config should load with env overrides");
        assert_eq!(config.sink.as_deref(), Some("http://sink.example.com/events"));
        assert_eq!(config.source, "orders-service");
        assert_eq!(config.delivery_timeout_seconds, 5);
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = EmitterConfig::default();
        config.sink = Some("not-a-url".to_string());
        assert!(config.validate().is_err());

        config = EmitterConfig::default();
        config.source = String::new();
        assert!(config.validate().is_err());

        config = EmitterConfig::default();
        config.delivery_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn client_config_carries_the_timeout() {
        let mut config = EmitterConfig::default();
        config.delivery_timeout_seconds = 7;
        assert_eq!(config.to_client_config().timeout, Duration::from_secs(7));
    }
}
