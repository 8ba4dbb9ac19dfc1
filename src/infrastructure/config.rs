use crate::application::poller::PollerConfig;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

/// Largest retention window accepted for either buffer
const MAX_CAPACITY: usize = 10_000;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiSettings,
    pub poller: PollerSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollerSettings {
    pub interval_ms: u64,
    pub history_capacity: usize,
    pub anomaly_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl From<&PollerSettings> for PollerConfig {
    fn from(settings: &PollerSettings) -> Self {
        PollerConfig {
            interval: Duration::from_millis(settings.interval_ms),
            history_capacity: settings.history_capacity,
            anomaly_capacity: settings.anomaly_capacity,
        }
    }
}

/// Defaults, then `config/monitor.*` if present, then `MONITOR__*` env vars
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let builder = defaults()?
        .add_source(File::with_name("config/monitor").required(false))
        .add_source(environment());

    finish(builder)
}

fn environment() -> Environment {
    Environment::with_prefix("MONITOR").separator("__")
}

fn defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
    let builder = config::Config::builder()
        .set_default("api.base_url", "http://localhost:5001")?
        .set_default("api.request_timeout_ms", 4000)?
        .set_default("poller.interval_ms", 5000)?
        .set_default("poller.history_capacity", 50)?
        .set_default("poller.anomaly_capacity", 10)?
        .set_default("server.bind_addr", "0.0.0.0:8080")?;

    Ok(builder)
}

fn finish(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<AppConfig> {
    let config: AppConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    fn validate(&self) -> anyhow::Result<()> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        if self.api.request_timeout_ms == 0 {
            anyhow::bail!("api.request_timeout_ms must be greater than zero");
        }
        if self.poller.interval_ms == 0 {
            anyhow::bail!("poller.interval_ms must be greater than zero");
        }
        for (key, capacity) in [
            ("poller.history_capacity", self.poller.history_capacity),
            ("poller.anomaly_capacity", self.poller.anomaly_capacity),
        ] {
            if capacity > MAX_CAPACITY {
                anyhow::bail!("{} must be at most {}, got {}", key, MAX_CAPACITY, capacity);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn load_from_toml(toml: &str) -> anyhow::Result<AppConfig> {
        finish(defaults()?.add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn test_defaults() {
        let config = load_from_toml("").unwrap();

        assert_eq!(config.api.base_url, "http://localhost:5001");
        assert_eq!(config.api.request_timeout(), Duration::from_millis(4000));
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(PollerConfig::from(&config.poller), PollerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = load_from_toml(
            r#"
            [api]
            base_url = "http://collar-hub.local:5001"

            [poller]
            interval_ms = 2000
            history_capacity = 120
            "#,
        )
        .unwrap();

        let poller = PollerConfig::from(&config.poller);
        assert_eq!(config.api.base_url, "http://collar-hub.local:5001");
        assert_eq!(poller.interval, Duration::from_secs(2));
        assert_eq!(poller.history_capacity, 120);
        assert_eq!(poller.anomaly_capacity, 10);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = load_from_toml("[poller]\ninterval_ms = 0").unwrap_err();
        assert!(err.to_string().contains("interval_ms"));
    }

    #[test]
    fn test_rejects_empty_base_url() {
        assert!(load_from_toml("[api]\nbase_url = \"  \"").is_err());
    }

    #[test]
    fn test_rejects_oversized_capacity() {
        let err = load_from_toml("[poller]\nhistory_capacity = 100000000000").unwrap_err();
        assert!(err.to_string().contains("history_capacity"));

        let err = load_from_toml("[poller]\nanomaly_capacity = 10001").unwrap_err();
        assert!(err.to_string().contains("anomaly_capacity"));

        let config = load_from_toml("[poller]\nhistory_capacity = 10000").unwrap();
        assert_eq!(config.poller.history_capacity, MAX_CAPACITY);
    }

    #[test]
    fn test_environment_overrides() {
        let vars = config::Map::from([
            ("MONITOR__POLLER__INTERVAL_MS".to_string(), "1234".to_string()),
            ("MONITOR__API__BASE_URL".to_string(), "http://hub:5001".to_string()),
            ("UNRELATED__POLLER__INTERVAL_MS".to_string(), "1".to_string()),
        ]);
        let builder = defaults()
            .unwrap()
            .add_source(File::from_str("[poller]\ninterval_ms = 2000", FileFormat::Toml))
            .add_source(environment().source(Some(vars)));

        let config = finish(builder).unwrap();
        assert_eq!(config.api.base_url, "http://hub:5001");
        assert_eq!(
            PollerConfig::from(&config.poller).interval,
            Duration::from_millis(1234)
        );
        assert_eq!(config.poller.history_capacity, 50);
    }
}
