use client::config::ClientConfig;
use serde::Deserialize;
use session::config::SessionConfig;
use std::fs::File;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommonConfig {
    metrics: Option<MetricsConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    common: CommonConfig,
    pub server: ClientConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.server.validate()?;
        config.session.validate()?;

        Ok(config)
    }

    pub fn metrics(&self) -> Option<&MetricsConfig> {
        self.common.metrics.as_ref()
    }

    pub fn sentry_dsn(&self) -> Option<&str> {
        self.common
            .logging
            .as_ref()
            .and_then(|logging| logging.sentry_dsn.as_deref())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid server config: {0}")]
    InvalidServer(#[from] client::config::ValidationError),
    #[error("invalid session config: {0}")]
    InvalidSession(#[from] session::config::ValidationError),
}
