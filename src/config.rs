use crate::error::{QueueError, QueueResult};
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    #[serde(default = "default_redis_host")]
    pub redis_host: String,
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,
    #[serde(default)]
    pub redis_db: i64,

    /// CLI 未指定队列时使用的基础名称
    #[serde(default)]
    pub queue_base_name: Option<String>,
    #[serde(default = "default_wait_timeout")]
    pub queue_wait_timeout: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
}

impl RedisConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            db: 0,
        }
    }

    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

// Default value functions
fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}
fn default_redis_port() -> u16 {
    6379
}
fn default_wait_timeout() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_host: default_redis_host(),
            redis_port: default_redis_port(),
            redis_db: 0,
            queue_base_name: None,
            queue_wait_timeout: default_wait_timeout(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    pub fn from_env() -> QueueResult<Self> {
        dotenvy::dotenv().ok();

        let config = envy::from_env::<Config>()
            .map_err(|e| QueueError::Config(format!("Failed to load config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> QueueResult<()> {
        if self.redis_host.trim().is_empty() {
            return Err(QueueError::Config("REDIS_HOST must not be empty".to_string()));
        }

        if self.redis_port == 0 {
            return Err(QueueError::Config("REDIS_PORT must be > 0".to_string()));
        }

        if self.redis_db < 0 {
            return Err(QueueError::Config("REDIS_DB must be >= 0".to_string()));
        }

        if self.queue_wait_timeout == 0 {
            return Err(QueueError::Config(
                "QUEUE_WAIT_TIMEOUT must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn redis(&self) -> RedisConfig {
        RedisConfig {
            host: self.redis_host.clone(),
            port: self.redis_port,
            db: self.redis_db,
        }
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format.clone(),
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_wait_timeout)
    }
}
