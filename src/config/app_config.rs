// src/config/app_config.rs

use ::config::{Config, Environment, File, FileFormat, Map};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::repository::work_queue::MAX_QUEUE_DELAY_SECS;
use crate::scheduler::queue_poller::QueuePollerConfig;
use crate::scheduler::retry_scheduler::RetryPolicy;

/// Variable con la ruta del archivo de configuración.
pub const CONFIG_FILE_ENV: &str = "APP_CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "config/default.yaml";

/// Estructura principal que representa la configuración de la aplicación.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub stores: StoresConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    pub profile: String, // "development", "staging", "production"
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self { profile: "development".into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Directiva de EnvFilter; RUST_LOG tiene prioridad.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), json: false }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    #[serde(default = "default_max_retry_count")]
    pub max_retry_count: u32,
    #[serde(default = "default_refresh_interval_secs")]
    pub outputs_refresh_interval_secs: u64,
    #[serde(default = "default_min_retry_delay_secs")]
    pub min_retry_delay_secs: u64,
    #[serde(default = "default_max_retry_delay_secs")]
    pub max_retry_delay_secs: u64,
    /// Sin valor = fan-out sin límite.
    #[serde(default)]
    pub max_in_flight_deliveries: Option<usize>,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retry_count: default_max_retry_count(),
            outputs_refresh_interval_secs: default_refresh_interval_secs(),
            min_retry_delay_secs: default_min_retry_delay_secs(),
            max_retry_delay_secs: default_max_retry_delay_secs(),
            max_in_flight_deliveries: None,
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { poll_interval_ms: default_poll_interval_ms(), batch_size: default_batch_size() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoresConfig {
    pub outputs_file: PathBuf,
    #[serde(default)]
    pub alerts_file: Option<PathBuf>,
    #[serde(default)]
    pub analyses_file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_max_retry_count() -> u32 {
    10
}
fn default_refresh_interval_secs() -> u64 {
    300
}
fn default_min_retry_delay_secs() -> u64 {
    10
}
fn default_max_retry_delay_secs() -> u64 {
    30
}
fn default_http_timeout_secs() -> u64 {
    10
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_batch_size() -> usize {
    10
}
fn default_bind() -> String {
    "0.0.0.0:8080".into()
}

impl AppConfig {
    /// Carga desde `APP_CONFIG_FILE` (o `config/default.yaml`) más variables `APP__*`.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&path), None)
    }

    /// `env` reemplaza al entorno del proceso cuando se indica (tests).
    pub fn load_from(path: &Path, env: Option<Map<String, String>>) -> Result<Self> {
        if path.exists() {
            info!(path = %path.display(), "loading config file");
        } else {
            info!(path = %path.display(), "config file not found, using defaults and environment");
        }
        let builder = Config::builder().add_source(File::from(path.to_path_buf()).required(false));
        Self::build(builder.add_source(environment(env)))
    }

    pub fn from_yaml_str(raw: &str, env: Option<Map<String, String>>) -> Result<Self> {
        let builder = Config::builder().add_source(File::from_str(raw, FileFormat::Yaml));
        Self::build(builder.add_source(environment(env)))
    }

    fn build(builder: ::config::ConfigBuilder<::config::builder::DefaultState>) -> Result<Self> {
        let built = builder.build().context("failed to build configuration")?;
        let cfg: AppConfig = built.try_deserialize().context("failed to deserialize configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validar configuración con reglas propias.
    pub fn validate(&self) -> Result<()> {
        let valid_profiles = ["development", "staging", "production"];
        if !valid_profiles.contains(&self.environment.profile.as_str()) {
            anyhow::bail!(
                "invalid environment profile '{}', must be one of {:?}",
                self.environment.profile,
                valid_profiles
            );
        }

        let d = &self.delivery;
        if d.max_retry_delay_secs > MAX_QUEUE_DELAY_SECS {
            anyhow::bail!(
                "delivery.max_retry_delay_secs ({}) exceeds the queue maximum of {}s",
                d.max_retry_delay_secs,
                MAX_QUEUE_DELAY_SECS
            );
        }
        if d.min_retry_delay_secs > d.max_retry_delay_secs {
            anyhow::bail!(
                "delivery.min_retry_delay_secs ({}) must not exceed delivery.max_retry_delay_secs ({})",
                d.min_retry_delay_secs,
                d.max_retry_delay_secs
            );
        }
        if d.http_timeout_secs == 0 {
            anyhow::bail!("delivery.http_timeout_secs must be greater than zero");
        }
        if d.max_in_flight_deliveries == Some(0) {
            anyhow::bail!("delivery.max_in_flight_deliveries must be greater than zero when set");
        }

        if self.queue.batch_size == 0 {
            anyhow::bail!("queue.batch_size must be greater than zero");
        }
        if self.queue.poll_interval_ms == 0 {
            anyhow::bail!("queue.poll_interval_ms must be greater than zero");
        }

        if self.stores.outputs_file.as_os_str().is_empty() {
            anyhow::bail!("stores.outputs_file must be set");
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retry_count: self.delivery.max_retry_count,
            min_delay_secs: self.delivery.min_retry_delay_secs,
            max_delay_secs: self.delivery.max_retry_delay_secs,
        }
    }

    pub fn poller_config(&self) -> QueuePollerConfig {
        QueuePollerConfig {
            poll_interval: Duration::from_millis(self.queue.poll_interval_ms),
            batch_size: self.queue.batch_size,
            requeue_delay: Duration::from_secs(self.delivery.min_retry_delay_secs),
        }
    }

    pub fn outputs_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.delivery.outputs_refresh_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery.http_timeout_secs)
    }
}

fn environment(source: Option<Map<String, String>>) -> Environment {
    Environment::with_prefix("APP").separator("__").try_parsing(true).source(source)
}
