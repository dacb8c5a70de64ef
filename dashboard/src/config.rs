use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String { common::DEFAULT_BASE_URL.to_string() }
fn default_request_timeout() -> u64 { common::DEFAULT_REQUEST_TIMEOUT_SECS }

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_fast_tick")]
    pub fast_tick_ms: u64,
    #[serde(default = "default_slow_tick")]
    pub slow_tick_secs: u64,
    #[serde(default = "default_automation_job")]
    pub automation_job_id: String,
}

fn default_fast_tick() -> u64 { 1000 }
fn default_slow_tick() -> u64 { 30 }
fn default_automation_job() -> String { common::AUTOMATION_JOB_ID.to_string() }

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            fast_tick_ms: default_fast_tick(),
            slow_tick_secs: default_slow_tick(),
            automation_job_id: default_automation_job(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_notification_ttl")]
    pub notification_ttl_secs: u64,
}

fn default_timezone() -> String { common::DEFAULT_TIMEZONE.to_string() }
fn default_notification_ttl() -> u64 { 5 }

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            notification_ttl_secs: default_notification_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub output: Option<PathBuf>,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse a config file; the extension picks YAML or TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read dashboard config {:?}", path))?;
        format.parse(&content)
            .with_context(|| format!("Invalid {} in dashboard config {:?}", format.name(), path))
    }

    /// Explicit path must exist; otherwise the first default location found
    /// is used, falling back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        for candidate in [common::USER_CONFIG_PATH, common::DEFAULT_CONFIG_PATH] {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.display.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid display timezone {:?}: {}", self.display.timezone, e))
    }

    pub fn fast_tick(&self) -> Duration {
        Duration::from_millis(self.polling.fast_tick_ms.max(1))
    }

    pub fn slow_tick(&self) -> Duration {
        Duration::from_secs(self.polling.slow_tick_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    /// Capped at a day; larger values would overflow `chrono::Duration`.
    pub fn notification_ttl(&self) -> chrono::Duration {
        let secs = self.display.notification_ttl_secs.min(MAX_NOTIFICATION_TTL_SECS);
        chrono::Duration::seconds(secs as i64)
    }
}

const MAX_NOTIFICATION_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => bail!("Dashboard config {:?} must end in .yaml, .yml or .toml", path),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Toml => "TOML",
        }
    }

    fn parse(&self, content: &str) -> Result<Config> {
        Ok(match self {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        })
    }
}
