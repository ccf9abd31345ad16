/// Monitoring configuration
///
/// Thresholds and refresh cadence, read once at startup from an optional YAML file.
/// Missing keys fall back to the defaults below.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::{is_valid_email, DEFAULT_CONFIG_FILE, DEFAULT_LOG_FILE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitoringConfig {
    /// CPU usage percentage above which the CPU panel alerts
    pub cpu_threshold: f64,
    /// Memory usage percentage above which the memory panel alerts
    pub memory_threshold: f64,
    /// Root disk usage percentage above which the report highlights disk
    pub disk_threshold: f64,
    /// Network throughput in bytes/sec above which the monitor flags traffic
    pub network_threshold: f64,
    /// Seconds between text reports in `monitor`
    pub monitoring_interval: u64,
    /// Seconds between dashboard ticks
    pub dashboard_refresh_rate: u64,
    pub log_file: PathBuf,
    /// Accepted and validated but never used for delivery
    pub alert_email: Option<String>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            cpu_threshold: 80.0,
            memory_threshold: 80.0,
            disk_threshold: 80.0,
            network_threshold: 1_000_000.0,
            monitoring_interval: 5,
            dashboard_refresh_rate: 2,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            alert_email: None,
        }
    }
}

impl MonitoringConfig {
    /// Parse configuration from YAML text
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Parse a YAML file without range checks. Absent file means defaults.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Load configuration from a YAML file, returning defaults when the file is absent
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::read(path)?;

        let errors = config.validate();
        if !errors.is_empty() {
            return Err(anyhow!(
                "Invalid configuration in {}:\n  - {}",
                path.display(),
                errors.join("\n  - ")
            ));
        }

        Ok(config)
    }

    /// Resolve which file to read.
    ///
    /// An explicit path must exist. Otherwise `./config.yaml` wins over the per-user
    /// config directory; `None` means defaults apply.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(anyhow!("Config file not found at {}", path.display()));
            }
            return Ok(Some(path.to_path_buf()));
        }

        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Ok(Some(local));
        }

        Ok(Self::user_config_path().filter(|p| p.exists()))
    }

    /// `<config dir>/sysmon-cli/config.yaml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sysmon-cli").join(DEFAULT_CONFIG_FILE))
    }

    /// Resolve and load in one step. Returns the config and the file it came from.
    pub fn load_resolved(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        match Self::resolve_path(explicit)? {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("cpu_threshold", self.cpu_threshold),
            ("memory_threshold", self.memory_threshold),
            ("disk_threshold", self.disk_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                errors.push(format!("{} must be between 0 and 100 (got {})", name, value));
            }
        }

        if self.network_threshold.is_nan() || self.network_threshold < 0.0 {
            errors.push(format!(
                "network_threshold must not be negative (got {})",
                self.network_threshold
            ));
        }

        if self.monitoring_interval == 0 {
            errors.push("monitoring_interval must be at least 1 second".to_string());
        }

        if self.dashboard_refresh_rate == 0 {
            errors.push("dashboard_refresh_rate must be at least 1 second".to_string());
        }

        if self.log_file.as_os_str().is_empty() {
            errors.push("log_file must not be empty".to_string());
        }

        if let Some(ref email) = self.alert_email {
            if !is_valid_email(email) {
                errors.push(format!("alert_email is not a valid address: {}", email));
            }
        }

        errors
    }

    pub fn monitoring_interval(&self) -> Duration {
        Duration::from_secs(self.monitoring_interval)
    }

    pub fn dashboard_refresh(&self) -> Duration {
        Duration::from_secs(self.dashboard_refresh_rate)
    }
}
