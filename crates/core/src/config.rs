use crate::{
    error::{CoreError, Result},
    model::{MetricKind, Theme},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::warn;

/// Update intervals offered to the user, in seconds
pub const ALLOWED_INTERVALS: [u32; 3] = [1, 2, 5];

/// Upper bound for how long a single sensor may take within one tick
pub const MAX_SENSOR_TIMEOUT: Duration = Duration::from_secs(5);

/// How the GPU utility is invoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuConfig {
    /// Program looked up on `PATH`
    pub program: String,

    /// Fixed arguments; the default dumps one radeontop sample to stdout
    pub args: Vec<String>,

    /// Ask for elevated privilege once before the first GPU sample
    pub elevate: bool,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            program: "radeontop".to_string(),
            args: ["-d", "-", "-l", "1"].iter().map(|s| s.to_string()).collect(),
            elevate: true,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds between ticks, one of [`ALLOWED_INTERVALS`]
    pub interval_secs: u32,

    /// Metrics sampled on every tick
    pub enabled: BTreeSet<MetricKind>,

    /// GPU utility invocation
    pub gpu: GpuConfig,

    /// Filesystem whose usage the disk sensor reports
    pub disk_mount: PathBuf,

    /// UI theme
    pub theme: Theme,

    /// Disable colors
    pub no_color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_secs: 2,
            enabled: MetricKind::ALL.into_iter().collect(),
            gpu: GpuConfig::default(),
            disk_mount: PathBuf::from("/"),
            theme: Theme::Dark,
            no_color: false,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources in order of preference:
    /// 1. CLI arguments override everything
    /// 2. JSON config file if specified
    /// 3. Default config file locations
    /// 4. Built-in defaults
    pub fn load(cli_config: Option<&CliConfig>, json_path: Option<&Path>) -> Result<Self> {
        let mut config = match json_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default_config().unwrap_or_default(),
        };

        if let Some(cli) = cli_config {
            config.apply_cli_overrides(cli);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CoreError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            CoreError::config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// First readable config among the default locations
    fn load_default_config() -> Option<Self> {
        for path in Self::default_config_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from_file(&path) {
                Ok(config) => return Some(config),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping config file"),
            }
        }
        None
    }

    /// Get default configuration file search paths
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("panelmon").join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".panelmon.json"));
        }

        paths
    }

    fn apply_cli_overrides(&mut self, cli: &CliConfig) {
        if let Some(interval) = cli.interval_secs {
            self.interval_secs = interval;
        }
        for kind in &cli.disabled {
            self.enabled.remove(kind);
        }
        if let Some(theme) = cli.theme {
            self.theme = theme;
        }
        if cli.no_color {
            self.no_color = true;
        }
        if cli.no_elevate {
            self.gpu.elevate = false;
        }
    }

    /// Reject anything the sampler cannot run with
    pub fn validate(&self) -> Result<()> {
        if !ALLOWED_INTERVALS.contains(&self.interval_secs) {
            return Err(CoreError::invalid_config(format!(
                "update interval must be one of {:?} seconds, got {}",
                ALLOWED_INTERVALS, self.interval_secs
            )));
        }

        if self.enabled.contains(&MetricKind::Gpu) && self.gpu.program.trim().is_empty() {
            return Err(CoreError::invalid_config("GPU utility program is empty"));
        }

        Ok(())
    }

    /// Copy of this config with a different interval
    pub fn with_interval(&self, interval_secs: u32) -> Self {
        Self {
            interval_secs,
            ..self.clone()
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_secs))
    }

    /// Per-sensor time budget: twice the interval, capped
    pub fn sensor_timeout(&self) -> Duration {
        (self.interval() * 2).min(MAX_SENSOR_TIMEOUT)
    }

    pub fn is_enabled(&self, kind: MetricKind) -> bool {
        self.enabled.contains(&kind)
    }
}

/// CLI configuration (temporary struct for CLI parsing)
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub interval_secs: Option<u32>,
    pub disabled: Vec<MetricKind>,
    pub theme: Option<Theme>,
    pub no_color: bool,
    pub no_elevate: bool,
}
