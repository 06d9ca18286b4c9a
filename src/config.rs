use crate::constants::{FLOW_URL, WEBDRIVER_URL};
use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved configuration with all values filled in (no Options).
///
/// This struct represents the pipeline defaults and can be deserialized by the TOML
/// loader. All fields have concrete values, making it safe to access directly without unwrapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolvedConfig {
    /// Root URL of the Flow web service
    pub base_url: String,
    /// WebDriver endpoint (chromedriver) used for the login session
    pub webdriver_url: String,
    /// Run the browser without a visible window
    pub headless: bool,
    /// Seconds to wait for each login control to appear
    pub element_wait_secs: u64,
    /// Milliseconds to let a diary page finish client-side rendering
    pub settle_delay_ms: u64,
    /// Number of concurrent export requests
    pub concurrent_exports: usize,
    /// Per-request timeout for export calls
    pub request_timeout_secs: u64,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            base_url: FLOW_URL.to_string(),
            webdriver_url: WEBDRIVER_URL.to_string(),
            headless: true,
            element_wait_secs: 20,
            settle_delay_ms: 2000,
            concurrent_exports: 4,
            request_timeout_secs: 60,
        }
    }
}

impl ResolvedConfig {
    pub fn element_wait(&self) -> Duration {
        Duration::from_secs(self.element_wait_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Rejects values that would stall or disable the pipeline.
    pub fn validate(&self) -> AppResult<()> {
        if self.concurrent_exports == 0 {
            return Err(AppError::InvalidInput(
                "Concurrent exports must be greater than 0".into(),
            ));
        }
        if self.element_wait_secs == 0 {
            return Err(AppError::InvalidInput(
                "Element wait must be greater than 0 seconds".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::InvalidInput(
                "Request timeout must be greater than 0 seconds".into(),
            ));
        }
        url::Url::parse(&self.base_url)?;
        url::Url::parse(&self.webdriver_url)?;
        Ok(())
    }
}

/// Configuration that can be loaded from a TOML file.
///
/// Holds the run parameters (account, period range, output directory) and the
/// flattened pipeline configuration. Unknown keys are rejected to catch typos.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolvedConfigFile {
    /// Account e-mail; required when `download` is enabled
    #[serde(default)]
    pub username: Option<String>,
    /// Account password; falls back to the `POLAR_PASSWORD` environment variable
    #[serde(default)]
    pub password: Option<String>,
    /// Single year to export, shorthand for `start = end = year`
    #[serde(default)]
    pub year: Option<String>,
    /// Start period in `YYYY` or `YYYYMM` format
    #[serde(default)]
    pub start: Option<String>,
    /// End period in `YYYY` or `YYYYMM` format
    #[serde(default)]
    pub end: Option<String>,
    /// Directory the exported files are written to
    pub output_dir: PathBuf,
    /// Whether to log in and export (defaults to `true`)
    #[serde(default = "default_download")]
    pub download: bool,
    /// Whether to file exports into year/month folders afterwards
    #[serde(default)]
    pub organize: bool,
    /// Flattened resolved configuration with pipeline defaults
    #[serde(flatten)]
    pub resolved: ResolvedConfig,
}

impl ResolvedConfigFile {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the TOML is malformed, unknown keys are present,
    /// `year` is combined with `start`/`end`, or the pipeline values are invalid.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ResolvedConfigFile = toml::from_str(&contents)
            .map_err(|e| AppError::InvalidInput(format!("Failed to parse config: {e}")))?;

        if config.year.is_some() && (config.start.is_some() || config.end.is_some()) {
            return Err(AppError::InvalidInput(
                "Use either `year` or `start`/`end`, not both".into(),
            ));
        }
        config.resolved.validate()?;

        Ok(config)
    }

    /// Start and end bounds, expanding `year` when it is set.
    pub fn period_bounds(&self) -> (Option<&str>, Option<&str>) {
        match self.year.as_deref() {
            Some(year) => (Some(year), Some(year)),
            None => (self.start.as_deref(), self.end.as_deref()),
        }
    }
}

fn default_download() -> bool {
    true
}
