//! Configuration loading.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::debug;

use crate::{
    error::{ReportError, Result},
    layout::OutputLayout,
};

pub const DEFAULT_MODEL: &str = "gemini-3.0-pro";
pub const DEFAULT_FALLBACK_MODELS: [&str; 2] = ["gemini-2.5-pro", "gemini-1.5-pro"];
const CONFIG_FILE: &str = "config.yml";
const DEFAULT_POLL_INTERVAL_SECS: f64 = 2.0;
const DEFAULT_SECTION_DELAY_SECS: f64 = 5.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model_name: String,
    pub fallback_models: Vec<String>,
    pub poll_interval_secs: f64,
    pub request_timeout_secs: u64,
    pub report: ReportOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    pub include_screenshots: bool,
    pub screenshot_dir: String,
    pub output_dir: PathBuf,
    pub output_file: String,
    pub language: String,
    pub section_delay_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            fallback_models: DEFAULT_FALLBACK_MODELS.map(String::from).to_vec(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: 600,
            report: ReportOptions::default(),
        }
    }
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_screenshots: true,
            screenshot_dir: "images".to_string(),
            output_dir: PathBuf::from("output"),
            output_file: "report.md".to_string(),
            language: "Japanese".to_string(),
            section_delay_secs: DEFAULT_SECTION_DELAY_SECS,
        }
    }
}

impl Config {
    /// Primary model followed by the fallbacks, without duplicates.
    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = Vec::new();
        for model in std::iter::once(&self.model_name).chain(&self.fallback_models) {
            let model = model.trim();
            if !model.is_empty() && !models.iter().any(|m| m == model) {
                models.push(model.to_string());
            }
        }
        models
    }

    /// Values rejected by [`parse_config`] fall back to the default interval.
    pub fn poll_interval(&self) -> Duration {
        seconds(self.poll_interval_secs)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_POLL_INTERVAL_SECS))
    }

    pub fn section_delay(&self) -> Duration {
        seconds(self.report.section_delay_secs)
            .unwrap_or(Duration::from_secs_f64(DEFAULT_SECTION_DELAY_SECS))
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let durations = [
            ("poll_interval_secs", self.poll_interval_secs),
            ("report.section_delay_secs", self.report.section_delay_secs),
        ];
        for (key, value) in durations {
            if seconds(value).is_none() {
                return Err(ReportError::Config {
                    path: path.to_path_buf(),
                    reason: format!("{key}: {value} is not a usable number of seconds"),
                });
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(
            self.report.output_dir.clone(),
            self.report.output_file.clone(),
            self.report.screenshot_dir.clone(),
        )
    }
}

/// Negative values clamp to zero; infinite or out-of-range values are `None`.
fn seconds(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value.max(0.0)).ok()
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("workreport").join(CONFIG_FILE))
}

pub fn parse_config(text: &str, path: &Path) -> Result<Config> {
    if text.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yaml::from_str(text).map_err(|e| ReportError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    config.validate(path)?;
    Ok(config)
}

/// Load configuration.
///
/// An explicit path must exist. Without one, `./config.yml` and then the user
/// config directory are tried before falling back to defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) if !path.exists() => {
            return Err(ReportError::Config {
                path: path.to_path_buf(),
                reason: "file not found".to_string(),
            });
        }
        Some(path) => Some(path.to_path_buf()),
        None => std::iter::once(PathBuf::from(CONFIG_FILE))
            .chain(default_config_path())
            .find(|candidate| candidate.exists()),
    };

    let Some(path) = path else {
        debug!("no config file found, using defaults");
        return Ok(Config::default());
    };

    debug!(path = %path.display(), "loading config");
    let text = std::fs::read_to_string(&path)?;
    parse_config(&text, &path)
}
