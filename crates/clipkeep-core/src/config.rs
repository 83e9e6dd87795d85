use crate::clip::AllowList;
use crate::error::Error;
use crate::retention::{SpeciesQuota, TrimOrder};
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const HOUR_SECS: u64 = 60 * 60;
const DAY_SECS: u64 = 24 * HOUR_SECS;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub scan_root: PathBuf,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default)]
    pub retention: RetentionConfig,
}

fn default_db_path() -> String {
    "clipkeep.db".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionMode {
    Age,
    Usage,
}

/// Raw `[retention]` table as written in `Config.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub mode: RetentionMode,
    pub max_age: String,
    pub min_free_space_ratio: f64,
    pub min_clips_per_species: usize,
    pub per_species_min_override: HashMap<String, usize>,
    pub allowed_extensions: Vec<String>,
    pub quota_trim_order: TrimOrder,
    pub max_deletions_per_pass: Option<usize>,
    pub interval: String,
    pub dry_run: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            mode: RetentionMode::Age,
            max_age: "30d".to_string(),
            min_free_space_ratio: 0.1,
            min_clips_per_species: 10,
            per_species_min_override: HashMap::new(),
            allowed_extensions: vec![
                ".wav".to_string(),
                ".mp3".to_string(),
                ".flac".to_string(),
                ".aac".to_string(),
                ".opus".to_string(),
            ],
            quota_trim_order: TrimOrder::NewestFirst,
            max_deletions_per_pass: Some(1000),
            interval: "15m".to_string(),
            dry_run: false,
        }
    }
}

/// Validated, typed view of [`RetentionConfig`] used by the engine.
#[derive(Debug, Clone)]
pub struct RetentionSettings {
    pub mode: RetentionMode,
    pub max_age: Duration,
    pub min_free_space_ratio: f64,
    pub quota: SpeciesQuota,
    pub allow_list: AllowList,
    pub trim_order: TrimOrder,
    pub max_deletions_per_pass: Option<usize>,
    pub interval: Duration,
    pub dry_run: bool,
}

impl RetentionConfig {
    pub fn validate(&self) -> Result<RetentionSettings, Error> {
        let ratio = self.min_free_space_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "min_free_space_ratio must be strictly between 0 and 1, got {}",
                ratio
            )));
        }

        Ok(RetentionSettings {
            mode: self.mode,
            max_age: parse_retention_period(&self.max_age)?,
            min_free_space_ratio: ratio,
            quota: SpeciesQuota::new(
                self.min_clips_per_species,
                self.per_species_min_override.clone(),
            ),
            allow_list: AllowList::from_names(&self.allowed_extensions)?,
            trim_order: self.quota_trim_order,
            // 0 turns the cap off.
            max_deletions_per_pass: self.max_deletions_per_pass.filter(|&cap| cap > 0),
            interval: parse_interval(&self.interval)?,
            dry_run: self.dry_run,
        })
    }
}

impl AppConfig {
    pub fn settings(&self) -> Result<RetentionSettings, Error> {
        if self.scan_root.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("scan_root must be set".to_string()));
        }
        self.retention.validate()
    }
}

/// Load `Config.toml` from the working directory, overlaid by `CLIPKEEP__*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("CLIPKEEP").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

pub fn load_configuration_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::from(path))
        .add_source(Environment::with_prefix("CLIPKEEP").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Parse a retention period: `<n>[h|d|w|m|y]`, where `m` is a 30-day month and a
/// bare number means hours.
pub fn parse_retention_period(value: &str) -> Result<Duration, Error> {
    let value = value.trim();
    let (amount, unit) = split_amount(value)?;
    let unit_secs = match unit {
        "" | "h" => HOUR_SECS,
        "d" => DAY_SECS,
        "w" => 7 * DAY_SECS,
        "m" => 30 * DAY_SECS,
        "y" => 365 * DAY_SECS,
        other => {
            return Err(Error::InvalidConfig(format!(
                "unknown retention period unit '{}' in '{}'",
                other, value
            )))
        }
    };
    scaled(value, amount, unit_secs)
}

/// Parse a scheduler interval: `<n>[s|m|h|d]`, where `m` is minutes.
pub fn parse_interval(value: &str) -> Result<Duration, Error> {
    let value = value.trim();
    let (amount, unit) = split_amount(value)?;
    let unit_secs = match unit {
        "s" => 1,
        "m" => 60,
        "h" => HOUR_SECS,
        "d" => DAY_SECS,
        other => {
            return Err(Error::InvalidConfig(format!(
                "unknown interval unit '{}' in '{}'",
                other, value
            )))
        }
    };
    scaled(value, amount, unit_secs)
}

fn scaled(value: &str, amount: u64, unit_secs: u64) -> Result<Duration, Error> {
    amount
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| Error::InvalidConfig(format!("duration '{}' is too large", value)))
}

fn split_amount(value: &str) -> Result<(u64, &str), Error> {
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("'{}' does not start with a number", value)))?;
    if amount == 0 {
        return Err(Error::InvalidConfig(format!(
            "duration '{}' must be positive",
            value
        )));
    }
    Ok((amount, unit))
}
