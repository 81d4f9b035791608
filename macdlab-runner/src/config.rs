//! TOML analysis configuration.
//!
//! Every section is optional and defaults to the classic setup: the last
//! 1000 bars, MACD 12/26/9 over the weighted-window smoother, Buy gated on
//! a prior Sell, 1000 initial units, and a Δ sweep of 0, 3, …, 27 days.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use macdlab_core::indicators::{MacdParams, SmoothingMethod};
use macdlab_core::CrossoverDetector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration for a batch of stocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Stock names; each resolves to `{data_dir}/{name}.csv`.
    #[serde(default)]
    pub stocks: Vec<String>,

    /// Units held on the first date.
    #[serde(default = "default_initial_balance")]
    pub initial_balance: u64,

    /// Fall back to a synthetic random walk when a CSV is missing.
    #[serde(default)]
    pub synthetic: bool,

    #[serde(default)]
    pub window: Window,

    #[serde(default)]
    pub macd: MacdSettings,

    #[serde(default)]
    pub sweep: SweepConfig,

    #[serde(default)]
    pub problems: ProblemsConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_initial_balance() -> u64 {
    1000
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            stocks: Vec::new(),
            initial_balance: default_initial_balance(),
            synthetic: false,
            window: Window::default(),
            macd: MacdSettings::default(),
            sweep: SweepConfig::default(),
            problems: ProblemsConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_balance == 0 {
            return Err(ConfigError::Invalid("initial_balance must be > 0".into()));
        }
        self.window.validate()?;
        self.macd
            .params()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.sweep.delays()?;
        self.problems.validate()?;
        Ok(())
    }
}

/// Which part of the price history to analyse.
///
/// `count` keeps the trailing N bars; `from`/`to` keep an inclusive date
/// range (either bound may be open). The two forms are exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl Default for Window {
    fn default() -> Self {
        Self::last(1000)
    }
}

impl Window {
    pub fn last(count: usize) -> Self {
        Self {
            count: Some(count),
            from: None,
            to: None,
        }
    }

    pub fn range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            count: None,
            from,
            to,
        }
    }

    pub fn all() -> Self {
        Self::range(None, None)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count.is_some() && (self.from.is_some() || self.to.is_some()) {
            return Err(ConfigError::Invalid(
                "window: use either count or from/to, not both".into(),
            ));
        }
        if self.count == Some(0) {
            return Err(ConfigError::Invalid("window: count must be > 0".into()));
        }
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ConfigError::Invalid(format!(
                    "window: from {from} is after to {to}"
                )));
            }
        }
        Ok(())
    }

    /// Does `date` pass the range bounds? Count windows accept every date.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

/// MACD periods, smoothing formula and the crossover gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdSettings {
    #[serde(default = "default_fast")]
    pub fast: usize,
    #[serde(default = "default_slow")]
    pub slow: usize,
    #[serde(default = "default_signal")]
    pub signal: usize,
    #[serde(default)]
    pub smoothing: SmoothingMethod,
    #[serde(default = "default_require_prior_sell")]
    pub require_prior_sell: bool,
}

fn default_fast() -> usize {
    12
}

fn default_slow() -> usize {
    26
}

fn default_signal() -> usize {
    9
}

fn default_require_prior_sell() -> bool {
    true
}

impl Default for MacdSettings {
    fn default() -> Self {
        Self {
            fast: default_fast(),
            slow: default_slow(),
            signal: default_signal(),
            smoothing: SmoothingMethod::default(),
            require_prior_sell: default_require_prior_sell(),
        }
    }
}

impl MacdSettings {
    pub fn params(&self) -> MacdParams {
        MacdParams {
            fast: self.fast,
            slow: self.slow,
            signal: self.signal,
            smoothing: self.smoothing,
        }
    }

    pub fn detector(&self) -> CrossoverDetector {
        CrossoverDetector::new(self.require_prior_sell)
    }
}

/// Upper bound on the number of Δ values one sweep may expand to.
pub const MAX_SWEEP_DELAYS: i64 = 10_000;

/// Widest fragment margin accepted, in days.
pub const MAX_MARGIN_DAYS: i64 = 3650;

/// Δ values to sweep: `start, start + step, …` while `< end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default)]
    pub start: i64,
    #[serde(default = "default_sweep_end")]
    pub end: i64,
    #[serde(default = "default_sweep_step")]
    pub step: i64,
}

fn default_sweep_end() -> i64 {
    30
}

fn default_sweep_step() -> i64 {
    3
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            start: 0,
            end: default_sweep_end(),
            step: default_sweep_step(),
        }
    }
}

impl SweepConfig {
    pub fn delays(&self) -> Result<Vec<i64>, ConfigError> {
        if self.step <= 0 {
            return Err(ConfigError::Invalid(format!(
                "sweep: step must be > 0, got {}",
                self.step
            )));
        }
        if self.start < 0 || self.start >= self.end {
            return Err(ConfigError::Invalid(format!(
                "sweep: empty range {}..{}",
                self.start, self.end
            )));
        }
        // end > start >= 0, so the span cannot overflow
        let count = (self.end - self.start - 1) / self.step + 1;
        if count > MAX_SWEEP_DELAYS {
            return Err(ConfigError::Invalid(format!(
                "sweep: {}..{} step {} expands to {count} delays (max {MAX_SWEEP_DELAYS})",
                self.start, self.end, self.step
            )));
        }
        Ok((self.start..self.end).step_by(self.step as usize).collect())
    }
}

/// How many losing trades to report and how wide a window to cut around each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemsConfig {
    #[serde(default = "default_problem_limit")]
    pub limit: usize,
    #[serde(default = "default_margin_days")]
    pub margin_days: i64,
}

fn default_problem_limit() -> usize {
    5
}

fn default_margin_days() -> i64 {
    30
}

impl Default for ProblemsConfig {
    fn default() -> Self {
        Self {
            limit: default_problem_limit(),
            margin_days: default_margin_days(),
        }
    }
}

impl ProblemsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=MAX_MARGIN_DAYS).contains(&self.margin_days) {
            return Err(ConfigError::Invalid(format!(
                "problems: margin_days must be in 0..={MAX_MARGIN_DAYS}, got {}",
                self.margin_days
            )));
        }
        Ok(())
    }
}
