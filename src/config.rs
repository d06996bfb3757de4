use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MyFlowError;

/// Analysis configuration: caps, thresholds and weights for every pipeline stage
///
/// Immutable once handed to a [`crate::analysis::FlowAnalyzer`]; no request
/// state ever lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub normalization: NormalizationSettings,

    #[serde(default)]
    pub load: LoadSettings,

    #[serde(default)]
    pub vulnerability: VulnerabilitySettings,

    #[serde(default)]
    pub pacing: PacingSettings,

    #[serde(default)]
    pub sleep: SleepSettings,

    #[serde(default)]
    pub factors: FactorSettings,
}

/// Metric normalization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationSettings {
    /// Study minutes that map to the top of the 0-10 scale
    pub study_cap_minutes: f64,

    /// Sleep hours assumed for days without a sleep entry
    pub default_sleep_hours: f64,
}

impl Default for NormalizationSettings {
    fn default() -> Self {
        NormalizationSettings {
            study_cap_minutes: 900.0,
            default_sleep_hours: 8.0,
        }
    }
}

/// Composite load settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSettings {
    /// Sleep hours below which a deficit penalty accrues
    pub sleep_threshold_hours: f64,

    /// Penalty per hour of sleep deficit
    pub sleep_penalty_weight: f64,
}

impl Default for LoadSettings {
    fn default() -> Self {
        LoadSettings {
            sleep_threshold_hours: 8.0,
            sleep_penalty_weight: 1.5,
        }
    }
}

/// Sleep vulnerability meta-analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnerabilitySettings {
    /// A day at or below this many sleep hours counts as low sleep
    pub low_sleep_hours: f64,

    /// A day at or above this symptom count counts as high symptom
    pub high_symptom_count: u32,

    /// Minimum low-sleep days before a verdict is attempted
    pub min_low_sleep_days: usize,

    /// Fraction of low-sleep days with high symptoms that confirms vulnerability
    pub vulnerable_ratio: f64,
}

impl Default for VulnerabilitySettings {
    fn default() -> Self {
        VulnerabilitySettings {
            low_sleep_hours: 6.0,
            high_symptom_count: 5,
            min_low_sleep_days: 3,
            vulnerable_ratio: 0.70,
        }
    }
}

/// Baseline and spike detection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    /// Days required before any pacing verdict
    pub min_days: usize,

    /// Trailing days preceding the latest day used as the baseline
    pub baseline_window_days: usize,
}

impl Default for PacingSettings {
    fn default() -> Self {
        PacingSettings {
            min_days: 7,
            baseline_window_days: 7,
        }
    }
}

/// Sleep correlation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepSettings {
    /// Most recent days considered
    pub window_days: usize,

    /// Days required in the whole batch
    pub min_days: usize,

    /// Days with logged sleep required inside the window
    pub min_logged_days: usize,

    /// Distance from optimal sleep that still counts as a good night
    pub good_tolerance_hours: f64,

    /// Distance from optimal sleep beyond which a night counts as bad
    pub bad_tolerance_hours: f64,
}

impl Default for SleepSettings {
    fn default() -> Self {
        SleepSettings {
            window_days: 14,
            min_days: 7,
            min_logged_days: 5,
            good_tolerance_hours: 0.75,
            bad_tolerance_hours: 1.5,
        }
    }
}

/// Protective factor ranking settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorSettings {
    /// Ranked factors kept in the result
    pub top_n: usize,

    /// Lowest-load days reported
    pub best_days: usize,

    /// Name fragments of factors that cannot be repeated daily
    pub rare_factor_keywords: Vec<String>,
}

impl Default for FactorSettings {
    fn default() -> Self {
        FactorSettings {
            top_n: 5,
            best_days: 3,
            rare_factor_keywords: [
                "vacation",
                "vacation day",
                "holiday",
                "beach trip",
                "travel",
                "recovery day",
                "sick day",
                "day off",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl FactorSettings {
    /// Whether a factor name matches the rare/occasional lexicon
    pub fn is_rare(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.rare_factor_keywords
            .iter()
            .any(|keyword| lower.contains(&keyword.to_lowercase()))
    }
}

impl AnalysisConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::load_from_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Write the default configuration to `path`, refusing to overwrite an existing file
    pub fn init_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            anyhow::bail!(
                "Config already exists at {}; remove it first to reinitialize",
                path.display()
            );
        }

        let config = Self::default();
        config.save_to_file(path)?;
        Ok(config)
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".myflow")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %err,
                    "Using default analysis configuration"
                );
                Self::default()
            }
        }
    }

    /// Reject values that would make the pipeline divide by zero or never fire
    pub fn validate(&self) -> std::result::Result<(), MyFlowError> {
        let invalid = |msg: &str| Err(MyFlowError::Configuration(msg.to_string()));

        if self.normalization.study_cap_minutes <= 0.0 {
            return invalid("normalization.study_cap_minutes must be positive");
        }
        if self.normalization.default_sleep_hours < 0.0 {
            return invalid("normalization.default_sleep_hours must not be negative");
        }
        if self.load.sleep_penalty_weight < 0.0 {
            return invalid("load.sleep_penalty_weight must not be negative");
        }
        if !(self.vulnerability.vulnerable_ratio > 0.0 && self.vulnerability.vulnerable_ratio <= 1.0)
        {
            return invalid("vulnerability.vulnerable_ratio must be in (0, 1]");
        }
        if self.pacing.min_days < 2 || self.pacing.baseline_window_days == 0 {
            return invalid("pacing.min_days must be at least 2 and baseline_window_days positive");
        }
        if self.sleep.window_days == 0 || self.sleep.min_logged_days < 2 {
            return invalid("sleep.window_days must be positive and min_logged_days at least 2");
        }
        if self.sleep.good_tolerance_hours < 0.0
            || self.sleep.bad_tolerance_hours < self.sleep.good_tolerance_hours
        {
            return invalid("sleep tolerances must satisfy 0 <= good <= bad");
        }
        if self.factors.top_n == 0 {
            return invalid("factors.top_n must be positive");
        }

        Ok(())
    }
}
