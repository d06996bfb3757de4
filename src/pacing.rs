use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::PacingSettings;
use crate::models::{Batch, NormalizedDay};
use crate::stats::{self, VarianceEstimator};

/// Baseline thresholds use the sample (n - 1) standard deviation
const BASELINE_ESTIMATOR: VarianceEstimator = VarianceEstimator::Sample;

/// Pacing verdict for the most recent day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PacingState {
    /// Fewer days than needed for a personal baseline
    InsufficientData,
    /// Load and symptoms within the normal range
    GreenLight,
    /// Symptoms spiking while load is normal
    UnusualSpike,
    /// Load spiking while symptoms are stable
    HighLoadWarning,
    /// Load and symptoms both spiking
    AdaptivePacingAlert,
}

impl PacingState {
    /// Decision table over (load spiking, symptoms spiking)
    pub fn classify(load_spiking: bool, tics_spiking: bool) -> Self {
        match (load_spiking, tics_spiking) {
            (true, true) => PacingState::AdaptivePacingAlert,
            (true, false) => PacingState::HighLoadWarning,
            (false, true) => PacingState::UnusualSpike,
            (false, false) => PacingState::GreenLight,
        }
    }

    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            PacingState::InsufficientData => "BASELINE NEEDED",
            PacingState::GreenLight => "GREEN LIGHT",
            PacingState::UnusualSpike => "UNUSUAL SPIKE",
            PacingState::HighLoadWarning => "HIGH LOAD WARNING",
            PacingState::AdaptivePacingAlert => "ADAPTIVE PACING ALERT",
        }
    }

    /// Whether the state calls for the user to change plans
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            PacingState::HighLoadWarning
                | PacingState::UnusualSpike
                | PacingState::AdaptivePacingAlert
        )
    }

    fn message(&self, date: NaiveDate, load: f64, tics: u32, min_days: usize) -> String {
        let day = date.format("%b %d");
        match self {
            PacingState::InsufficientData => format!(
                "Insufficient data (less than {} days) to calculate personalized baseline. Continue tracking.",
                min_days
            ),
            PacingState::AdaptivePacingAlert => format!(
                "**ADAPTIVE PACING ALERT** for {}. Both your Total Negative Load ({:.1}) and Tic Level ({}) are spiking. \
                 Recommendation: **Switch to Micro-Goals** immediately. Break tasks into 15-minute blocks and prioritize recovery.",
                day, load, tics
            ),
            PacingState::HighLoadWarning => format!(
                "**HIGH LOAD WARNING** for {}. Your Total Negative Load ({:.1}) is spiking, but symptoms are stable ({} tics). \
                 Recommendation: **Preventative Rest.** You are coping well, but the underlying load is unsustainable. Schedule a break before the next task.",
                day, load, tics
            ),
            PacingState::UnusualSpike => format!(
                "**UNUSUAL SPIKE** for {}. Tic Level ({}) is spiking, but your calculated Load ({:.1}) is normal. \
                 Recommendation: **Re-Evaluate Custom Factors.** A new, untracked trigger (food, environment, weather) may be at play. Track it now!",
                day, tics, load
            ),
            PacingState::GreenLight => format!(
                "**GREEN LIGHT!** for {}. Your load ({:.1}) and symptoms ({} tics) are stable and within your normal range. \
                 Recommendation: **Maintain Momentum.** Your current pacing and coping strategies are effective.",
                day, load, tics
            ),
        }
    }
}

impl fmt::Display for PacingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Mean and standard deviation of the baseline window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    pub window_days: usize,
    pub mean_load: f64,
    pub std_load: f64,
    pub mean_tics: f64,
    pub std_tics: f64,
    pub tics_threshold: f64,
}

/// Pacing recommendation for the latest day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingResult {
    pub state: PacingState,
    pub message: String,

    /// TNL of the latest day; 0.0 when there is not enough data
    pub latest_load: f64,

    /// Mean + 1 standard deviation of baseline TNL; 0.0 when there is not enough data
    pub load_threshold: f64,

    pub latest_date: Option<NaiveDate>,

    pub latest_tics: Option<u32>,

    pub baseline: Option<BaselineStats>,
}

/// Personalized 1-sigma spike detector
pub struct PacingDetector {
    settings: PacingSettings,
}

impl PacingDetector {
    pub fn new() -> Self {
        PacingDetector {
            settings: PacingSettings::default(),
        }
    }

    pub fn with_settings(settings: PacingSettings) -> Self {
        PacingDetector { settings }
    }

    /// Classify the most recent day of the batch
    pub fn evaluate(&self, batch: &Batch) -> PacingResult {
        let days = batch.days();
        let latest = match days.last() {
            Some(latest) if days.len() >= self.settings.min_days => latest,
            _ => return self.insufficient(days.len()),
        };

        let window = self.baseline_window(days);
        let loads: Vec<f64> = window.iter().map(|d| d.tnl).collect();
        let tics: Vec<f64> = window.iter().map(|d| d.tic_count as f64).collect();

        let mean_load = stats::mean(&loads);
        let std_load = stats::std_dev(&loads, BASELINE_ESTIMATOR);
        let mean_tics = stats::mean(&tics);
        let std_tics = stats::std_dev(&tics, BASELINE_ESTIMATOR);

        let load_threshold = mean_load + std_load;
        let tics_threshold = mean_tics + std_tics;

        let load_spiking = latest.tnl > load_threshold;
        let tics_spiking = latest.tic_count as f64 > tics_threshold;
        let state = PacingState::classify(load_spiking, tics_spiking);

        debug!(
            date = %latest.date,
            latest_load = latest.tnl,
            load_threshold,
            latest_tics = latest.tic_count,
            tics_threshold,
            state = %state,
            "Pacing state evaluated"
        );

        PacingResult {
            state,
            message: state.message(
                latest.date,
                latest.tnl,
                latest.tic_count,
                self.settings.min_days,
            ),
            latest_load: latest.tnl,
            load_threshold,
            latest_date: Some(latest.date),
            latest_tics: Some(latest.tic_count),
            baseline: Some(BaselineStats {
                window_days: window.len(),
                mean_load,
                std_load,
                mean_tics,
                std_tics,
                tics_threshold,
            }),
        }
    }

    /// Trailing window immediately preceding the latest day
    fn baseline_window<'a>(&self, days: &'a [NormalizedDay]) -> &'a [NormalizedDay] {
        let end = days.len() - 1;
        let start = end.saturating_sub(self.settings.baseline_window_days);
        &days[start..end]
    }

    fn insufficient(&self, available: usize) -> PacingResult {
        debug!(
            available,
            required = self.settings.min_days,
            "Not enough days for a pacing baseline"
        );
        let state = PacingState::InsufficientData;
        PacingResult {
            state,
            message: state.message(
                NaiveDate::MIN,
                0.0,
                0,
                self.settings.min_days,
            ),
            latest_load: 0.0,
            load_threshold: 0.0,
            latest_date: None,
            latest_tics: None,
            baseline: None,
        }
    }
}

impl Default for PacingDetector {
    fn default() -> Self {
        Self::new()
    }
}
