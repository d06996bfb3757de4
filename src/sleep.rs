//! Sleep and symptom correlation
//!
//! Looks at the most recent window of days and answers three questions:
//! how much the user sleeps, how strongly sleep tracks symptom counts
//! (Pearson r), and which amount of sleep the user's own best days share.
//!
//! # Personal optimal sleep
//!
//! Days are ordered by symptom count. The sleep hours of the lowest third
//! ("best days") average to the optimal sleep; the highest third gives the
//! worst sleep. Nights within the good tolerance of the optimum form the
//! good bucket, nights beyond the bad tolerance form the bad bucket, and the
//! two buckets' average symptom counts are compared as a percentage.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::SleepSettings;
use crate::error::AnalysisError;
use crate::models::DailyRecord;
use crate::stats::{self, round_to};

const ANALYSIS_NAME: &str = "sleep analysis";

/// Sleep amount tier relative to the 7-9 hour recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SleepAmount {
    /// Under 6 hours
    Short,
    /// 6 to under 7 hours
    NearRecommended,
    /// 7 to 9 hours
    Healthy,
    /// Over 9 hours
    Long,
}

impl SleepAmount {
    pub fn from_hours(hours: f64) -> Self {
        if hours < 6.0 {
            SleepAmount::Short
        } else if hours < 7.0 {
            SleepAmount::NearRecommended
        } else if hours <= 9.0 {
            SleepAmount::Healthy
        } else {
            SleepAmount::Long
        }
    }

    fn statement(&self, hours: f64) -> String {
        match self {
            SleepAmount::Short => format!(
                "You're averaging only {:.1} hours of sleep per night - that's below the recommended 7-9 hours.",
                hours
            ),
            SleepAmount::NearRecommended => format!(
                "You're averaging {:.1} hours of sleep per night - close to the recommended 7-9 hour range.",
                hours
            ),
            SleepAmount::Healthy => format!(
                "You're averaging {:.1} hours of sleep per night - that's in the healthy range!",
                hours
            ),
            SleepAmount::Long => format!(
                "You're averaging {:.1} hours of sleep per night - more than the typical 7-9 hour recommendation.",
                hours
            ),
        }
    }
}

/// Strength and direction of the sleep/symptom correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationStrength {
    /// r ≤ -0.7
    VeryStrong,
    /// -0.7 < r ≤ -0.5
    Strong,
    /// -0.5 < r ≤ -0.3
    Moderate,
    /// -0.3 < r ≤ -0.1
    Weak,
    /// -0.1 < r < 0.1
    VeryWeak,
    /// r ≥ 0.1
    Positive,
}

impl CorrelationStrength {
    pub fn from_coefficient(r: f64) -> Self {
        if r <= -0.7 {
            CorrelationStrength::VeryStrong
        } else if r <= -0.5 {
            CorrelationStrength::Strong
        } else if r <= -0.3 {
            CorrelationStrength::Moderate
        } else if r <= -0.1 {
            CorrelationStrength::Weak
        } else if r < 0.1 {
            CorrelationStrength::VeryWeak
        } else {
            CorrelationStrength::Positive
        }
    }

    fn statement(&self, r: f64) -> String {
        match self {
            CorrelationStrength::VeryStrong => format!(
                "Your sleep-tic connection is VERY STRONG ({:.2}). The closer this number is to -1, the more sleep helps reduce your tics. Your data shows more sleep dramatically reduces your tic count!",
                r
            ),
            CorrelationStrength::Strong => format!(
                "Your sleep-tic connection is STRONG ({:.2}). The closer to -1, the stronger the connection. More sleep significantly reduces your tics.",
                r
            ),
            CorrelationStrength::Moderate => format!(
                "Your sleep-tic connection is MODERATE ({:.2}). Numbers closer to -1 mean stronger connection. More sleep tends to reduce your tics.",
                r
            ),
            CorrelationStrength::Weak => format!(
                "Your sleep-tic connection is WEAK ({:.2}). Sleep has a small effect on your tics. Other factors might be more important.",
                r
            ),
            CorrelationStrength::VeryWeak => format!(
                "Your sleep-tic connection is VERY WEAK ({:.2}). Sleep doesn't show a clear pattern with your tics yet. Other factors are likely more important.",
                r
            ),
            CorrelationStrength::Positive => format!(
                "Your sleep-tic connection is POSITIVE ({:.2}). This is unusual - more sleep correlates with more tics, so sleep quality, stress or diet likely matter more than sleep quantity.",
                r
            ),
        }
    }
}

impl fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CorrelationStrength::VeryStrong => "Very strong",
            CorrelationStrength::Strong => "Strong",
            CorrelationStrength::Moderate => "Moderate",
            CorrelationStrength::Weak => "Weak",
            CorrelationStrength::VeryWeak => "Very weak",
            CorrelationStrength::Positive => "Positive",
        };
        write!(f, "{}", label)
    }
}

/// Completed sleep analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepAnalysisResult {
    /// Mean logged sleep, 1 decimal
    pub avg_sleep_hours: f64,

    /// Pearson r between sleep hours and tic count, 2 decimals
    pub correlation_coefficient: f64,

    pub correlation_strength: CorrelationStrength,

    /// Mean sleep on the lowest-symptom third of days, 1 decimal
    pub optimal_sleep_hours: f64,

    /// Mean sleep on the highest-symptom third of days, 1 decimal
    pub worst_sleep_hours: f64,

    /// Mean tics on nights near the optimum, 1 decimal
    pub avg_tics_good_sleep: Option<f64>,

    /// Mean tics on nights far from the optimum, 1 decimal
    pub avg_tics_bad_sleep: Option<f64>,

    /// (bad - good) / good × 100, rounded to an integer
    pub percent_difference: Option<f64>,

    pub insight_message: String,

    /// Days with logged sleep inside the window
    pub days_analyzed: usize,
}

/// Sleep analysis outcome as published in reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SleepOutcome {
    Analyzed(SleepAnalysisResult),
    InsufficientData { message: String },
}

impl SleepOutcome {
    pub fn result(&self) -> Option<&SleepAnalysisResult> {
        match self {
            SleepOutcome::Analyzed(result) => Some(result),
            SleepOutcome::InsufficientData { .. } => None,
        }
    }
}

impl From<Result<SleepAnalysisResult, AnalysisError>> for SleepOutcome {
    fn from(result: Result<SleepAnalysisResult, AnalysisError>) -> Self {
        match result {
            Ok(analysis) => SleepOutcome::Analyzed(analysis),
            Err(err) => SleepOutcome::InsufficientData {
                message: match err {
                    AnalysisError::InsufficientData { reason, .. } => reason,
                    other => other.to_string(),
                },
            },
        }
    }
}

pub struct SleepCorrelationEngine {
    settings: SleepSettings,
}

impl SleepCorrelationEngine {
    pub fn new() -> Self {
        SleepCorrelationEngine {
            settings: SleepSettings::default(),
        }
    }

    pub fn with_settings(settings: SleepSettings) -> Self {
        SleepCorrelationEngine { settings }
    }

    /// Analyze a date-ordered batch of records
    pub fn analyze(&self, records: &[DailyRecord]) -> Result<SleepAnalysisResult, AnalysisError> {
        if records.len() < self.settings.min_days {
            return Err(AnalysisError::insufficient(
                ANALYSIS_NAME,
                format!(
                    "Not enough data. Track for at least {} days.",
                    self.settings.min_days
                ),
            ));
        }

        let window_start = records.len().saturating_sub(self.settings.window_days);
        let (sleep_hours, tic_counts): (Vec<f64>, Vec<f64>) = records[window_start..]
            .iter()
            .filter_map(|r| r.logged_sleep().map(|s| (s, r.tic_count as f64)))
            .unzip();

        if sleep_hours.len() < self.settings.min_logged_days {
            return Err(AnalysisError::insufficient(
                ANALYSIS_NAME,
                "Not enough days with sleep data logged.",
            ));
        }

        let avg_sleep = round_to(stats::mean(&sleep_hours), 1);
        let correlation = round_to(stats::pearson(&sleep_hours, &tic_counts), 2);

        let (optimal_sleep, worst_sleep) = Self::optimal_sleep(&sleep_hours, &tic_counts, avg_sleep);

        let mut good_tics = Vec::new();
        let mut bad_tics = Vec::new();
        for (sleep, tics) in sleep_hours.iter().zip(&tic_counts) {
            let distance = (sleep - optimal_sleep).abs();
            if distance <= self.settings.good_tolerance_hours {
                good_tics.push(*tics);
            } else if distance > self.settings.bad_tolerance_hours {
                bad_tics.push(*tics);
            }
        }

        let avg_good = (!good_tics.is_empty()).then(|| round_to(stats::mean(&good_tics), 1));
        let avg_bad = (!bad_tics.is_empty()).then(|| round_to(stats::mean(&bad_tics), 1));
        let percent_difference = match (avg_good, avg_bad) {
            (Some(good), Some(bad)) if good > 0.0 => Some(((bad - good) / good * 100.0).round()),
            _ => None,
        };

        debug!(
            days = sleep_hours.len(),
            avg_sleep,
            correlation,
            optimal_sleep,
            good_nights = good_tics.len(),
            bad_nights = bad_tics.len(),
            "Sleep correlation computed"
        );

        let strength = CorrelationStrength::from_coefficient(correlation);
        let insight_message = Self::insight(
            avg_sleep,
            correlation,
            strength,
            optimal_sleep,
            avg_good,
            avg_bad,
            percent_difference,
        );

        Ok(SleepAnalysisResult {
            avg_sleep_hours: avg_sleep,
            correlation_coefficient: correlation,
            correlation_strength: strength,
            optimal_sleep_hours: optimal_sleep,
            worst_sleep_hours: worst_sleep,
            avg_tics_good_sleep: avg_good,
            avg_tics_bad_sleep: avg_bad,
            percent_difference,
            insight_message,
            days_analyzed: sleep_hours.len(),
        })
    }

    /// Analyze and fold insufficient data into a publishable outcome
    pub fn outcome(&self, records: &[DailyRecord]) -> SleepOutcome {
        self.analyze(records).into()
    }

    /// Mean sleep of the lowest- and highest-symptom thirds of days
    fn optimal_sleep(sleep_hours: &[f64], tic_counts: &[f64], fallback: f64) -> (f64, f64) {
        let mut paired: Vec<(f64, f64)> = tic_counts
            .iter()
            .copied()
            .zip(sleep_hours.iter().copied())
            .collect();
        paired.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let third = paired.len() / 3;
        if third == 0 {
            return (fallback, fallback);
        }

        let best: Vec<f64> = paired[..third].iter().map(|(_, s)| *s).collect();
        let worst: Vec<f64> = paired[paired.len() - third..].iter().map(|(_, s)| *s).collect();

        (round_to(stats::mean(&best), 1), round_to(stats::mean(&worst), 1))
    }

    fn insight(
        avg_sleep: f64,
        correlation: f64,
        strength: CorrelationStrength,
        optimal_sleep: f64,
        good: Option<f64>,
        bad: Option<f64>,
        percent_difference: Option<f64>,
    ) -> String {
        let comparison = match (good, bad, percent_difference) {
            (Some(good), Some(bad), Some(pct)) if pct > 0.0 => format!(
                "Your data shows your personal sweet spot is around {:.1}hrs - on those nights your tics average {:.1}. \
                 When sleep deviates significantly, tics rise to {:.1} - that's a {:.0}% difference!",
                optimal_sleep, good, bad, pct
            ),
            (Some(good), Some(bad), Some(pct)) if pct < 0.0 => format!(
                "Interestingly, nights near {:.1}hrs give you {:.1} avg tics vs {:.1} on other nights.",
                optimal_sleep, good, bad
            ),
            (Some(_), Some(_), Some(_)) => {
                "Your tic levels are similar across different sleep amounts.".to_string()
            }
            _ => "Track a few more days to compare tic levels across sleep amounts.".to_string(),
        };

        format!(
            "{} {} {}",
            SleepAmount::from_hours(avg_sleep).statement(avg_sleep),
            strength.statement(correlation),
            comparison
        )
    }
}

impl Default for SleepCorrelationEngine {
    fn default() -> Self {
        Self::new()
    }
}
