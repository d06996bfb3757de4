//! Sleep vulnerability meta-analysis
//!
//! Decides once per batch whether sleep deficit should count toward the
//! composite load. The most recent day is left out of its own baseline.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::VulnerabilitySettings;
use crate::stats::round_to;

/// Batch-level verdict on whether low sleep drives symptoms for this user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityVerdict {
    pub is_vulnerable: bool,

    /// Low-sleep days with high symptoms divided by low-sleep days; `None` if not computed
    pub ratio: Option<f64>,

    pub low_sleep_days: usize,

    pub high_symptom_days: usize,

    /// Human-readable explanation
    pub reason: String,
}

impl VulnerabilityVerdict {
    fn insufficient(low_sleep_days: usize, required: usize) -> Self {
        VulnerabilityVerdict {
            is_vulnerable: false,
            ratio: None,
            low_sleep_days,
            high_symptom_days: 0,
            reason: format!(
                "Insufficient data points (<{}) with low sleep for correlation check.",
                required
            ),
        }
    }
}

/// One day's sleep and symptom observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepObservation {
    pub sleep_hours: f64,
    pub tic_count: u32,
}

pub struct SleepVulnerabilityAnalyzer {
    settings: VulnerabilitySettings,
}

impl SleepVulnerabilityAnalyzer {
    pub fn new() -> Self {
        SleepVulnerabilityAnalyzer {
            settings: VulnerabilitySettings::default(),
        }
    }

    pub fn with_settings(settings: VulnerabilitySettings) -> Self {
        SleepVulnerabilityAnalyzer { settings }
    }

    /// Assess a date-ordered batch, excluding its last day when more than one exists
    pub fn assess(&self, batch: &[SleepObservation]) -> VulnerabilityVerdict {
        let history = if batch.len() > 1 {
            &batch[..batch.len() - 1]
        } else {
            batch
        };
        self.assess_history(history)
    }

    /// Assess an already-trimmed history
    pub fn assess_history(&self, history: &[SleepObservation]) -> VulnerabilityVerdict {
        let low_sleep: Vec<&SleepObservation> = history
            .iter()
            .filter(|obs| obs.sleep_hours <= self.settings.low_sleep_hours)
            .collect();

        if low_sleep.is_empty() || low_sleep.len() < self.settings.min_low_sleep_days {
            debug!(
                low_sleep_days = low_sleep.len(),
                required = self.settings.min_low_sleep_days,
                "Too few low-sleep days for a vulnerability verdict"
            );
            return VulnerabilityVerdict::insufficient(
                low_sleep.len(),
                self.settings.min_low_sleep_days,
            );
        }

        let high_symptom = low_sleep
            .iter()
            .filter(|obs| obs.tic_count >= self.settings.high_symptom_count)
            .count();

        let ratio = high_symptom as f64 / low_sleep.len() as f64;
        let is_vulnerable = ratio >= self.settings.vulnerable_ratio;

        debug!(
            low_sleep_days = low_sleep.len(),
            high_symptom_days = high_symptom,
            ratio,
            is_vulnerable,
            "Sleep vulnerability assessed"
        );

        VulnerabilityVerdict {
            is_vulnerable,
            ratio: Some(round_to(ratio, 2)),
            low_sleep_days: low_sleep.len(),
            high_symptom_days: high_symptom,
            reason: format!(
                "Baseline check: {} of {} low-sleep days had high symptoms. Correlation ratio: {:.2}.",
                high_symptom,
                low_sleep.len(),
                ratio
            ),
        }
    }
}

impl Default for SleepVulnerabilityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(sleep_hours: f64, tic_count: u32) -> SleepObservation {
        SleepObservation {
            sleep_hours,
            tic_count,
        }
    }

    #[test]
    fn test_two_low_sleep_days_never_vulnerable() {
        let analyzer = SleepVulnerabilityAnalyzer::new();
        let history = vec![obs(4.0, 20), obs(5.0, 30), obs(8.0, 1), obs(9.0, 0)];

        let verdict = analyzer.assess_history(&history);
        assert!(!verdict.is_vulnerable);
        assert_eq!(verdict.ratio, None);
        assert_eq!(verdict.low_sleep_days, 2);
        assert!(verdict.reason.contains("Insufficient"));
    }

    #[test]
    fn test_three_high_symptom_low_sleep_days_vulnerable() {
        let analyzer = SleepVulnerabilityAnalyzer::new();
        let history = vec![obs(4.0, 8), obs(6.0, 5), obs(5.5, 12), obs(8.0, 1)];

        let verdict = analyzer.assess_history(&history);
        assert!(verdict.is_vulnerable);
        assert_eq!(verdict.ratio, Some(1.0));
        assert_eq!(verdict.high_symptom_days, 3);
    }

    #[test]
    fn test_ratio_below_threshold() {
        let analyzer = SleepVulnerabilityAnalyzer::new();
        // 2 of 3 = 0.67 < 0.70
        let history = vec![obs(4.0, 8), obs(5.0, 9), obs(5.5, 1)];

        let verdict = analyzer.assess_history(&history);
        assert!(!verdict.is_vulnerable);
        assert_eq!(verdict.ratio, Some(0.67));
    }

    #[test]
    fn test_last_day_excluded() {
        let analyzer = SleepVulnerabilityAnalyzer::new();
        // The third low-sleep day is the latest one and must not count
        let batch = vec![obs(4.0, 8), obs(5.0, 9), obs(8.0, 0), obs(3.0, 15)];

        let verdict = analyzer.assess(&batch);
        assert!(!verdict.is_vulnerable);
        assert_eq!(verdict.low_sleep_days, 2);
    }

    #[test]
    fn test_single_day_batch_uses_itself() {
        let analyzer = SleepVulnerabilityAnalyzer::new();
        let verdict = analyzer.assess(&[obs(4.0, 10)]);
        assert_eq!(verdict.low_sleep_days, 1);
        assert!(!verdict.is_vulnerable);
    }
}
