use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LoadSettings, NormalizationSettings, VulnerabilitySettings};
use crate::models::{Batch, DailyRecord, NormalizedDay};
use crate::normalize::MetricNormalizer;
use crate::vulnerability::{SleepObservation, SleepVulnerabilityAnalyzer, VulnerabilityVerdict};

/// Normalized batch together with the sleep verdict that shaped it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadComputation {
    pub batch: Batch,
    pub vulnerability: VulnerabilityVerdict,
}

/// Computes the Total Negative Load (TNL) for every day of a batch
pub struct CompositeLoadCalculator {
    normalizer: MetricNormalizer,
    vulnerability: SleepVulnerabilityAnalyzer,
    settings: LoadSettings,
}

impl CompositeLoadCalculator {
    pub fn new() -> Self {
        CompositeLoadCalculator {
            normalizer: MetricNormalizer::new(),
            vulnerability: SleepVulnerabilityAnalyzer::new(),
            settings: LoadSettings::default(),
        }
    }

    pub fn with_settings(
        normalization: NormalizationSettings,
        vulnerability: VulnerabilitySettings,
        load: LoadSettings,
    ) -> Self {
        CompositeLoadCalculator {
            normalizer: MetricNormalizer::with_settings(normalization),
            vulnerability: SleepVulnerabilityAnalyzer::with_settings(vulnerability),
            settings: load,
        }
    }

    /// Sleep deficit penalty for one day, ignoring the vulnerability verdict
    pub fn sleep_penalty(&self, sleep_hours: f64) -> f64 {
        (self.settings.sleep_threshold_hours - sleep_hours).max(0.0)
            * self.settings.sleep_penalty_weight
    }

    /// Normalize the records, run the vulnerability check and total each day's load
    pub fn compute(&self, records: &[DailyRecord]) -> LoadComputation {
        let unpenalized = Batch::new(
            records
                .iter()
                .map(|record| self.normalized_day(record))
                .collect(),
        );

        let observations: Vec<SleepObservation> = unpenalized
            .days()
            .iter()
            .map(|day| SleepObservation {
                sleep_hours: day.sleep_hours,
                tic_count: day.tic_count,
            })
            .collect();
        let vulnerability = self.vulnerability.assess(&observations);

        let days = unpenalized
            .into_days()
            .into_iter()
            .map(|mut day| {
                if vulnerability.is_vulnerable {
                    day.sleep_penalty_contrib = self.sleep_penalty(day.sleep_hours);
                }
                day.tnl = day.component_sum();
                day
            })
            .collect();

        let batch = Batch::new(days);
        debug!(
            days = batch.len(),
            sleep_penalty_applied = vulnerability.is_vulnerable,
            "Composite load computed"
        );

        LoadComputation {
            batch,
            vulnerability,
        }
    }

    /// Build a day's row with a zero sleep penalty
    fn normalized_day(&self, record: &DailyRecord) -> NormalizedDay {
        let metrics = self.normalizer.normalize(record);
        let mut day = NormalizedDay {
            date: record.date,
            tic_count: record.tic_count,
            sleep_hours: metrics.sleep_hours,
            normalized_study: metrics.normalized_study,
            stress_contrib: metrics.stress_contrib,
            positive_custom_contrib: metrics.positive_custom_contrib,
            negative_custom_contrib: metrics.negative_custom_contrib,
            sleep_penalty_contrib: 0.0,
            tnl: 0.0,
        };
        day.tnl = day.component_sum();
        day
    }
}

impl Default for CompositeLoadCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomFactor;
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_tnl_excludes_protective_impact() {
        let calculator = CompositeLoadCalculator::new();
        let records = vec![DailyRecord::new(date(1))
            .with_stress(3.0)
            .with_study(450.0)
            .with_factor(CustomFactor::new("Exam", 2.0, 1.0))
            .with_factor(CustomFactor::new("Walk", 4.0, -1.0))];

        let result = calculator.compute(&records);
        let day = &result.batch.days()[0];
        assert_eq!(day.tnl, 3.0 + 5.0 + 2.0);
        assert_eq!(day.negative_custom_contrib, -4.0);
        assert_eq!(day.sleep_penalty_contrib, 0.0);
    }

    #[test]
    fn test_no_penalty_without_vulnerability() {
        let calculator = CompositeLoadCalculator::new();
        let records: Vec<DailyRecord> = (1..=5)
            .map(|d| DailyRecord::new(date(d)).with_sleep(4.0).with_tics(1))
            .collect();

        let result = calculator.compute(&records);
        assert!(!result.vulnerability.is_vulnerable);
        assert!(result
            .batch
            .days()
            .iter()
            .all(|day| day.sleep_penalty_contrib == 0.0));
    }

    #[test]
    fn test_penalty_applied_when_vulnerable() {
        let calculator = CompositeLoadCalculator::new();
        let mut records: Vec<DailyRecord> = (1..=4)
            .map(|d| DailyRecord::new(date(d)).with_sleep(5.0).with_tics(9))
            .collect();
        records.push(DailyRecord::new(date(5)).with_sleep(9.0).with_tics(0));
        records.push(DailyRecord::new(date(6)).with_sleep(6.0).with_tics(2));

        let result = calculator.compute(&records);
        assert!(result.vulnerability.is_vulnerable);

        let days = result.batch.days();
        assert_eq!(days[0].sleep_penalty_contrib, 4.5);
        assert_eq!(days[0].tnl, 4.5);
        assert_eq!(days[4].sleep_penalty_contrib, 0.0);
        // The latest day still receives its penalty
        assert_eq!(days[5].sleep_penalty_contrib, 3.0);
    }

    #[test]
    fn test_unlogged_sleep_is_not_penalized() {
        let calculator = CompositeLoadCalculator::new();
        assert_eq!(calculator.sleep_penalty(8.0), 0.0);
        assert_eq!(calculator.sleep_penalty(10.0), 0.0);
        assert_eq!(calculator.sleep_penalty(7.0), 1.5);
    }

    #[test]
    fn test_batch_sorted_by_date() {
        let calculator = CompositeLoadCalculator::new();
        let records = vec![
            DailyRecord::new(date(3)).with_stress(3.0),
            DailyRecord::new(date(1)).with_stress(1.0),
            DailyRecord::new(date(2)).with_stress(2.0),
        ];

        let result = calculator.compute(&records);
        let tnl: Vec<f64> = result.batch.days().iter().map(|d| d.tnl).collect();
        assert_eq!(tnl, vec![1.0, 2.0, 3.0]);
    }
}
