use serde::{Deserialize, Serialize};

use crate::config::NormalizationSettings;
use crate::models::{CustomFactor, DailyRecord};

/// Per-day contributions produced before the batch-level sleep verdict is known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetrics {
    /// Study load on a 0-10 scale
    pub normalized_study: f64,

    pub stress_contrib: f64,

    /// Sum of positive custom impacts
    pub positive_custom_contrib: f64,

    /// Sum of negative custom impacts (≤ 0)
    pub negative_custom_contrib: f64,

    /// Sleep hours with the default substituted for unlogged days
    pub sleep_hours: f64,
}

/// Split of custom factor impacts into aggravating and protective totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactSplit {
    pub positive: f64,
    pub negative: f64,
}

/// Converts raw daily records into normalized numeric contributions
pub struct MetricNormalizer {
    settings: NormalizationSettings,
}

impl MetricNormalizer {
    pub fn new() -> Self {
        MetricNormalizer {
            settings: NormalizationSettings::default(),
        }
    }

    pub fn with_settings(settings: NormalizationSettings) -> Self {
        MetricNormalizer { settings }
    }

    /// Normalize one record
    pub fn normalize(&self, record: &DailyRecord) -> NormalizedMetrics {
        let impacts = Self::split_impacts(&record.custom_factors);

        NormalizedMetrics {
            normalized_study: self.normalize_study(record.study_minutes),
            stress_contrib: self.normalize_stress(record.stress),
            positive_custom_contrib: impacts.positive,
            negative_custom_contrib: impacts.negative,
            sleep_hours: record.sleep_or(self.settings.default_sleep_hours),
        }
    }

    /// Stress as given, clamped non-negative
    pub fn normalize_stress(&self, stress: f64) -> f64 {
        if stress.is_finite() {
            stress.max(0.0)
        } else {
            0.0
        }
    }

    /// Map study minutes onto 0-10, saturating at the cap
    ///
    /// Negative or non-finite minutes count as no study.
    pub fn normalize_study(&self, study_minutes: f64) -> f64 {
        let cap = self.settings.study_cap_minutes;
        if !study_minutes.is_finite() || study_minutes <= 0.0 {
            return 0.0;
        }
        study_minutes.min(cap) / cap * 10.0
    }

    /// Accumulate level × effect into positive and negative totals
    pub fn split_impacts(factors: &[CustomFactor]) -> ImpactSplit {
        factors
            .iter()
            .map(CustomFactor::impact)
            .fold(ImpactSplit::default(), |mut split, impact| {
                if impact > 0.0 {
                    split.positive += impact;
                } else if impact < 0.0 {
                    split.negative += impact;
                }
                split
            })
    }
}

impl Default for MetricNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
