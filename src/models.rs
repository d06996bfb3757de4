use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A user-defined coping or aggravating factor logged on a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFactor {
    /// Factor name as entered by the user (e.g. "Walk outside")
    pub name: String,

    /// Usage intensity multiplier
    pub level: f64,

    /// Signed per-unit impact: negative is protective, positive is aggravating
    pub effect: f64,
}

impl CustomFactor {
    pub fn new(name: impl Into<String>, level: f64, effect: f64) -> Self {
        CustomFactor {
            name: name.into(),
            level,
            effect,
        }
    }

    /// Impact of this factor for the day (level × effect)
    pub fn impact(&self) -> f64 {
        self.level * self.effect
    }

    pub fn is_protective(&self) -> bool {
        self.impact() < 0.0
    }
}

/// One typed day of self-tracked data, produced by ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Calendar date, unique within a batch
    pub date: NaiveDate,

    /// Hours slept; `None` when the day was not logged or the value was malformed
    pub sleep_hours: Option<f64>,

    /// Self-reported stress, nominally 0-10
    pub stress: f64,

    /// Minutes of study or other cognitive work
    pub study_minutes: f64,

    /// Symptom (tic) count for the day
    pub tic_count: u32,

    /// Custom factors in the order they were logged
    pub custom_factors: Vec<CustomFactor>,
}

impl DailyRecord {
    /// Create an empty record for a date with every field at its default
    pub fn new(date: NaiveDate) -> Self {
        DailyRecord {
            date,
            sleep_hours: None,
            stress: 0.0,
            study_minutes: 0.0,
            tic_count: 0,
            custom_factors: Vec::new(),
        }
    }

    pub fn with_sleep(mut self, hours: f64) -> Self {
        self.sleep_hours = Some(hours);
        self
    }

    pub fn with_stress(mut self, stress: f64) -> Self {
        self.stress = stress;
        self
    }

    pub fn with_study(mut self, minutes: f64) -> Self {
        self.study_minutes = minutes;
        self
    }

    pub fn with_tics(mut self, tics: u32) -> Self {
        self.tic_count = tics;
        self
    }

    pub fn with_factor(mut self, factor: CustomFactor) -> Self {
        self.custom_factors.push(factor);
        self
    }

    /// Sleep hours with the healthy default substituted for unlogged days
    pub fn sleep_or(&self, default_hours: f64) -> f64 {
        self.sleep_hours.unwrap_or(default_hours)
    }

    /// Sleep hours only when a positive value was actually logged
    pub fn logged_sleep(&self) -> Option<f64> {
        self.sleep_hours.filter(|hours| *hours > 0.0)
    }
}

/// Normalized load contributions for one day
///
/// Every field except `negative_custom_contrib` is non-negative for valid
/// input. `tnl` is always the sum of the four load columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDay {
    pub date: NaiveDate,

    /// Symptom count carried through for baseline statistics and charting
    pub tic_count: u32,

    /// Sleep hours after default substitution
    pub sleep_hours: f64,

    /// Study load on a 0-10 scale
    pub normalized_study: f64,

    pub stress_contrib: f64,

    /// Sum of positive (aggravating) custom impacts
    pub positive_custom_contrib: f64,

    /// Sum of negative (protective) custom impacts, kept signed
    pub negative_custom_contrib: f64,

    /// Sleep deficit penalty; zero unless the batch is sleep vulnerable
    pub sleep_penalty_contrib: f64,

    /// Total Negative Load
    pub tnl: f64,
}

impl NormalizedDay {
    /// Recompute TNL from the component columns
    pub fn component_sum(&self) -> f64 {
        self.stress_contrib
            + self.normalized_study
            + self.positive_custom_contrib
            + self.sleep_penalty_contrib
    }
}

/// Date-ordered sequence of normalized days for one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    days: Vec<NormalizedDay>,
}

impl Batch {
    /// Build a batch, sorting by date and keeping the last entry for duplicate dates
    pub fn new(mut days: Vec<NormalizedDay>) -> Self {
        days.sort_by_key(|day| day.date);
        let mut deduped: Vec<NormalizedDay> = Vec::with_capacity(days.len());
        for day in days {
            match deduped.last_mut() {
                Some(last) if last.date == day.date => *last = day,
                _ => deduped.push(day),
            }
        }
        Batch { days: deduped }
    }

    pub fn days(&self) -> &[NormalizedDay] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn latest(&self) -> Option<&NormalizedDay> {
        self.days.last()
    }

    /// All days except the most recent one, or the whole batch if it has a single day
    pub fn history(&self) -> &[NormalizedDay] {
        if self.days.len() > 1 {
            &self.days[..self.days.len() - 1]
        } else {
            &self.days
        }
    }

    pub fn into_days(self) -> Vec<NormalizedDay> {
        self.days
    }
}

/// Inclusive date range covered by a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn of_records(records: &[DailyRecord]) -> Option<Self> {
        let start = records.iter().map(|r| r.date).min()?;
        let end = records.iter().map(|r| r.date).max()?;
        Some(DateRange { start, end })
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}
