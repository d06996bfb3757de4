//! Protective factor ranking
//!
//! Attributes symptom reduction to individual protective custom factors by
//! comparing the average symptom count on days a factor was used against
//! the days it was not used, and surfaces the lowest-load days.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::debug;

use crate::config::{FactorSettings, NormalizationSettings};
use crate::models::DailyRecord;
use crate::normalize::MetricNormalizer;
use crate::stats::{self, round_to};

/// Loads closer than this are the same value up to summation error
const TNL_TIE_EPSILON: f64 = 1e-9;

/// Effectiveness summary for one protective factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorEffect {
    pub name: String,

    /// Mean absolute impact per usage, 2 decimals
    pub avg_impact: f64,

    /// Number of protective usages (a factor logged twice on one day counts twice)
    pub times_used: usize,

    /// Mean tics on days the factor was used, 1 decimal
    pub avg_tics_with: f64,

    /// Mean tics on the remaining days, 1 decimal
    pub avg_tics_without: f64,

    /// Relative symptom reduction in percent, 1 decimal
    pub tic_reduction_pct: f64,
}

/// Podium marker for the lowest-load days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// Medal for a 1-based competition rank
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Medal::Gold => "🥇",
            Medal::Silver => "🥈",
            Medal::Bronze => "🥉",
        }
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.emoji())
    }
}

/// A day ranked by its unpenalized load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestDay {
    /// 1-based competition rank; equal loads share a rank
    pub rank: usize,

    pub medal: Option<Medal>,

    pub date: chrono::NaiveDate,

    /// Load without the sleep penalty
    pub tnl: f64,

    pub tic_count: u32,

    /// Names of protective factors used that day, in logged order
    pub protective_factors: Vec<String>,
}

/// Complete protective factor analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectiveFactorResult {
    /// Top factors by reduction, most effective first
    pub ranked_factors: Vec<FactorEffect>,

    pub best_factor: Option<FactorEffect>,

    pub lowest_tnl_day: Option<BestDay>,

    pub top_best_days: Vec<BestDay>,

    pub insight_message: String,

    pub days_analyzed: usize,
}

/// Per-day inputs gathered in one pass over the records
struct DaySummary {
    date: chrono::NaiveDate,
    tnl: f64,
    tic_count: u32,
    protective_factors: Vec<String>,
}

#[derive(Default)]
struct FactorUsage {
    days: BTreeSet<usize>,
    tic_counts: Vec<f64>,
    total_impact: f64,
    usage_count: usize,
}

pub struct ProtectiveFactorRanker {
    normalizer: MetricNormalizer,
    settings: FactorSettings,
}

impl ProtectiveFactorRanker {
    pub fn new() -> Self {
        ProtectiveFactorRanker {
            normalizer: MetricNormalizer::new(),
            settings: FactorSettings::default(),
        }
    }

    pub fn with_settings(normalization: NormalizationSettings, settings: FactorSettings) -> Self {
        ProtectiveFactorRanker {
            normalizer: MetricNormalizer::with_settings(normalization),
            settings,
        }
    }

    /// Rank protective factors across a date-ordered batch of raw records
    pub fn rank(&self, records: &[DailyRecord]) -> ProtectiveFactorResult {
        let mut order: Vec<String> = Vec::new();
        let mut usage: HashMap<String, FactorUsage> = HashMap::new();
        let mut days = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let impacts = MetricNormalizer::split_impacts(&record.custom_factors);
            let tnl = self.normalizer.normalize_stress(record.stress)
                + self.normalizer.normalize_study(record.study_minutes)
                + impacts.positive;

            let mut protective_today = Vec::new();
            for factor in record.custom_factors.iter().filter(|f| f.is_protective()) {
                if !usage.contains_key(&factor.name) {
                    order.push(factor.name.clone());
                }
                let entry = usage.entry(factor.name.clone()).or_default();
                entry.days.insert(index);
                entry.tic_counts.push(record.tic_count as f64);
                entry.total_impact += factor.impact().abs();
                entry.usage_count += 1;
                protective_today.push(factor.name.clone());
            }

            days.push(DaySummary {
                date: record.date,
                tnl,
                tic_count: record.tic_count,
                protective_factors: protective_today,
            });
        }

        let mut effects: Vec<FactorEffect> = order
            .iter()
            .filter_map(|name| usage.get(name).map(|u| Self::effect(name, u, &days)))
            .collect();

        // Stable: equal reductions keep first-seen order
        effects.sort_by(|a, b| {
            b.tic_reduction_pct
                .partial_cmp(&a.tic_reduction_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        effects.truncate(self.settings.top_n);

        let top_best_days = self.best_days(&days);
        let lowest_tnl_day = top_best_days.first().cloned();
        let best_factor = effects.first().cloned();

        debug!(
            days = days.len(),
            factors = effects.len(),
            best = best_factor.as_ref().map(|f| f.name.as_str()),
            "Protective factors ranked"
        );

        let insight_message = self.insight(best_factor.as_ref(), &effects, lowest_tnl_day.as_ref());

        ProtectiveFactorResult {
            ranked_factors: effects,
            best_factor,
            lowest_tnl_day,
            top_best_days,
            insight_message,
            days_analyzed: days.len(),
        }
    }

    fn effect(name: &str, usage: &FactorUsage, days: &[DaySummary]) -> FactorEffect {
        let avg_with = stats::mean(&usage.tic_counts);
        let without: Vec<f64> = days
            .iter()
            .enumerate()
            .filter(|(index, _)| !usage.days.contains(index))
            .map(|(_, day)| day.tic_count as f64)
            .collect();
        let avg_without = if without.is_empty() {
            avg_with
        } else {
            stats::mean(&without)
        };

        let reduction = if avg_without > 0.0 {
            (avg_without - avg_with) / avg_without * 100.0
        } else {
            0.0
        };

        FactorEffect {
            name: name.to_string(),
            avg_impact: round_to(usage.total_impact / usage.usage_count.max(1) as f64, 2),
            times_used: usage.usage_count,
            avg_tics_with: round_to(avg_with, 1),
            avg_tics_without: round_to(avg_without, 1),
            tic_reduction_pct: round_to(reduction, 1),
        }
    }

    /// Lowest-load days with competition ranking on the displayed load
    fn best_days(&self, days: &[DaySummary]) -> Vec<BestDay> {
        let mut sorted: Vec<&DaySummary> = days.iter().collect();
        sorted.sort_by(|a, b| a.tnl.partial_cmp(&b.tnl).unwrap_or(std::cmp::Ordering::Equal));

        let mut ranked: Vec<BestDay> = Vec::with_capacity(self.settings.best_days);
        for (position, day) in sorted.into_iter().take(self.settings.best_days).enumerate() {
            let rank = match ranked.last() {
                Some(previous) if (previous.tnl - day.tnl).abs() < TNL_TIE_EPSILON => previous.rank,
                _ => position + 1,
            };
            ranked.push(BestDay {
                rank,
                medal: Medal::for_rank(rank),
                date: day.date,
                tnl: day.tnl,
                tic_count: day.tic_count,
                protective_factors: day.protective_factors.clone(),
            });
        }
        ranked
    }

    fn insight(
        &self,
        best: Option<&FactorEffect>,
        ranked: &[FactorEffect],
        lowest: Option<&BestDay>,
    ) -> String {
        let mut sections = Vec::new();

        if let Some(best) = best {
            sections.push(self.best_factor_sentence(best, ranked));
        }

        if let Some(day) = lowest {
            let date = day.date.format("%b %d");
            if day.protective_factors.is_empty() {
                sections.push(format!(
                    "🌟 **Your Best Day: {}** - TNL was {:.1} with {} tics.",
                    date, day.tnl, day.tic_count
                ));
            } else {
                sections.push(format!(
                    "🌟 **Your Best Day: {}** - TNL was only {:.1} with just {} tics! \
                     What worked: {}. Try to recreate these conditions!",
                    date,
                    day.tnl,
                    day.tic_count,
                    day.protective_factors.join(", ")
                ));
            }
        }

        if ranked.len() >= 2 {
            let lines: Vec<String> = ranked
                .iter()
                .enumerate()
                .map(|(i, factor)| {
                    let marker = Medal::for_rank(i + 1)
                        .map(|m| m.emoji().to_string())
                        .unwrap_or_else(|| format!("{}.", i + 1));
                    format!(
                        "{} {}: {:.0}% reduction (used {}x)",
                        marker, factor.name, factor.tic_reduction_pct, factor.times_used
                    )
                })
                .collect();
            sections.push(format!(
                "📋 **Your Protective Factor Ranking:**\n{}",
                lines.join("\n")
            ));
        }

        if sections.is_empty() {
            "Track more days with protective factors to see insights!".to_string()
        } else {
            sections.join("\n\n")
        }
    }

    fn best_factor_sentence(&self, best: &FactorEffect, ranked: &[FactorEffect]) -> String {
        let name = &best.name;
        let reduction = best.tic_reduction_pct;

        if reduction > 20.0 {
            if !self.settings.is_rare(name) {
                return format!(
                    "🏆 **Your MVP Protective Factor: {}!** When you use this, your tics drop by {:.0}% on average \
                     (from {:.1} to {:.1} tics). You've used it {} time(s) - this is your secret weapon for high-stress days!",
                    name, reduction, best.avg_tics_without, best.avg_tics_with, best.times_used
                );
            }

            let alternative = ranked
                .iter()
                .find(|f| !self.settings.is_rare(&f.name) && f.tic_reduction_pct > 0.0);
            return match alternative {
                Some(alt) => format!(
                    "🏆 **Your MVP Protective Factor: {}!** When you use this, your tics drop by {:.0}% on average \
                     (from {:.1} to {:.1} tics). But since you can't take a {} every day, try **{}** instead - \
                     it's your best daily option with a {:.0}% reduction!",
                    name,
                    reduction,
                    best.avg_tics_without,
                    best.avg_tics_with,
                    name.to_lowercase(),
                    alt.name,
                    alt.tic_reduction_pct
                ),
                None => format!(
                    "🏆 **Your MVP Protective Factor: {}!** When you use this, your tics drop by {:.0}% on average. \
                     Since you can't do this daily, try to capture what makes it helpful \
                     (rest? nature? no stress?) and add small versions to your routine.",
                    name, reduction
                ),
            };
        }

        if reduction > 10.0 {
            format!(
                "⭐ **Top Helper: {}** reduces your tics by about {:.0}%. \
                 (Average {:.1} tics with it vs {:.1} without). Keep using it!",
                name, reduction, best.avg_tics_with, best.avg_tics_without
            )
        } else if reduction > 0.0 {
            format!(
                "💡 **{}** shows promise with a {:.0}% tic reduction. \
                 Try using it more consistently to see stronger effects.",
                name, reduction
            )
        } else {
            format!(
                "📊 **{}** is being tracked but needs more data to see patterns.",
                name
            )
        }
    }
}

impl Default for ProtectiveFactorRanker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomFactor;
    use chrono::{Duration, NaiveDate};

    fn date(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(offset)
    }

    #[test]
    fn test_half_reduction() {
        let ranker = ProtectiveFactorRanker::new();
        let records: Vec<DailyRecord> = (0..6)
            .map(|i| {
                let record = DailyRecord::new(date(i)).with_stress(3.0);
                if i % 2 == 0 {
                    record
                        .with_tics(5)
                        .with_factor(CustomFactor::new("Walk", 2.0, -1.0))
                } else {
                    record.with_tics(10)
                }
            })
            .collect();

        let result = ranker.rank(&records);
        let walk = result.best_factor.unwrap();
        assert_eq!(walk.name, "Walk");
        assert_eq!(walk.times_used, 3);
        assert_eq!(walk.avg_tics_with, 5.0);
        assert_eq!(walk.avg_tics_without, 10.0);
        assert_eq!(walk.tic_reduction_pct, 50.0);
        assert_eq!(walk.avg_impact, 2.0);
        assert!(result.insight_message.contains("MVP Protective Factor: Walk"));
    }

    #[test]
    fn test_factor_used_every_day_has_no_reduction() {
        let ranker = ProtectiveFactorRanker::new();
        let records: Vec<DailyRecord> = (0..4)
            .map(|i| {
                DailyRecord::new(date(i))
                    .with_tics(4)
                    .with_factor(CustomFactor::new("Music", 1.0, -1.0))
            })
            .collect();

        let music = ranker.rank(&records).best_factor.unwrap();
        assert_eq!(music.avg_tics_without, music.avg_tics_with);
        assert_eq!(music.tic_reduction_pct, 0.0);
    }

    #[test]
    fn test_aggravating_factors_are_not_ranked() {
        let ranker = ProtectiveFactorRanker::new();
        let records = vec![
            DailyRecord::new(date(0)).with_factor(CustomFactor::new("Exam", 3.0, 1.0)),
            DailyRecord::new(date(1)).with_factor(CustomFactor::new("Idle", 0.0, -1.0)),
        ];

        let result = ranker.rank(&records);
        assert!(result.ranked_factors.is_empty());
        assert!(result.best_factor.is_none());
        assert_eq!(result.days_analyzed, 2);
    }

    #[test]
    fn test_rare_factor_redirects_to_daily_alternative() {
        let ranker = ProtectiveFactorRanker::new();
        let records = vec![
            DailyRecord::new(date(0))
                .with_tics(1)
                .with_factor(CustomFactor::new("Beach Vacation", 5.0, -1.0)),
            DailyRecord::new(date(1))
                .with_tics(6)
                .with_factor(CustomFactor::new("Walk", 2.0, -1.0)),
            DailyRecord::new(date(2)).with_tics(10),
            DailyRecord::new(date(3)).with_tics(10),
        ];

        let result = ranker.rank(&records);
        assert_eq!(result.ranked_factors[0].name, "Beach Vacation");
        assert!(result.insight_message.contains("try **Walk** instead"));
        assert!(result.insight_message.contains("Your Protective Factor Ranking"));
    }

    #[test]
    fn test_rare_factor_without_alternative() {
        let ranker = ProtectiveFactorRanker::new();
        let records = vec![
            DailyRecord::new(date(0))
                .with_tics(1)
                .with_factor(CustomFactor::new("Holiday", 5.0, -1.0)),
            DailyRecord::new(date(1)).with_tics(10),
        ];

        let result = ranker.rank(&records);
        assert!(result.insight_message.contains("capture what makes it helpful"));
    }

    #[test]
    fn test_softer_tiers() {
        let ranker = ProtectiveFactorRanker::new();
        let helper = FactorEffect {
            name: "Reading".to_string(),
            avg_impact: 1.0,
            times_used: 2,
            avg_tics_with: 8.5,
            avg_tics_without: 10.0,
            tic_reduction_pct: 15.0,
        };
        assert!(ranker
            .best_factor_sentence(&helper, &[])
            .contains("Top Helper: Reading"));

        let promising = FactorEffect {
            tic_reduction_pct: 5.0,
            ..helper.clone()
        };
        assert!(ranker
            .best_factor_sentence(&promising, &[])
            .contains("shows promise"));

        let flat = FactorEffect {
            tic_reduction_pct: -3.0,
            ..helper
        };
        assert!(ranker
            .best_factor_sentence(&flat, &[])
            .contains("needs more data"));
    }

    #[test]
    fn test_equal_loads_share_medal() {
        let ranker = ProtectiveFactorRanker::new();
        let records = vec![
            DailyRecord::new(date(0)).with_stress(2.0),
            DailyRecord::new(date(1)).with_stress(1.0),
            DailyRecord::new(date(2)).with_stress(1.0),
            DailyRecord::new(date(3)).with_stress(5.0),
        ];

        let result = ranker.rank(&records);
        let days = &result.top_best_days;
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, date(1));
        assert_eq!(days[1].date, date(2));
        assert_eq!(days[0].medal, Some(Medal::Gold));
        assert_eq!(days[1].medal, Some(Medal::Gold));
        assert_eq!(days[2].rank, 3);
        assert_eq!(days[2].medal, Some(Medal::Bronze));
        assert_eq!(result.lowest_tnl_day.unwrap().date, date(1));
    }

    #[test]
    fn test_close_but_unequal_loads_get_distinct_medals() {
        let ranker = ProtectiveFactorRanker::new();
        let records = vec![
            DailyRecord::new(date(0)).with_stress(1.04),
            DailyRecord::new(date(1)).with_stress(0.96),
            DailyRecord::new(date(2)).with_stress(3.0),
        ];

        let days = ranker.rank(&records).top_best_days;
        assert_eq!(days[0].date, date(1));
        assert_eq!(days[0].medal, Some(Medal::Gold));
        assert_eq!(days[1].rank, 2);
        assert_eq!(days[1].medal, Some(Medal::Silver));
    }

    #[test]
    fn test_negative_stress_does_not_lower_best_day_load() {
        let ranker = ProtectiveFactorRanker::new();
        let records = vec![
            DailyRecord::new(date(0)).with_stress(-6.0).with_study(90.0),
            DailyRecord::new(date(1)).with_stress(0.5),
        ];

        let lowest = ranker.rank(&records).lowest_tnl_day.unwrap();
        assert_eq!(lowest.date, date(1));
        assert_eq!(lowest.tnl, 0.5);
        assert!(ranker.rank(&records).top_best_days.iter().all(|d| d.tnl >= 0.0));
    }

    #[test]
    fn test_best_day_lists_protective_factors() {
        let ranker = ProtectiveFactorRanker::new();
        let records = vec![
            DailyRecord::new(date(0))
                .with_stress(1.0)
                .with_tics(2)
                .with_factor(CustomFactor::new("Walk", 1.0, -1.0))
                .with_factor(CustomFactor::new("Tea", 1.0, -0.5)),
            DailyRecord::new(date(1)).with_stress(6.0).with_tics(8),
        ];

        let result = ranker.rank(&records);
        let lowest = result.lowest_tnl_day.unwrap();
        assert_eq!(lowest.protective_factors, vec!["Walk", "Tea"]);
        assert!(result.insight_message.contains("What worked: Walk, Tea"));
    }

    #[test]
    fn test_empty_batch_fallback() {
        let result = ProtectiveFactorRanker::new().rank(&[]);
        assert_eq!(
            result.insight_message,
            "Track more days with protective factors to see insights!"
        );
        assert!(result.top_best_days.is_empty());
    }

    #[test]
    fn test_top_n_limit() {
        let ranker = ProtectiveFactorRanker::new();
        let records: Vec<DailyRecord> = (0..8)
            .map(|i| {
                DailyRecord::new(date(i))
                    .with_tics(i as u32)
                    .with_factor(CustomFactor::new(format!("Factor {}", i), 1.0, -1.0))
            })
            .collect();

        let result = ranker.rank(&records);
        assert_eq!(result.ranked_factors.len(), 5);
        assert_eq!(result.ranked_factors[0].name, "Factor 0");
    }
}
