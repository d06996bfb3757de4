//! Analysis service
//!
//! [`FlowAnalyzer`] owns nothing but configuration. Each call runs the
//! chain normalize → vulnerability → load → pacing on its own batch, with
//! the sleep and protective-factor analyses computed alongside from the same
//! raw records. Independent batches can be analyzed in parallel.

use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::error::{MyFlowError, Result};
use crate::factors::{ProtectiveFactorRanker, ProtectiveFactorResult};
use crate::ingest::{self, IngestReport, SkippedRecord};
use crate::load::CompositeLoadCalculator;
use crate::models::{DailyRecord, DateRange, NormalizedDay};
use crate::pacing::{PacingDetector, PacingResult};
use crate::sleep::{SleepCorrelationEngine, SleepOutcome};
use crate::vulnerability::VulnerabilityVerdict;

/// One row of the per-day contribution table, ascending by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionRow {
    pub date: NaiveDate,
    pub tic_count: u32,
    pub tnl: f64,
    pub stress: f64,
    pub study: f64,
    pub positive_custom: f64,
    pub negative_custom: f64,
    pub sleep_penalty: f64,
    pub sleep_hours: f64,
}

impl ContributionRow {
    /// Sum of the load columns; equals `tnl`
    pub fn component_sum(&self) -> f64 {
        self.stress + self.study + self.positive_custom + self.sleep_penalty
    }
}

impl From<&NormalizedDay> for ContributionRow {
    fn from(day: &NormalizedDay) -> Self {
        ContributionRow {
            date: day.date,
            tic_count: day.tic_count,
            tnl: day.tnl,
            stress: day.stress_contrib,
            study: day.normalized_study,
            positive_custom: day.positive_custom_contrib,
            negative_custom: day.negative_custom_contrib,
            sleep_penalty: day.sleep_penalty_contrib,
            sleep_hours: day.sleep_hours,
        }
    }
}

/// What ingestion left out or overwrote
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub skipped: Vec<SkippedRecord>,
    pub duplicates_overwritten: usize,
    pub dropped_factors: usize,
}

impl From<&IngestReport> for IngestSummary {
    fn from(report: &IngestReport) -> Self {
        IngestSummary {
            skipped: report.skipped.clone(),
            duplicates_overwritten: report.duplicates_overwritten,
            dropped_factors: report.dropped_factors,
        }
    }
}

/// Full result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub days_analyzed: usize,
    pub date_range: Option<DateRange>,
    pub vulnerability: VulnerabilityVerdict,
    pub pacing: PacingResult,
    pub sleep: SleepOutcome,
    pub protective_factors: ProtectiveFactorResult,
    pub contributions: Vec<ContributionRow>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingest: Option<IngestSummary>,
}

/// Per-file outcome of a parallel run
#[derive(Debug)]
pub struct FileAnalysis {
    pub path: PathBuf,
    pub duration_ms: u128,
    pub outcome: Result<AnalysisReport>,
}

/// Stateless analysis service holding only configuration
pub struct FlowAnalyzer {
    config: AnalysisConfig,
}

impl FlowAnalyzer {
    pub fn new() -> Self {
        FlowAnalyzer {
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        FlowAnalyzer { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every analysis over one batch of records
    ///
    /// Records may arrive unordered; later entries win for duplicate dates.
    pub fn analyze(&self, records: &[DailyRecord]) -> AnalysisReport {
        let records = ordered_records(records);

        let load = CompositeLoadCalculator::with_settings(
            self.config.normalization.clone(),
            self.config.vulnerability.clone(),
            self.config.load.clone(),
        )
        .compute(&records);

        let pacing = PacingDetector::with_settings(self.config.pacing.clone()).evaluate(&load.batch);
        let sleep = SleepCorrelationEngine::with_settings(self.config.sleep.clone()).outcome(&records);
        let protective_factors = ProtectiveFactorRanker::with_settings(
            self.config.normalization.clone(),
            self.config.factors.clone(),
        )
        .rank(&records);

        let contributions: Vec<ContributionRow> =
            load.batch.days().iter().map(ContributionRow::from).collect();

        info!(
            days = records.len(),
            vulnerable = load.vulnerability.is_vulnerable,
            pacing = pacing.state.label(),
            sleep_analyzed = sleep.result().is_some(),
            factors = protective_factors.ranked_factors.len(),
            "Analysis complete"
        );

        AnalysisReport {
            generated_at: Utc::now(),
            days_analyzed: records.len(),
            date_range: DateRange::of_records(&records),
            vulnerability: load.vulnerability,
            pacing,
            sleep,
            protective_factors,
            contributions,
            ingest: None,
        }
    }

    /// Ingest a JSON payload and analyze it
    ///
    /// Fails only when the payload is not a JSON array of entries.
    pub fn analyze_json(&self, payload: &str) -> Result<AnalysisReport> {
        let ingested = ingest::ingest_json(payload)?;
        Ok(self.analyze_ingested(&ingested))
    }

    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> Result<AnalysisReport> {
        let ingested = ingest::ingest_file(path)?;
        Ok(self.analyze_ingested(&ingested))
    }

    pub fn analyze_ingested(&self, ingested: &IngestReport) -> AnalysisReport {
        let mut report = self.analyze(&ingested.records);
        if !ingested.is_clean() {
            report.ingest = Some(IngestSummary::from(ingested));
        }
        report
    }

    /// Analyze independent batches in parallel, preserving input order
    pub fn analyze_many(&self, batches: &[Vec<DailyRecord>]) -> Vec<AnalysisReport> {
        batches.par_iter().map(|batch| self.analyze(batch)).collect()
    }

    /// Analyze several log files in parallel, preserving input order
    pub fn analyze_files(&self, paths: &[PathBuf]) -> Vec<FileAnalysis> {
        debug!(files = paths.len(), "Analyzing files in parallel");

        paths
            .par_iter()
            .map(|path| {
                let start = Instant::now();
                let outcome = self.analyze_file(path);
                let duration_ms = start.elapsed().as_millis();

                match &outcome {
                    Ok(report) => debug!(
                        path = %path.display(),
                        days = report.days_analyzed,
                        duration_ms,
                        "Analyzed file"
                    ),
                    Err(e) => warn!(path = %path.display(), error = %e, "Failed to analyze file"),
                }

                FileAnalysis {
                    path: path.clone(),
                    duration_ms,
                    outcome,
                }
            })
            .collect()
    }
}

impl Default for FlowAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<AnalysisConfig> for FlowAnalyzer {
    type Error = MyFlowError;

    fn try_from(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(FlowAnalyzer::with_config(config))
    }
}

/// Sort by date, keeping the last record for each date
fn ordered_records(records: &[DailyRecord]) -> Vec<DailyRecord> {
    let mut by_date: BTreeMap<NaiveDate, &DailyRecord> = BTreeMap::new();
    for record in records {
        by_date.insert(record.date, record);
    }
    by_date.into_values().cloned().collect()
}
