//! Record ingestion
//!
//! Turns a loosely-shaped JSON export of daily log entries into typed
//! [`DailyRecord`]s. Every field is parsed once here with an explicit
//! parse-or-default step, so the analyzers never see malformed values.
//!
//! Policy:
//! - entries without a parseable `date` are skipped and reported
//! - numeric fields accept JSON numbers and numeric strings; anything else is
//!   treated as absent
//! - custom factors must carry a non-empty `name`; `level` and `effect`
//!   default to 0
//! - duplicate dates are resolved last-write-wins

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::models::{CustomFactor, DailyRecord};

/// Why an entry was left out of the batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Position of the entry in the submitted array
    pub index: usize,
    pub reason: String,
}

/// Outcome of ingesting one payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Typed records sorted ascending by date, one per distinct date
    pub records: Vec<DailyRecord>,

    /// Entries excluded because they could not be keyed by date
    pub skipped: Vec<SkippedRecord>,

    /// Number of entries that replaced an earlier entry for the same date
    pub duplicates_overwritten: usize,

    /// Custom factor entries dropped for lacking a name
    pub dropped_factors: usize,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.duplicates_overwritten == 0 && self.dropped_factors == 0
    }
}

/// Parse a JSON payload of daily entries
pub fn ingest_json(payload: &str) -> Result<IngestReport, IngestError> {
    let value: Value = serde_json::from_str(payload)?;
    ingest_value(&value)
}

/// Read and parse a JSON file of daily entries
pub fn ingest_file<P: AsRef<Path>>(path: P) -> Result<IngestReport, IngestError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| IngestError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!(path = %path.display(), bytes = content.len(), "Read tracking log");
    ingest_json(&content)
}

/// Ingest an already-parsed JSON value; it must be an array of entries
pub fn ingest_value(value: &Value) -> Result<IngestReport, IngestError> {
    let entries = value.as_array().ok_or_else(|| IngestError::NotAnArray {
        found: json_kind(value).to_string(),
    })?;

    let mut report = IngestReport::default();
    let mut by_date: BTreeMap<NaiveDate, DailyRecord> = BTreeMap::new();

    for (index, entry) in entries.iter().enumerate() {
        let Some(object) = entry.as_object() else {
            warn!(index, kind = json_kind(entry), "Skipping non-object entry");
            report.skipped.push(SkippedRecord {
                index,
                reason: format!("entry is {}, not an object", json_kind(entry)),
            });
            continue;
        };

        let Some(date) = object.get("date").and_then(parse_date) else {
            warn!(index, "Skipping entry without a usable date");
            report.skipped.push(SkippedRecord {
                index,
                reason: "missing or unparseable date".to_string(),
            });
            continue;
        };

        let (record, dropped) = parse_record(date, entry);
        report.dropped_factors += dropped;

        if by_date.insert(date, record).is_some() {
            warn!(%date, index, "Duplicate date, keeping the later entry");
            report.duplicates_overwritten += 1;
        }
    }

    report.records = by_date.into_values().collect();

    debug!(
        records = report.records.len(),
        skipped = report.skipped.len(),
        duplicates = report.duplicates_overwritten,
        dropped_factors = report.dropped_factors,
        "Ingestion complete"
    );

    Ok(report)
}

/// Build a typed record from one entry, returning it with the count of dropped factors
fn parse_record(date: NaiveDate, entry: &Value) -> (DailyRecord, usize) {
    let sleep_hours = lookup(entry, &[("physiological", "sleep_hours")], &["sleep_hours"])
        .and_then(coerce_f64)
        .filter(|hours| *hours >= 0.0);

    let stress = lookup(entry, &[("emotional", "stress")], &["stress"])
        .and_then(coerce_f64)
        .map(|stress| stress.max(0.0))
        .unwrap_or(0.0);

    let study_minutes = lookup(entry, &[("cognitive_load", "study_minutes")], &["study_minutes"])
        .and_then(coerce_f64)
        .filter(|minutes| *minutes >= 0.0)
        .unwrap_or(0.0);

    let tic_count = lookup(
        entry,
        &[("symptoms", "tic_count"), ("symptoms", "symptom_count")],
        &["tic_count", "symptom_count"],
    )
    .and_then(coerce_f64)
    .map(|count| count.max(0.0).round() as u32)
    .unwrap_or(0);

    let mut dropped = 0;
    let custom_factors = entry
        .get("custom")
        .and_then(Value::as_array)
        .map(|factors| {
            factors
                .iter()
                .filter_map(|factor| {
                    let parsed = parse_factor(factor);
                    if parsed.is_none() {
                        warn!(%date, "Dropping custom factor without a name");
                        dropped += 1;
                    }
                    parsed
                })
                .collect()
        })
        .unwrap_or_default();

    let record = DailyRecord {
        date,
        sleep_hours,
        stress,
        study_minutes,
        tic_count,
        custom_factors,
    };

    (record, dropped)
}

fn parse_factor(value: &Value) -> Option<CustomFactor> {
    let name = value.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }

    let level = value.get("level").and_then(coerce_f64).unwrap_or(0.0);
    let effect = value.get("effect").and_then(coerce_f64).unwrap_or(0.0);

    Some(CustomFactor::new(name, level, effect))
}

/// Find a field under a nested section first, then at the top level
fn lookup<'a>(entry: &'a Value, nested: &[(&str, &str)], flat: &[&str]) -> Option<&'a Value> {
    nested
        .iter()
        .filter_map(|(section, field)| entry.get(section).and_then(|s| s.get(field)))
        .chain(flat.iter().filter_map(|field| entry.get(field)))
        .find(|value| !value.is_null())
}

/// Coerce a JSON number or numeric string into a finite f64
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Accept plain dates, RFC 3339 timestamps and naive datetimes
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|dt| dt.date())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
