//! Report writers
//!
//! Every format renders an [`AnalysisReport`] into a string first; writing to
//! disk is shared.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::analysis::AnalysisReport;
use crate::error::ExportError;

#[cfg(feature = "charts")]
pub mod chart;
pub mod csv;
pub mod html;
pub mod json;
pub mod text;

/// Output format for analysis reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Full report as pretty JSON
    Json,
    /// Per-day contribution table
    Csv,
    /// Plain-text summary
    Text,
    /// Self-contained HTML page
    Html,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Text => "txt",
            ExportFormat::Html => "html",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "text" | "txt" => Ok(ExportFormat::Text),
            "html" | "htm" => Ok(ExportFormat::Html),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Render a report in the requested format
pub fn render(report: &AnalysisReport, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => json::render_report(report),
        ExportFormat::Csv => csv::render_contributions(&report.contributions),
        ExportFormat::Text => Ok(text::render_report(report)),
        ExportFormat::Html => html::render_report(report),
    }
}

/// Render a report and write it to a file, creating parent directories
pub fn export_report<P: AsRef<Path>>(
    report: &AnalysisReport,
    format: ExportFormat,
    output_path: P,
) -> Result<(), ExportError> {
    let output_path = output_path.as_ref();
    let content = render(report, format)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output_path, content)?;

    info!(
        path = %output_path.display(),
        format = format.extension(),
        days = report.days_analyzed,
        "Report exported"
    );
    Ok(())
}

/// Remove `**bold**` markers for plain-text output
pub fn strip_emphasis(text: &str) -> String {
    text.replace("**", "")
}
