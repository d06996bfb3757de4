use serde::Serialize;

use crate::analysis::AnalysisReport;
use crate::error::ExportError;

/// Full analysis report as pretty-printed JSON
pub fn render_report(report: &AnalysisReport) -> Result<String, ExportError> {
    render(report)
}

/// Any serializable result as pretty-printed JSON
pub fn render<T: Serialize>(data: &T) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(data)?)
}
