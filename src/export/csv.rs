use std::io::{Read, Write};

use crate::analysis::ContributionRow;
use crate::error::ExportError;

/// Write the per-day contribution table, one row per day with a header
pub fn write_contributions<W: Write>(rows: &[ContributionRow], writer: W) -> Result<(), ExportError> {
    let mut csv_writer = ::csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn render_contributions(rows: &[ContributionRow]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_contributions(rows, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ExportError::Serialization(e.to_string()))
}

/// Read a contribution table back, e.g. for charting outside the pipeline
pub fn read_contributions<R: Read>(reader: R) -> Result<Vec<ContributionRow>, ExportError> {
    let mut csv_reader = ::csv::Reader::from_reader(reader);
    csv_reader
        .deserialize()
        .map(|row| row.map_err(ExportError::from))
        .collect()
}
