use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::path::Path;
use tracing::info;

use crate::analyzers::StatisticsSummary;
use crate::error::Result;
use crate::models::{AggregateReport, ClimateVariable, MonthlyValue, ReportRow};
use crate::utils::constants::REPORT_NO_DATA_MARKER;

/// Tab-separated writer for the statistics report and its companion files
pub struct TsvWriter {
    no_data_marker: String,
}

impl TsvWriter {
    pub fn new() -> Self {
        Self {
            no_data_marker: REPORT_NO_DATA_MARKER.to_string(),
        }
    }

    pub fn with_no_data_marker(mut self, marker: &str) -> Self {
        self.no_data_marker = marker.to_string();
        self
    }

    /// One header line plus one line per grid square
    pub fn write_report(&self, report: &AggregateReport, path: &Path) -> Result<()> {
        let mut writer = tsv_writer(path)?;
        writer.write_record(report_header(&report.geology_codes))?;
        for row in &report.rows {
            writer.write_record(self.report_record(row, &report.geology_codes))?;
        }
        writer.flush()?;

        info!(
            "Wrote {} report rows to {}",
            report.rows.len(),
            path.display()
        );
        Ok(())
    }

    /// Pixel and grid-square totals per geology code
    pub fn write_category_summary(&self, report: &AggregateReport, path: &Path) -> Result<()> {
        let mut writer = tsv_writer(path)?;
        writer.write_record(["code", "pixels", "grid_squares"])?;
        for (code, total) in &report.category_totals {
            writer.write_record([
                code.to_string(),
                total.pixels.to_string(),
                total.grid_squares.to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_monthly(&self, values: &[MonthlyValue], path: &Path) -> Result<()> {
        let mut writer = tsv_writer(path)?;
        writer.write_record(["year", "month", "value"])?;
        for entry in values {
            writer.write_record([
                entry.year.to_string(),
                format!("{:02}", entry.month),
                self.format_value(entry.value),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn report_record(&self, row: &ReportRow, geology_codes: &[u32]) -> Vec<String> {
        let mut record = vec![row.identifier.to_string()];

        match row.bounding_box {
            Some(bbox) => record.extend(bbox.as_array().iter().map(f64::to_string)),
            None => record.extend(std::iter::repeat(self.no_data_marker.clone()).take(4)),
        }

        for variable in ClimateVariable::ALL {
            let summary = row.climate(variable).and_then(|c| c.summary);
            record.extend(self.summary_fields(summary.as_ref()));
        }

        for variable in ClimateVariable::ALL {
            let climatology = row.climate(variable).and_then(|c| c.climatology);
            for month in 0..12 {
                record.push(self.format_value(climatology.and_then(|normals| normals[month])));
            }
        }

        record.extend(self.summary_fields(row.elevation.as_ref()));
        record.extend(self.summary_fields(row.slope.as_ref()));
        record.push(self.format_value(row.direction_mean));

        for code in geology_codes {
            record.push(match &row.geology {
                Some(counts) => counts.get(code).copied().unwrap_or(0).to_string(),
                None => self.no_data_marker.clone(),
            });
        }

        record
    }

    fn summary_fields(&self, summary: Option<&StatisticsSummary>) -> [String; 4] {
        [
            self.format_value(summary.and_then(|s| s.mean)),
            self.format_value(summary.and_then(|s| s.std_dev)),
            self.format_value(summary.and_then(|s| s.median)),
            self.format_value(summary.and_then(|s| s.mode)),
        ]
    }

    pub fn format_value(&self, value: Option<f64>) -> String {
        match value {
            Some(v) if v.is_finite() => (v + 0.0).to_string(),
            _ => self.no_data_marker.clone(),
        }
    }
}

impl Default for TsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Report column names for the given geology codes
pub fn report_header(geology_codes: &[u32]) -> Vec<String> {
    let mut header: Vec<String> = ["mesh_code", "minx", "miny", "maxx", "maxy"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    for variable in ClimateVariable::ALL {
        header.extend(summary_columns(variable.column_key()));
    }
    for variable in ClimateVariable::ALL {
        for month in 1..=12 {
            header.push(format!("{}_month{:02}", variable.column_key(), month));
        }
    }

    header.extend(summary_columns("ele"));
    header.extend(summary_columns("slp"));
    header.push("dir_mean".to_string());
    header.extend(geology_codes.iter().map(|code| format!("geol_{}", code)));

    header
}

fn summary_columns(key: &str) -> [String; 4] {
    ["mean", "std", "med", "mod"].map(|stat| format!("{}_{}", key, stat))
}

fn tsv_writer(path: &Path) -> Result<Writer<File>> {
    Ok(WriterBuilder::new().delimiter(b'\t').from_path(path)?)
}
