use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::Encoding;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::DailySeries;
use crate::utils::constants::{PERIOD_END, PERIOD_START, SERIES_MISSING_MARKER};

/// Decode a whole text file with the configured character encoding
pub fn read_text(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let bytes = fs::read(path)?;
    let (text, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        return Err(ProcessingError::InvalidFormat(format!(
            "{} is not valid {} text",
            path.display(),
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

/// Resolve an encoding label such as `utf-8` or `shift_jis`
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ProcessingError::Config(format!("Unknown text encoding: '{}'", label)))
}

/// Reader for `date,value` daily series files
pub struct SeriesReader {
    missing_marker: f64,
    encoding: &'static Encoding,
}

impl SeriesReader {
    pub fn new() -> Self {
        Self {
            missing_marker: SERIES_MISSING_MARKER,
            encoding: encoding_rs::UTF_8,
        }
    }

    pub fn with_missing_marker(mut self, missing_marker: f64) -> Self {
        self.missing_marker = missing_marker;
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Read one series file into a full-period daily series
    ///
    /// Days without a row stay missing. Rows outside the period and
    /// repeated dates are rejected.
    pub fn read_series(&self, path: &Path) -> Result<DailySeries> {
        let text = read_text(path, self.encoding)?;
        let series = self.parse_series(&text)?;
        debug!(
            "Read {} valid daily samples from {}",
            series.valid_count(),
            path.display()
        );
        Ok(series)
    }

    pub fn parse_series(&self, text: &str) -> Result<DailySeries> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let mut series = DailySeries::empty();
        let mut seen = vec![false; series.len()];

        for (line, record) in reader.records().enumerate() {
            let record = record?;
            // header is line 1
            let line = line + 2;
            let (date, value) = self.parse_record(&record, line)?;

            let index = DailySeries::index_of(date).ok_or_else(|| {
                ProcessingError::InvalidFormat(format!(
                    "line {}: date {} outside {} to {}",
                    line, date, PERIOD_START, PERIOD_END
                ))
            })?;

            if seen[index] {
                return Err(ProcessingError::InvalidFormat(format!(
                    "line {}: duplicate date {}",
                    line, date
                )));
            }
            seen[index] = true;
            series.set(index, value);
        }

        Ok(series)
    }

    fn parse_record(&self, record: &StringRecord, line: usize) -> Result<(NaiveDate, Option<f64>)> {
        let (date_field, value_field) = match (record.get(0), record.get(1)) {
            (Some(date), Some(value)) => (date, value),
            _ => {
                return Err(ProcessingError::InvalidFormat(format!(
                    "line {}: expected date and value columns",
                    line
                )))
            }
        };

        let date = parse_date(date_field).ok_or_else(|| {
            ProcessingError::InvalidFormat(format!("line {}: invalid date '{}'", line, date_field))
        })?;

        Ok((date, self.parse_value(value_field, line)?))
    }

    fn parse_value(&self, field: &str, line: usize) -> Result<Option<f64>> {
        if field.is_empty() {
            return Ok(None);
        }

        let value = field.parse::<f64>().map_err(|_| {
            ProcessingError::InvalidFormat(format!("line {}: invalid value '{}'", line, field))
        })?;

        if value.is_nan() || value == self.missing_marker {
            Ok(None)
        } else if value.is_infinite() {
            Err(ProcessingError::InvalidFormat(format!(
                "line {}: value '{}' is not finite",
                line, field
            )))
        } else {
            Ok(Some(value))
        }
    }
}

impl Default for SeriesReader {
    fn default() -> Self {
        Self::new()
    }
}

/// `YYYY-MM-DD` or `YYYYMMDD`
pub fn parse_date(field: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(field, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(field, "%Y%m%d"))
        .ok()
}
