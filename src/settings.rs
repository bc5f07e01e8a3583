use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use validator::{Validate, ValidationError};

use crate::error::Result;
use crate::models::TerrainVariable;
use crate::readers::raster_decoder::{CategoryEncoding, ValueEncoding};
use crate::readers::series_reader::resolve_encoding;
use crate::utils::constants::{
    CATEGORY_SUMMARY_FILE, DATA_PNG_CHANNELS, DEFAULT_CLIMATOLOGY_END_YEAR,
    DEFAULT_CLIMATOLOGY_START_YEAR, DEFAULT_ENCODING, GEOLOGY_LEGEND_FILE, PERIOD_END_YEAR,
    PERIOD_START_YEAR, REPORT_FILE, REPORT_NO_DATA_MARKER, SERIES_MISSING_MARKER,
};

/// Prefix for environment overrides, e.g. `MESH_PROCESSOR__REPORT__NO_DATA_MARKER`
pub const ENV_PREFIX: &str = "MESH_PROCESSOR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    #[validate(nested)]
    pub series: SeriesSettings,
    #[validate(nested)]
    pub elevation: ValueEncoding,
    #[validate(nested)]
    pub slope: ValueEncoding,
    #[validate(nested)]
    pub direction: ValueEncoding,
    #[validate(nested)]
    pub geology: GeologySettings,
    #[validate(nested)]
    pub report: ReportSettings,
    #[validate(nested)]
    pub processing: ProcessingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SeriesSettings {
    /// Value treated as a missing day
    pub missing_marker: f64,
    /// encoding_rs label of the series and land-use files
    #[validate(length(min = 1))]
    pub encoding: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GeologySettings {
    #[validate(range(min = 1, max = 4))]
    pub channels: usize,
    pub no_data: Option<u32>,
    /// Legend file name, looked up in the base directory
    #[validate(length(min = 1))]
    pub legend_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_climatology_window"))]
pub struct ReportSettings {
    pub no_data_marker: String,
    pub climatology_start_year: i32,
    pub climatology_end_year: i32,
    /// Truncate elevation and slope samples to whole units before summarizing
    pub truncate_raster_samples: bool,
    #[validate(length(min = 1))]
    pub report_file: String,
    #[validate(length(min = 1))]
    pub summary_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProcessingSettings {
    #[validate(range(min = 1, max = 1024))]
    pub max_workers: usize,
}

fn validate_climatology_window(report: &ReportSettings) -> std::result::Result<(), ValidationError> {
    let start = report.climatology_start_year;
    let end = report.climatology_end_year;
    if start > end || start < PERIOD_START_YEAR || end > PERIOD_END_YEAR {
        return Err(ValidationError::new("climatology_window"));
    }
    Ok(())
}

impl Settings {
    /// Defaults, then the optional file, then `MESH_PROCESSOR__*` variables
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.check()?;

        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Field validation plus checks that need other crates
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        self.series.text_encoding()?;
        Ok(())
    }

    pub fn terrain_encoding(&self, variable: TerrainVariable) -> &ValueEncoding {
        match variable {
            TerrainVariable::Elevation => &self.elevation,
            TerrainVariable::Slope => &self.slope,
            TerrainVariable::Direction => &self.direction,
        }
    }
}

impl SeriesSettings {
    pub fn text_encoding(&self) -> Result<&'static Encoding> {
        resolve_encoding(&self.encoding)
    }
}

impl Default for SeriesSettings {
    fn default() -> Self {
        Self {
            missing_marker: SERIES_MISSING_MARKER,
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

impl GeologySettings {
    pub fn encoding(&self) -> CategoryEncoding {
        CategoryEncoding {
            channels: self.channels,
            no_data: self.no_data,
        }
    }
}

impl Default for GeologySettings {
    fn default() -> Self {
        Self {
            channels: DATA_PNG_CHANNELS,
            no_data: None,
            legend_file: GEOLOGY_LEGEND_FILE.to_string(),
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            no_data_marker: REPORT_NO_DATA_MARKER.to_string(),
            climatology_start_year: DEFAULT_CLIMATOLOGY_START_YEAR,
            climatology_end_year: DEFAULT_CLIMATOLOGY_END_YEAR,
            truncate_raster_samples: true,
            report_file: REPORT_FILE.to_string(),
            summary_file: CATEGORY_SUMMARY_FILE.to_string(),
        }
    }
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::Builder;

    // Environment variables are process-wide; tests that call `load` take this
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.check().is_ok());
        assert_eq!(settings.elevation.no_data, Some(0x80_00_00));
        assert_eq!(settings.report.no_data_marker, "NA");
        assert_eq!(settings.report.climatology_start_year, 1986);
        assert!(settings.report.truncate_raster_samples);
    }

    #[test]
    fn test_partial_toml_file_keeps_defaults() -> Result<()> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "[report]")?;
        writeln!(file, "no_data_marker = \"-\"")?;
        writeln!(file, "climatology_start_year = 1981")?;
        writeln!(file, "climatology_end_year = 2010")?;
        writeln!(file, "[slope]")?;
        writeln!(file, "scale = 0.1")?;

        let settings = Settings::load(Some(file.path()))?;
        assert_eq!(settings.report.no_data_marker, "-");
        assert_eq!(settings.report.climatology_start_year, 1981);
        assert_eq!(settings.report.report_file, "mesh_stats.tsv");
        assert_eq!(settings.slope.scale, 0.1);
        assert_eq!(settings.slope.channels, 3);
        assert_eq!(settings.elevation.scale, 0.01);
        Ok(())
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut settings = Settings::default();
        settings.report.climatology_end_year = 2020;
        assert!(settings.check().is_err());

        let mut settings = Settings::default();
        settings.direction.channels = 0;
        assert!(settings.check().is_err());

        let mut settings = Settings::default();
        settings.elevation.scale = 0.0;
        assert!(settings.check().is_err());

        let mut settings = Settings::default();
        settings.series.encoding = "not-an-encoding".to_string();
        assert!(settings.check().is_err());
    }

    #[test]
    fn test_environment_overrides_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        env::set_var("MESH_PROCESSOR__REPORT__NO_DATA_MARKER", "NaN");
        env::set_var("MESH_PROCESSOR__PROCESSING__MAX_WORKERS", "3");

        let loaded = Settings::load(None);

        env::remove_var("MESH_PROCESSOR__REPORT__NO_DATA_MARKER");
        env::remove_var("MESH_PROCESSOR__PROCESSING__MAX_WORKERS");

        let settings = loaded.unwrap();
        assert_eq!(settings.report.no_data_marker, "NaN");
        assert_eq!(settings.processing.max_workers, 3);
        assert_eq!(settings.report.report_file, "mesh_stats.tsv");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        assert!(Settings::load(Some(Path::new("/nonexistent/mesh.toml"))).is_err());
    }
}
