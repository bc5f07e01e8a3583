use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ProcessingError, Result};
use crate::models::{
    BoundingBox, ClimateVariable, DailySeries, GridSquareId, LandUseComposition, RasterGrid,
    TerrainVariable, GEOLOGY_VARIABLE,
};
use crate::readers::land_use_reader::LandUseReader;
use crate::readers::legend_reader::GeologyLegend;
use crate::readers::raster_decoder::{decode_categories, decode_values};
use crate::readers::raster_reader::read_pixels;
use crate::readers::series_reader::SeriesReader;
use crate::settings::Settings;
use crate::utils::constants::{BBOX_FILE, GEOLOGY_FILE, LAND_USE_FILE};

const BBOX_VARIABLE: &str = "bbox";
const LAND_USE_VARIABLE: &str = "land_use";

/// Everything shared by the grid squares of one base directory
///
/// Built once; datasets borrow it and never mutate it.
pub struct DatasetContext {
    base_dir: PathBuf,
    settings: Settings,
    legend: Option<GeologyLegend>,
    series_reader: SeriesReader,
    land_use_reader: LandUseReader,
}

impl DatasetContext {
    /// Open a base directory, loading the geology legend when one is present
    pub fn open(base_dir: &Path, settings: Settings) -> Result<Self> {
        let metadata = fs::metadata(base_dir).map_err(|source| ProcessingError::BaseDirectory {
            path: base_dir.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(ProcessingError::BaseDirectory {
                path: base_dir.to_path_buf(),
                source: std::io::Error::other("not a directory"),
            });
        }

        let text_encoding = settings.series.text_encoding()?;
        let series_reader = SeriesReader::new()
            .with_missing_marker(settings.series.missing_marker)
            .with_encoding(text_encoding);
        let land_use_reader = LandUseReader::new().with_encoding(text_encoding);

        let legend_path = base_dir.join(&settings.geology.legend_file);
        let legend = if legend_path.is_file() {
            let legend = GeologyLegend::load(&legend_path)?;
            info!(
                "Using geology legend {} ({} colors)",
                legend_path.display(),
                legend.len()
            );
            Some(legend)
        } else {
            debug!(
                "No geology legend at {}, packed colors are used as codes",
                legend_path.display()
            );
            None
        };

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            settings,
            legend,
            series_reader,
            land_use_reader,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn legend(&self) -> Option<&GeologyLegend> {
        self.legend.as_ref()
    }

    pub fn dataset(&self, identifier: &GridSquareId) -> GridSquareDataset<'_> {
        GridSquareDataset {
            context: self,
            identifier: identifier.clone(),
            directory: self.base_dir.join(identifier.as_str()),
        }
    }

    /// Every subdirectory of the base directory, sorted by name
    pub fn discover_identifiers(&self) -> Result<Vec<GridSquareId>> {
        let base_error = |source| ProcessingError::BaseDirectory {
            path: self.base_dir.clone(),
            source,
        };

        let mut identifiers = Vec::new();
        for entry in fs::read_dir(&self.base_dir).map_err(base_error)? {
            let entry = entry.map_err(base_error)?;
            if !entry.file_type().map_err(base_error)?.is_dir() {
                continue;
            }

            match entry.file_name().into_string() {
                Ok(name) => identifiers.push(GridSquareId::new(name)),
                Err(name) => warn!("Skipping non UTF-8 directory name {:?}", name),
            }
        }

        identifiers.sort();
        debug!(
            "Found {} grid squares in {}",
            identifiers.len(),
            self.base_dir.display()
        );
        Ok(identifiers)
    }
}

/// Read-only view of one grid square's files
///
/// Every accessor reads its file on demand; nothing is cached.
pub struct GridSquareDataset<'a> {
    context: &'a DatasetContext,
    identifier: GridSquareId,
    directory: PathBuf,
}

impl GridSquareDataset<'_> {
    pub fn identifier(&self) -> &GridSquareId {
        &self.identifier
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn bounding_box(&self) -> Result<BoundingBox> {
        let path = self.existing_file(BBOX_FILE, BBOX_VARIABLE)?;
        let parse = || -> Result<BoundingBox> {
            let bbox: BoundingBox = serde_json::from_str(&fs::read_to_string(&path)?)?;
            bbox.check()?;
            Ok(bbox)
        };
        parse().map_err(|e| self.format_error(BBOX_VARIABLE, e))
    }

    pub fn climate(&self, variable: ClimateVariable) -> Result<DailySeries> {
        let path = self.existing_file(variable.file_name(), variable.file_stem())?;
        self.context
            .series_reader
            .read_series(&path)
            .map_err(|e| self.format_error(variable.file_stem(), e))
    }

    pub fn precipitation(&self) -> Result<DailySeries> {
        self.climate(ClimateVariable::Precipitation)
    }

    pub fn daylight_hours(&self) -> Result<DailySeries> {
        self.climate(ClimateVariable::DaylightHours)
    }

    pub fn solar_radiation(&self) -> Result<DailySeries> {
        self.climate(ClimateVariable::SolarRadiation)
    }

    pub fn average_temperature(&self) -> Result<DailySeries> {
        self.climate(ClimateVariable::AverageTemperature)
    }

    pub fn lowest_temperature(&self) -> Result<DailySeries> {
        self.climate(ClimateVariable::LowestTemperature)
    }

    pub fn highest_temperature(&self) -> Result<DailySeries> {
        self.climate(ClimateVariable::HighestTemperature)
    }

    pub fn land_use(&self) -> Result<LandUseComposition> {
        let path = self.existing_file(LAND_USE_FILE, LAND_USE_VARIABLE)?;
        self.context
            .land_use_reader
            .read_land_use(&path)
            .map_err(|e| self.format_error(LAND_USE_VARIABLE, e))
    }

    pub fn terrain(&self, variable: TerrainVariable) -> Result<RasterGrid<f64>> {
        let name = variable.to_string();
        let path = self.existing_file(variable.file_name(), &name)?;
        let encoding = self.context.settings.terrain_encoding(variable);

        read_pixels(&path)
            .and_then(|pixels| decode_values(&pixels, encoding))
            .map_err(|e| self.format_error(&name, e))
    }

    pub fn elevation(&self) -> Result<RasterGrid<f64>> {
        self.terrain(TerrainVariable::Elevation)
    }

    pub fn slope(&self) -> Result<RasterGrid<f64>> {
        self.terrain(TerrainVariable::Slope)
    }

    pub fn direction(&self) -> Result<RasterGrid<f64>> {
        self.terrain(TerrainVariable::Direction)
    }

    pub fn geology(&self) -> Result<RasterGrid<u32>> {
        let path = self.existing_file(GEOLOGY_FILE, GEOLOGY_VARIABLE)?;
        let encoding = self.context.settings.geology.encoding();

        read_pixels(&path)
            .and_then(|pixels| decode_categories(&pixels, &encoding, self.context.legend()))
            .map_err(|e| self.format_error(GEOLOGY_VARIABLE, e))
    }

    fn existing_file(&self, file_name: &str, variable: &str) -> Result<PathBuf> {
        let path = self.directory.join(file_name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ProcessingError::DatasetNotFound {
                identifier: self.identifier.to_string(),
                variable: variable.to_string(),
                path,
            })
        }
    }

    /// Attach the grid square and variable to a parse failure
    fn format_error(&self, variable: &str, error: ProcessingError) -> ProcessingError {
        match error {
            ProcessingError::MalformedRaster(_)
            | ProcessingError::DatasetFormat { .. }
            | ProcessingError::DatasetNotFound { .. } => error,
            other => ProcessingError::dataset_format(
                self.identifier.as_str(),
                variable,
                other.to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn context_with_square(files: &[(&str, &str)]) -> Result<(TempDir, DatasetContext)> {
        let dir = TempDir::new()?;
        let square = dir.path().join("54382129");
        fs::create_dir(&square)?;
        for (name, content) in files {
            fs::write(square.join(name), content)?;
        }
        let context = DatasetContext::open(dir.path(), Settings::default())?;
        Ok((dir, context))
    }

    #[test]
    fn test_missing_file_is_not_found() -> Result<()> {
        let (_dir, context) = context_with_square(&[])?;
        let dataset = context.dataset(&GridSquareId::new("54382129"));

        assert!(matches!(
            dataset.precipitation(),
            Err(ProcessingError::DatasetNotFound { ref variable, .. }) if variable == "precipitation"
        ));
        assert!(matches!(
            dataset.geology(),
            Err(ProcessingError::DatasetNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_unparsable_file_is_format_error() -> Result<()> {
        let (_dir, context) = context_with_square(&[
            ("bbox.json", "{\"minx\": 1.0}"),
            ("precipitation.csv", "date,value\n1978-01-01,wet\n"),
            ("dem.png", "not a png"),
        ])?;
        let dataset = context.dataset(&GridSquareId::new("54382129"));

        assert!(matches!(
            dataset.bounding_box(),
            Err(ProcessingError::DatasetFormat { .. })
        ));
        assert!(matches!(
            dataset.precipitation(),
            Err(ProcessingError::DatasetFormat { ref identifier, .. }) if identifier == "54382129"
        ));
        assert!(matches!(
            dataset.elevation(),
            Err(ProcessingError::DatasetFormat { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_accessors_are_independent() -> Result<()> {
        let (dir, context) = context_with_square(&[
            (
                "bbox.json",
                r#"{"minx": 138.25, "miny": 36.6, "maxx": 138.2625, "maxy": 36.608333}"#,
            ),
            ("lowest_temperature.csv", "date,value\n1978-01-01,-3.5\n"),
            ("landuse.csv", "category,area\n田,100\n"),
        ])?;
        let mut dem = RgbImage::from_pixel(2, 2, Rgb([0, 0x03, 0xE8]));
        dem.put_pixel(0, 0, Rgb([128, 0, 0]));
        dem.save(dir.path().join("54382129").join("dem.png"))?;

        let dataset = context.dataset(&GridSquareId::new("54382129"));
        assert_eq!(dataset.bounding_box()?.west, 138.25);
        assert_eq!(dataset.lowest_temperature()?.valid_count(), 1);
        assert_eq!(dataset.land_use()?.len(), 1);
        assert!(dataset.highest_temperature().is_err());

        let elevation = dataset.elevation()?;
        assert_eq!(elevation.get(0, 0), None);
        assert_eq!(elevation.get(1, 1), Some(10.0));
        // reading twice gives the same grid
        assert_eq!(dataset.elevation()?, elevation);
        Ok(())
    }

    #[test]
    fn test_discover_identifiers_sorted_directories_only() -> Result<()> {
        let dir = TempDir::new()?;
        for name in ["54382130", "53394611", "54382129"] {
            fs::create_dir(dir.path().join(name))?;
        }
        fs::write(dir.path().join("geology_hex.json"), r##"{"#ff0000": 1}"##)?;

        let context = DatasetContext::open(dir.path(), Settings::default())?;
        let ids: Vec<String> = context
            .discover_identifiers()?
            .into_iter()
            .map(|id| id.to_string())
            .collect();

        assert_eq!(ids, vec!["53394611", "54382129", "54382130"]);
        assert_eq!(context.legend().map(GeologyLegend::codes), Some(vec![1]));
        Ok(())
    }

    #[test]
    fn test_missing_base_directory_is_fatal() {
        let result = DatasetContext::open(Path::new("/nonexistent/meshes"), Settings::default());
        assert!(matches!(result, Err(ProcessingError::BaseDirectory { .. })));
    }
}
