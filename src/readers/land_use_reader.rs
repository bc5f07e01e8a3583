use csv::{ReaderBuilder, Trim};
use encoding_rs::Encoding;
use std::path::Path;

use crate::error::{ProcessingError, Result};
use crate::models::{LandUseCategory, LandUseComposition};
use crate::readers::series_reader::read_text;

/// Reader for `category,area` land-use tables
pub struct LandUseReader {
    encoding: &'static Encoding,
}

impl LandUseReader {
    pub fn new() -> Self {
        Self {
            encoding: encoding_rs::UTF_8,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn read_land_use(&self, path: &Path) -> Result<LandUseComposition> {
        let text = read_text(path, self.encoding)?;
        self.parse_land_use(&text)
    }

    pub fn parse_land_use(&self, text: &str) -> Result<LandUseComposition> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let mut composition = LandUseComposition::new();
        for record in reader.records() {
            let record = record?;
            let (label, area) = match (record.get(0), record.get(1)) {
                (Some(label), Some(area)) => (label, area),
                _ => {
                    return Err(ProcessingError::InvalidFormat(
                        "expected category and area columns".to_string(),
                    ))
                }
            };

            let category = label
                .parse::<LandUseCategory>()
                .map_err(ProcessingError::InvalidFormat)?;
            let area = area
                .parse::<f64>()
                .ok()
                .filter(|a| a.is_finite() && *a >= 0.0)
                .ok_or_else(|| {
                    ProcessingError::InvalidFormat(format!(
                        "invalid area '{}' for {}",
                        area, category
                    ))
                })?;

            if !composition.insert(category, area) {
                return Err(ProcessingError::InvalidFormat(format!(
                    "category {} listed twice",
                    category
                )));
            }
        }

        Ok(composition)
    }
}

impl Default for LandUseReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels_and_keys() {
        let text = "category,area\n森林,6250.5\nroad,120\nゴルフ場,0\n";
        let composition = LandUseReader::new().parse_land_use(text).unwrap();

        assert_eq!(composition.len(), 3);
        assert_eq!(composition.area(LandUseCategory::Forest), Some(6250.5));
        assert_eq!(composition.area(LandUseCategory::Road), Some(120.0));
        assert_eq!(composition.area(LandUseCategory::PaddyField), None);
        assert_eq!(
            composition.dominant().map(|(c, _)| c),
            Some(LandUseCategory::Forest)
        );
    }

    #[test]
    fn test_rejects_bad_rows() {
        let reader = LandUseReader::new();
        assert!(reader.parse_land_use("category,area\n森林,1\nforest,2\n").is_err());
        assert!(reader.parse_land_use("category,area\nswamp,1\n").is_err());
        assert!(reader.parse_land_use("category,area\n田,-5\n").is_err());
        assert!(reader.parse_land_use("category,area\n田,many\n").is_err());
    }
}
