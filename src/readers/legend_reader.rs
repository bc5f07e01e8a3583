use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::readers::raster_decoder::pack_components;

/// Color to geology code table shared by every grid square of a base directory
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeologyLegend {
    colors: HashMap<u32, u32>,
}

#[derive(Deserialize)]
struct LegendRecord {
    hex: String,
    code: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LegendFile {
    Pairs(Vec<(String, u32)>),
    Records(Vec<LegendRecord>),
    Map(BTreeMap<String, u32>),
}

impl GeologyLegend {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let legend = Self::from_json_str(&text)?;
        debug!(
            "Loaded {} legend colors from {}",
            legend.len(),
            path.display()
        );
        Ok(legend)
    }

    /// Parse `[["#rrggbb", code]]`, `[{"hex": .., "code": ..}]` or `{"#rrggbb": code}`
    pub fn from_json_str(text: &str) -> Result<Self> {
        let entries: Vec<(String, u32)> = match serde_json::from_str::<LegendFile>(text)? {
            LegendFile::Pairs(pairs) => pairs,
            LegendFile::Records(records) => records.into_iter().map(|r| (r.hex, r.code)).collect(),
            LegendFile::Map(map) => map.into_iter().collect(),
        };

        let mut colors = HashMap::with_capacity(entries.len());
        for (hex, code) in entries {
            let packed = parse_hex_color(&hex)?;
            if let Some(previous) = colors.insert(packed, code) {
                if previous != code {
                    return Err(ProcessingError::InvalidFormat(format!(
                        "Legend color {} maps to both {} and {}",
                        hex, previous, code
                    )));
                }
            }
        }

        Ok(Self { colors })
    }

    pub fn code_for(&self, packed_color: u32) -> Option<u32> {
        self.colors.get(&packed_color).copied()
    }

    /// Distinct codes, ascending
    pub fn codes(&self) -> Vec<u32> {
        let mut codes: Vec<u32> = self.colors.values().copied().collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// `#rrggbb` (leading `#` optional) packed the same way as an RGB pixel
pub fn parse_hex_color(hex: &str) -> Result<u32> {
    let digits = hex.trim().trim_start_matches('#');
    let invalid = || ProcessingError::InvalidFormat(format!("Invalid hex color: '{}'", hex));

    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }

    let mut components = [0u8; 3];
    for (i, component) in components.iter_mut().enumerate() {
        *component = u8::from_str_radix(&digits[2 * i..2 * i + 2], 16).map_err(|_| invalid())?;
    }
    Ok(pack_components(&components))
}
