use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::{ProcessingError, Result};

/// Third-level mesh code naming one grid square directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridSquareId(String);

impl GridSquareId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GridSquareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GridSquareId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// (west, south, east, north) in geographic degrees, as written by the producer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct BoundingBox {
    #[serde(rename = "minx")]
    #[validate(range(min = -180.0, max = 180.0))]
    pub west: f64,

    #[serde(rename = "miny")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub south: f64,

    #[serde(rename = "maxx")]
    #[validate(range(min = -180.0, max = 180.0))]
    pub east: f64,

    #[serde(rename = "maxy")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Range checks plus corner ordering
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        if self.west > self.east || self.south > self.north {
            return Err(ProcessingError::InvalidFormat(format!(
                "Bounding box corners out of order: ({}, {}, {}, {})",
                self.west, self.south, self.east, self.north
            )));
        }

        Ok(())
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
}
