use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{DIRECTION_FILE, ELEVATION_FILE, SLOPE_FILE};

/// Real-valued terrain rasters stored as data PNGs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TerrainVariable {
    Elevation,
    Slope,
    Direction,
}

impl TerrainVariable {
    pub const ALL: [TerrainVariable; 3] = [
        TerrainVariable::Elevation,
        TerrainVariable::Slope,
        TerrainVariable::Direction,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            TerrainVariable::Elevation => ELEVATION_FILE,
            TerrainVariable::Slope => SLOPE_FILE,
            TerrainVariable::Direction => DIRECTION_FILE,
        }
    }

    pub fn column_key(&self) -> &'static str {
        match self {
            TerrainVariable::Elevation => "ele",
            TerrainVariable::Slope => "slp",
            TerrainVariable::Direction => "dir",
        }
    }

    /// Directions are bearings and need circular statistics
    pub fn is_angular(&self) -> bool {
        matches!(self, TerrainVariable::Direction)
    }
}

impl fmt::Display for TerrainVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerrainVariable::Elevation => "elevation",
            TerrainVariable::Slope => "slope",
            TerrainVariable::Direction => "direction",
        };
        f.pad(name)
    }
}

/// Name used in errors and logs for the geology raster
pub const GEOLOGY_VARIABLE: &str = "geology";

/// Rectangular grid stored row-major; None marks a no-data cell
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<Option<T>>,
}

impl<T: Copy> RasterGrid<T> {
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<Option<T>>) -> Result<Self> {
        if cells.len() != rows * cols {
            return Err(ProcessingError::MalformedRaster(format!(
                "{} cells do not fill a {}x{} grid",
                cells.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, cells })
    }

    /// Build from nested rows; every row must have the same length
    pub fn from_rows(rows: Vec<Vec<Option<T>>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let row_count = rows.len();
        let mut cells = Vec::with_capacity(row_count * cols);

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(ProcessingError::MalformedRaster(format!(
                    "row {} has {} cells, expected {}",
                    index,
                    row.len(),
                    cols
                )));
            }
            cells.extend(row);
        }

        Ok(Self {
            rows: row_count,
            cols,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells[row * self.cols + col]
    }

    pub fn cells(&self) -> &[Option<T>] {
        &self.cells
    }

    pub fn valid_values(&self) -> impl Iterator<Item = T> + '_ {
        self.cells.iter().filter_map(|c| *c)
    }

    pub fn valid_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn no_data_count(&self) -> usize {
        self.cells.len() - self.valid_count()
    }

    pub fn to_rows(&self) -> Vec<Vec<Option<T>>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.cells.chunks(self.cols).map(<[_]>::to_vec).collect()
    }
}
