pub mod grid_square;
pub mod land_use;
pub mod raster;
pub mod report;
pub mod series;

pub use grid_square::{BoundingBox, GridSquareId};
pub use land_use::{LandUseCategory, LandUseComposition};
pub use raster::{RasterGrid, TerrainVariable, GEOLOGY_VARIABLE};
pub use report::{AggregateReport, CategoryTotal, ClimateStatistics, ReportRow, VariableFailure};
pub use series::{ClimateVariable, DailySeries, MonthlyReduction, MonthlyValue};
