use chrono::NaiveDate;

/// First day of every daily series
pub const PERIOD_START: NaiveDate = match NaiveDate::from_ymd_opt(1978, 1, 1) {
    Some(date) => date,
    None => panic!("invalid period start"),
};

/// Last day of every daily series (inclusive)
pub const PERIOD_END: NaiveDate = match NaiveDate::from_ymd_opt(2016, 12, 31) {
    Some(date) => date,
    None => panic!("invalid period end"),
};

pub const PERIOD_START_YEAR: i32 = 1978;
pub const PERIOD_END_YEAR: i32 = 2016;

/// Days in [PERIOD_START, PERIOD_END], 39 years with 10 leap days
pub const PERIOD_DAYS: usize = 14_245;

/// Calendar months in the period
pub const PERIOD_MONTHS: usize = 468;

/// Default climatology window used by the report
pub const DEFAULT_CLIMATOLOGY_START_YEAR: i32 = 1986;
pub const DEFAULT_CLIMATOLOGY_END_YEAR: i32 = 2015;

/// File names inside a grid-square directory
pub const BBOX_FILE: &str = "bbox.json";
pub const PRECIPITATION_FILE: &str = "precipitation.csv";
pub const DAYLIGHT_HOURS_FILE: &str = "daylight_hours.csv";
pub const SOLAR_RADIATION_FILE: &str = "solar_radiation.csv";
pub const AVERAGE_TEMPERATURE_FILE: &str = "average_temperature.csv";
pub const LOWEST_TEMPERATURE_FILE: &str = "lowest_temperature.csv";
pub const HIGHEST_TEMPERATURE_FILE: &str = "highest_temperature.csv";
pub const LAND_USE_FILE: &str = "landuse.csv";
pub const ELEVATION_FILE: &str = "dem.png";
pub const SLOPE_FILE: &str = "slope.png";
pub const DIRECTION_FILE: &str = "direction.png";
pub const GEOLOGY_FILE: &str = "geology.png";

/// Legend file at the base directory root
pub const GEOLOGY_LEGEND_FILE: &str = "geology_hex.json";

/// Output file names
pub const REPORT_FILE: &str = "mesh_stats.tsv";
pub const CATEGORY_SUMMARY_FILE: &str = "geology_summary.tsv";

/// Data-PNG defaults: 24-bit signed RGB, 0.01 units, (128, 0, 0) = no data
pub const DATA_PNG_CHANNELS: usize = 3;
pub const DATA_PNG_SCALE: f64 = 0.01;
pub const DATA_PNG_NO_DATA: u32 = 0x80_00_00;

/// Missing value marker in series files
pub const SERIES_MISSING_MARKER: f64 = -9999.0;

/// Written in place of a missing statistic
pub const REPORT_NO_DATA_MARKER: &str = "NA";

pub const DEFAULT_ENCODING: &str = "utf-8";
