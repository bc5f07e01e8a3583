use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    AVERAGE_TEMPERATURE_FILE, DAYLIGHT_HOURS_FILE, HIGHEST_TEMPERATURE_FILE,
    LOWEST_TEMPERATURE_FILE, PERIOD_DAYS, PERIOD_END, PERIOD_START, PRECIPITATION_FILE,
    SOLAR_RADIATION_FILE,
};

/// How daily samples combine into one monthly value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonthlyReduction {
    /// Mean of the valid daily samples
    Mean,
    /// Total of the valid daily samples
    Sum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClimateVariable {
    Precipitation,
    DaylightHours,
    SolarRadiation,
    AverageTemperature,
    LowestTemperature,
    HighestTemperature,
}

impl ClimateVariable {
    pub const ALL: [ClimateVariable; 6] = [
        ClimateVariable::Precipitation,
        ClimateVariable::DaylightHours,
        ClimateVariable::SolarRadiation,
        ClimateVariable::AverageTemperature,
        ClimateVariable::LowestTemperature,
        ClimateVariable::HighestTemperature,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ClimateVariable::Precipitation => PRECIPITATION_FILE,
            ClimateVariable::DaylightHours => DAYLIGHT_HOURS_FILE,
            ClimateVariable::SolarRadiation => SOLAR_RADIATION_FILE,
            ClimateVariable::AverageTemperature => AVERAGE_TEMPERATURE_FILE,
            ClimateVariable::LowestTemperature => LOWEST_TEMPERATURE_FILE,
            ClimateVariable::HighestTemperature => HIGHEST_TEMPERATURE_FILE,
        }
    }

    /// snake_case name, also the file name without extension
    pub fn file_stem(&self) -> &'static str {
        match self {
            ClimateVariable::Precipitation => "precipitation",
            ClimateVariable::DaylightHours => "daylight_hours",
            ClimateVariable::SolarRadiation => "solar_radiation",
            ClimateVariable::AverageTemperature => "average_temperature",
            ClimateVariable::LowestTemperature => "lowest_temperature",
            ClimateVariable::HighestTemperature => "highest_temperature",
        }
    }

    /// Column prefix in the TSV report
    pub fn column_key(&self) -> &'static str {
        match self {
            ClimateVariable::Precipitation => "prec",
            ClimateVariable::DaylightHours => "daylight",
            ClimateVariable::SolarRadiation => "solar",
            ClimateVariable::AverageTemperature => "temp",
            ClimateVariable::LowestTemperature => "temp_min",
            ClimateVariable::HighestTemperature => "temp_max",
        }
    }

    /// Accumulated quantities are totalled per month, temperatures averaged
    pub fn monthly_reduction(&self) -> MonthlyReduction {
        match self {
            ClimateVariable::Precipitation
            | ClimateVariable::DaylightHours
            | ClimateVariable::SolarRadiation => MonthlyReduction::Sum,
            ClimateVariable::AverageTemperature
            | ClimateVariable::LowestTemperature
            | ClimateVariable::HighestTemperature => MonthlyReduction::Mean,
        }
    }

    pub fn units(&self) -> &'static str {
        match self {
            ClimateVariable::Precipitation => "mm",
            ClimateVariable::DaylightHours => "h",
            ClimateVariable::SolarRadiation => "MJ/m²",
            _ => "°C",
        }
    }
}

impl fmt::Display for ClimateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.file_stem())
    }
}

impl FromStr for ClimateVariable {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        ClimateVariable::ALL
            .into_iter()
            .find(|v| v.file_stem() == wanted || v.column_key() == wanted)
            .ok_or_else(|| format!("Unknown climate variable: '{}'", s))
    }
}

/// One optional sample per day from PERIOD_START to PERIOD_END
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    values: Vec<Option<f64>>,
}

impl DailySeries {
    /// Series with every day missing
    pub fn empty() -> Self {
        Self {
            values: vec![None; PERIOD_DAYS],
        }
    }

    pub fn from_values(values: Vec<Option<f64>>) -> Result<Self> {
        if values.len() != PERIOD_DAYS {
            return Err(ProcessingError::InvalidFormat(format!(
                "Daily series must have {} values, got {}",
                PERIOD_DAYS,
                values.len()
            )));
        }
        Ok(Self { values })
    }

    /// Slot of a date inside the period, None outside it
    pub fn index_of(date: NaiveDate) -> Option<usize> {
        if date < PERIOD_START || date > PERIOD_END {
            return None;
        }
        usize::try_from((date - PERIOD_START).num_days()).ok()
    }

    pub fn date_at(index: usize) -> Option<NaiveDate> {
        if index >= PERIOD_DAYS {
            return None;
        }
        PERIOD_START.checked_add_signed(Duration::days(index as i64))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        Self::index_of(date).and_then(|i| self.values[i])
    }

    pub(crate) fn set(&mut self, index: usize, value: Option<f64>) {
        self.values[index] = value;
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Non-missing samples in date order
    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// (date, sample) pairs over the whole period
    pub fn iter_dated(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        PERIOD_START
            .iter_days()
            .zip(self.values.iter().copied())
    }
}

/// One calendar month of an aggregated series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyValue {
    pub year: i32,
    pub month: u32,
    pub value: Option<f64>,
}

impl MonthlyValue {
    pub fn is_in_years(&self, start_year: i32, end_year: i32) -> bool {
        (start_year..=end_year).contains(&self.year)
    }
}

/// Month index (0-based) counted from January of the period start year
pub fn month_offset(date: NaiveDate) -> usize {
    let years = (date.year() - PERIOD_START.year()) as usize;
    years * 12 + date.month0() as usize
}
