use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::StatisticsSummary;
use crate::models::{BoundingBox, ClimateVariable, GridSquareId};

/// A variable that could not be read or decoded for one grid square
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableFailure {
    pub variable: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateStatistics {
    pub variable: ClimateVariable,
    pub summary: Option<StatisticsSummary>,
    /// Calendar-month normals over the configured year window
    pub climatology: Option<[Option<f64>; 12]>,
}

impl ClimateStatistics {
    pub fn missing(variable: ClimateVariable) -> Self {
        Self {
            variable,
            summary: None,
            climatology: None,
        }
    }
}

/// Everything summarized for one grid square; `None` marks a variable that failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub identifier: GridSquareId,
    pub bounding_box: Option<BoundingBox>,
    /// One entry per `ClimateVariable::ALL`, in that order
    pub climate: Vec<ClimateStatistics>,
    pub elevation: Option<StatisticsSummary>,
    pub slope: Option<StatisticsSummary>,
    pub direction_mean: Option<f64>,
    pub geology: Option<BTreeMap<u32, usize>>,
    pub failures: Vec<VariableFailure>,
}

impl ReportRow {
    pub fn new(identifier: GridSquareId) -> Self {
        Self {
            identifier,
            bounding_box: None,
            climate: ClimateVariable::ALL
                .into_iter()
                .map(ClimateStatistics::missing)
                .collect(),
            elevation: None,
            slope: None,
            direction_mean: None,
            geology: None,
            failures: Vec::new(),
        }
    }

    pub fn climate(&self, variable: ClimateVariable) -> Option<&ClimateStatistics> {
        self.climate.iter().find(|c| c.variable == variable)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Geology totals across every grid square of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub pixels: usize,
    pub grid_squares: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    /// Sorted by identifier
    pub rows: Vec<ReportRow>,
    /// Geology column set: legend codes, or the union of observed codes
    pub geology_codes: Vec<u32>,
    pub category_totals: BTreeMap<u32, CategoryTotal>,
}

impl AggregateReport {
    /// Assemble the report; rows are sorted and geology totals accumulated
    pub fn from_rows(mut rows: Vec<ReportRow>, legend_codes: Option<Vec<u32>>) -> Self {
        rows.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        let mut category_totals: BTreeMap<u32, CategoryTotal> = BTreeMap::new();
        for counts in rows.iter().filter_map(|r| r.geology.as_ref()) {
            for (&code, &pixels) in counts {
                let total = category_totals.entry(code).or_default();
                total.pixels += pixels;
                total.grid_squares += 1;
            }
        }

        let geology_codes = match legend_codes {
            Some(codes) => codes
                .into_iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            None => category_totals.keys().copied().collect(),
        };

        Self {
            rows,
            geology_codes,
            category_totals,
        }
    }

    pub fn failed_rows(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_complete()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.rows.iter().map(|r| r.failures.len()).sum()
    }

    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Mesh Statistics Report ===\n");
        summary.push_str(&format!("Grid squares: {}\n", self.rows.len()));
        summary.push_str(&format!(
            "Complete grid squares: {}\n",
            self.rows.len() - self.failed_rows()
        ));
        summary.push_str(&format!("Variable failures: {}\n", self.failure_count()));
        summary.push_str(&format!(
            "Geology categories: {}\n",
            self.geology_codes.len()
        ));

        let failures: Vec<_> = self
            .rows
            .iter()
            .flat_map(|r| r.failures.iter().map(move |f| (&r.identifier, f)))
            .collect();

        if !failures.is_empty() {
            summary.push_str("\nFirst 10 failures:\n");
            for (i, (identifier, failure)) in failures.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {} {}: {}\n",
                    i + 1,
                    identifier,
                    failure.variable,
                    failure.message
                ));
            }
        }

        summary
    }
}
