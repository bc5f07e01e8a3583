use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::analyzers::{
    frequency_count, mean_bearing, monthly_aggregates, monthly_climatology, summarize, truncated,
    StatisticsSummary,
};
use crate::error::{ProcessingError, Result};
use crate::models::{
    AggregateReport, ClimateStatistics, ClimateVariable, GridSquareId, ReportRow, TerrainVariable,
    VariableFailure, GEOLOGY_VARIABLE,
};
use crate::readers::{DatasetContext, GridSquareDataset};
use crate::settings::ReportSettings;
use crate::utils::progress::ProgressReporter;

/// Summarizes every grid square under a base directory into one report
pub struct BatchStatisticsRunner {
    max_workers: usize,
    show_progress: bool,
}

impl BatchStatisticsRunner {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Process every grid square; only an unreadable base directory aborts
    pub fn run(&self, context: &DatasetContext) -> Result<AggregateReport> {
        let started = Instant::now();
        let identifiers = context.discover_identifiers()?;
        let total = identifiers.len();
        info!(
            "Summarizing {} grid squares from {} with {} workers",
            total,
            context.base_dir().display(),
            self.max_workers
        );

        let progress = ProgressReporter::new(
            total as u64,
            &format!("Summarizing {} grid squares...", total),
            !self.show_progress,
        );
        let processed_count = AtomicUsize::new(0);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        // collect keeps the sorted identifier order whatever the worker count
        let rows: Vec<ReportRow> = pool.install(|| {
            identifiers
                .par_iter()
                .map(|identifier| {
                    let row = self.summarize_grid_square(context, identifier);

                    let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
                    progress.update(count as u64);

                    row
                })
                .collect()
        });

        let legend_codes = context.legend().map(|legend| legend.codes());
        let report = AggregateReport::from_rows(rows, legend_codes);

        progress.finish_with_message(&format!("Summarized {} grid squares", total));
        info!(
            "Finished {} grid squares ({} variable failures) in {:.2?}",
            total,
            report.failure_count(),
            started.elapsed()
        );

        Ok(report)
    }

    /// Load, decode and summarize one grid square
    ///
    /// Each variable is isolated: a failure leaves that variable as no-data
    /// and is recorded on the row.
    pub fn summarize_grid_square(
        &self,
        context: &DatasetContext,
        identifier: &GridSquareId,
    ) -> ReportRow {
        let dataset = context.dataset(identifier);
        let report_settings = &context.settings().report;
        let mut row = ReportRow::new(identifier.clone());
        let mut failures = Vec::new();

        row.bounding_box = recorded(&mut failures, identifier, "bbox", dataset.bounding_box());

        row.climate = ClimateVariable::ALL
            .into_iter()
            .map(|variable| {
                recorded(
                    &mut failures,
                    identifier,
                    variable.file_stem(),
                    climate_statistics(&dataset, variable, report_settings),
                )
                .unwrap_or_else(|| ClimateStatistics::missing(variable))
            })
            .collect();

        let truncate = report_settings.truncate_raster_samples;
        row.elevation = recorded(
            &mut failures,
            identifier,
            "elevation",
            terrain_summary(&dataset, TerrainVariable::Elevation, truncate),
        );
        row.slope = recorded(
            &mut failures,
            identifier,
            "slope",
            terrain_summary(&dataset, TerrainVariable::Slope, truncate),
        );
        row.direction_mean = recorded(
            &mut failures,
            identifier,
            "direction",
            dataset.direction().map(|grid| mean_bearing(grid.valid_values())),
        )
        .flatten();
        row.geology = recorded(
            &mut failures,
            identifier,
            GEOLOGY_VARIABLE,
            dataset.geology().map(|grid| frequency_count(grid.valid_values())),
        );

        row.failures = failures;
        debug!(
            "Summarized {} ({} failed variables)",
            identifier,
            row.failures.len()
        );
        row
    }
}

impl Default for BatchStatisticsRunner {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

/// Keep the value, or log the error and note it on the row
fn recorded<T>(
    failures: &mut Vec<VariableFailure>,
    identifier: &GridSquareId,
    variable: &str,
    result: Result<T>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{}: {} unavailable: {}", identifier, variable, e);
            failures.push(VariableFailure {
                variable: variable.to_string(),
                message: e.to_string(),
            });
            None
        }
    }
}

fn climate_statistics(
    dataset: &GridSquareDataset<'_>,
    variable: ClimateVariable,
    report: &ReportSettings,
) -> Result<ClimateStatistics> {
    let series = dataset.climate(variable)?;
    let monthly = monthly_aggregates(&series, variable.monthly_reduction());
    let climatology = monthly_climatology(
        &monthly,
        report.climatology_start_year,
        report.climatology_end_year,
    )?;

    Ok(ClimateStatistics {
        variable,
        summary: Some(summarize(series.valid_values())),
        climatology: Some(climatology),
    })
}

fn terrain_summary(
    dataset: &GridSquareDataset<'_>,
    variable: TerrainVariable,
    truncate: bool,
) -> Result<StatisticsSummary> {
    let grid = dataset.terrain(variable)?;
    let samples = grid
        .valid_values()
        .map(|v| if truncate { truncated(v) } else { v });
    Ok(summarize(samples))
}
