use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;

use crate::analyzers::{frequency_count, mean_bearing, monthly_aggregates, summarize};
use crate::cli::args::{Cli, Commands};
use crate::error::{ProcessingError, Result};
use crate::models::{ClimateVariable, GridSquareId, TerrainVariable};
use crate::processors::BatchStatisticsRunner;
use crate::readers::{DatasetContext, GridSquareDataset};
use crate::settings::Settings;
use crate::utils::filename::{generate_default_monthly_filename, output_file_path};
use crate::writers::TsvWriter;

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Stats {
            input_dir,
            output_dir,
            config,
            max_workers,
            report_name,
            quiet,
        } => {
            let mut settings = Settings::load(config.as_deref())?;
            if let Some(workers) = max_workers {
                settings.processing.max_workers = workers;
            }
            if let Some(name) = report_name {
                settings.report.report_file = name;
            }
            settings.check()?;

            println!("Summarizing grid squares...");
            println!("Input directory: {}", input_dir.display());
            println!("Output directory: {}", output_dir.display());
            println!("Workers: {}", settings.processing.max_workers);

            let context = DatasetContext::open(&input_dir, settings)?;
            let runner = BatchStatisticsRunner::new(context.settings().processing.max_workers)
                .with_progress(!quiet);
            let report = runner.run(&context)?;

            println!("\n{}", report.generate_summary());

            fs::create_dir_all(&output_dir)?;
            let report_settings = &context.settings().report;
            let writer = TsvWriter::new().with_no_data_marker(&report_settings.no_data_marker);

            let report_path = output_file_path(&output_dir, &report_settings.report_file);
            writer.write_report(&report, &report_path)?;
            let summary_path = output_file_path(&output_dir, &report_settings.summary_file);
            writer.write_category_summary(&report, &summary_path)?;

            println!("Report written to {}", report_path.display());
            println!("Geology summary written to {}", summary_path.display());
        }

        Commands::Inspect {
            input_dir,
            mesh_code,
            config,
        } => {
            let context = DatasetContext::open(&input_dir, Settings::load(config.as_deref())?)?;
            let dataset = context.dataset(&GridSquareId::new(mesh_code));

            println!("Grid square {}", dataset.identifier());
            println!("Directory: {}", dataset.directory().display());
            for line in describe_dataset(&dataset) {
                println!("  {}", line);
            }
        }

        Commands::Monthly {
            input_dir,
            mesh_code,
            variable,
            output_file,
            config,
        } => {
            let variable: ClimateVariable = variable.parse().map_err(ProcessingError::Config)?;
            let context = DatasetContext::open(&input_dir, Settings::load(config.as_deref())?)?;
            let identifier = GridSquareId::new(mesh_code);

            let series = context.dataset(&identifier).climate(variable)?;
            let monthly = monthly_aggregates(&series, variable.monthly_reduction());

            let output_file = output_file
                .unwrap_or_else(|| generate_default_monthly_filename(&identifier, variable));
            if let Some(parent) = output_file.parent() {
                fs::create_dir_all(parent)?;
            }

            TsvWriter::new()
                .with_no_data_marker(&context.settings().report.no_data_marker)
                .write_monthly(&monthly, &output_file)?;

            let missing = monthly.iter().filter(|m| m.value.is_none()).count();
            println!(
                "Wrote {} monthly {} values ({} without data) to {}",
                monthly.len(),
                variable,
                missing,
                output_file.display()
            );
        }
    }

    Ok(())
}

/// Install the fmt subscriber: stderr by default, or a plain-text log file
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| ProcessingError::Config(format!("Cannot install logger: {}", e)))
}

/// One line per accessor; a failing accessor shows its error
pub fn describe_dataset(dataset: &GridSquareDataset<'_>) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(match dataset.bounding_box() {
        Ok(bbox) => format!(
            "{:<20} west={} south={} east={} north={}",
            "bbox", bbox.west, bbox.south, bbox.east, bbox.north
        ),
        Err(e) => format!("{:<20} {}", "bbox", e),
    });

    for variable in ClimateVariable::ALL {
        lines.push(match dataset.climate(variable) {
            Ok(series) => format!(
                "{:<20} {} of {} days valid ({}) {}",
                variable,
                series.valid_count(),
                series.len(),
                variable.units(),
                summarize(series.valid_values()).summary()
            ),
            Err(e) => format!("{:<20} {}", variable, e),
        });
    }

    lines.push(match dataset.land_use() {
        Ok(composition) => {
            let dominant = composition
                .dominant()
                .map(|(category, area)| format!("{} ({}) {}", category, category.label(), area))
                .unwrap_or_else(|| "none".to_string());
            format!(
                "{:<20} {} categories, total area {}, dominant {}",
                "land_use",
                composition.len(),
                composition.total_area(),
                dominant
            )
        }
        Err(e) => format!("{:<20} {}", "land_use", e),
    });

    for variable in TerrainVariable::ALL {
        lines.push(match dataset.terrain(variable) {
            Ok(grid) => {
                let statistics = if variable.is_angular() {
                    match mean_bearing(grid.valid_values()) {
                        Some(bearing) => format!("mean bearing={:.2}", bearing),
                        None => "mean bearing undefined".to_string(),
                    }
                } else {
                    summarize(grid.valid_values()).summary()
                };
                format!(
                    "{:<20} {}x{} cells, {} no-data, {}",
                    variable,
                    grid.rows(),
                    grid.cols(),
                    grid.no_data_count(),
                    statistics
                )
            }
            Err(e) => format!("{:<20} {}", variable, e),
        });
    }

    lines.push(match dataset.geology() {
        Ok(grid) => {
            let counts = frequency_count(grid.valid_values());
            let listed: Vec<String> = counts
                .iter()
                .map(|(code, count)| format!("{}:{}", code, count))
                .collect();
            format!(
                "{:<20} {}x{} cells, {} no-data, codes {}",
                "geology",
                grid.rows(),
                grid.cols(),
                grid.no_data_count(),
                listed.join(" ")
            )
        }
        Err(e) => format!("{:<20} {}", "geology", e),
    });

    lines
}
