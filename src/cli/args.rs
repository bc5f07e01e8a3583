use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mesh-processor")]
#[command(about = "Decode grid-square environmental datasets and summarize them into a TSV report")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize every grid square under a base directory
    Stats {
        #[arg(short, long, help = "Base directory with one subdirectory per grid square")]
        input_dir: PathBuf,

        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        #[arg(short, long, help = "Settings file (TOML, JSON or YAML)")]
        config: Option<PathBuf>,

        #[arg(long, help = "Worker threads [default: settings, then CPU count]")]
        max_workers: Option<usize>,

        #[arg(long, help = "Report file name [default: mesh_stats.tsv]")]
        report_name: Option<String>,

        #[arg(short, long, help = "Hide the progress bar")]
        quiet: bool,
    },

    /// Open one grid square and show what every accessor returns
    Inspect {
        #[arg(short, long)]
        input_dir: PathBuf,

        #[arg(short, long, help = "Grid square identifier (mesh code)")]
        mesh_code: String,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write the 468 monthly values of one climate variable
    Monthly {
        #[arg(short, long)]
        input_dir: PathBuf,

        #[arg(short, long, help = "Grid square identifier (mesh code)")]
        mesh_code: String,

        #[arg(
            long,
            help = "precipitation, daylight_hours, solar_radiation, average_temperature, lowest_temperature or highest_temperature"
        )]
        variable: String,

        #[arg(
            short,
            long,
            help = "Output TSV path [default: output/{mesh_code}-{variable}-monthly.tsv]"
        )]
        output_file: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
