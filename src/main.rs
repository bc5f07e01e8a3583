use anyhow::Context;
use clap::Parser;
use mesh_processor::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).context("mesh-processor failed")
}
