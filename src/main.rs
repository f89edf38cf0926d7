use anyhow::Result;
use clap::Parser;
use env_logger::Env;

mod argparser;
mod data_load;
mod inspect;
mod merge;
mod processing;

use argparser::{Cli, Commands};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect(args) => inspect::inspect(args)?,
        Commands::Merge(args) => merge::merge(args)?,
    }

    Ok(())
}
