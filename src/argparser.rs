use clap::{Parser, Subcommand};

use crate::inspect::InspectArgs;
use crate::merge::MergeArgs;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode design files and write a per-part summary.
    Inspect(InspectArgs),

    /// Import the helices of a fragment design into a part of a target design.
    Merge(MergeArgs),
}
