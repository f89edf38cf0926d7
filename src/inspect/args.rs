use clap::Parser;

#[derive(Parser, Debug)]
pub struct InspectArgs {
    #[arg(short, long, required = true, num_args(1..), help = "Path to one or more design files (.json).")]
    pub input: Vec<String>,

    #[arg(short, long, required = true, help = "Path to the summary file. Must be a .tsv file.")]
    pub output: String,

    #[arg(short, long, default_value_t = 1, help = "Number of design files to decode in parallel.")]
    pub threads: usize,

    #[arg(
        long,
        default_value_t = false,
        help = "Report helix and oligo notifications while decoding (visible with RUST_LOG=debug)."
    )]
    pub emit_signals: bool,
}
