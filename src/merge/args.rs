use clap::Parser;

#[derive(Parser, Debug)]
pub struct MergeArgs {
    #[arg(short, long, required = true, help = "Path to the design receiving the helices.")]
    pub target: String,

    #[arg(short, long, required = true, help = "Path to the design whose first part is imported.")]
    pub fragment: String,

    #[arg(long, default_value_t = 0, help = "Index of the target part to import into.")]
    pub part: usize,

    #[arg(long, allow_hyphen_values = true, help = "Shift imported helices along x.")]
    pub dx: Option<f64>,

    #[arg(long, allow_hyphen_values = true, help = "Shift imported helices along y.")]
    pub dy: Option<f64>,

    #[arg(short, long, required = true, help = "Path to the table of created helices. Must be a .tsv file.")]
    pub output: String,
}

impl MergeArgs {
    pub fn offset(&self) -> Option<(f64, f64)> {
        match (self.dx, self.dy) {
            (None, None) => None,
            (dx, dy) => Some((dx.unwrap_or(0.0), dy.unwrap_or(0.0))),
        }
    }
}
