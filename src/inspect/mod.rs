use anyhow::{Context, Result};
use humantime::format_duration;
use log::info;
use origami::DecodeOptions;
use std::{fs, path::Path, time::Instant};

use crate::processing::{decode_designs, summarize_document, write_tsv, PartSummary};

pub mod args;

pub use args::InspectArgs;

pub fn inspect(args: InspectArgs) -> Result<()> {
    info!(
        "Running strandloom 'inspect' on {} files with {} threads",
        args.input.len(),
        args.threads
    );
    let outpath = Path::new(&args.output);
    ensure_tsv_output(outpath)?;

    let options = DecodeOptions {
        emit_signals: args.emit_signals,
    };

    let decode_duration = Instant::now();
    let documents = decode_designs(&args.input, &options, args.threads)?;
    info!(
        "Decoded {} of {} designs in {}",
        documents.len(),
        args.input.len(),
        format_duration(decode_duration.elapsed())
    );
    if documents.is_empty() {
        anyhow::bail!("No design could be decoded!");
    }

    let mut summaries: Vec<PartSummary> = documents
        .iter()
        .flat_map(|(file, document)| summarize_document(file, document))
        .collect();
    summaries.sort_by(|a, b| a.file.cmp(&b.file).then(a.part.cmp(&b.part)));

    write_tsv(outpath, &summaries)?;
    info!("Wrote {} part summaries to {:?}", summaries.len(), outpath);
    Ok(())
}

/// Checks the output has a `.tsv` extension and creates its parent directory.
pub fn ensure_tsv_output(outpath: &Path) -> Result<()> {
    if let Some(ext) = outpath.extension() {
        if ext != "tsv" {
            anyhow::bail!("Incorrect file extension {:?}. Should be tsv", ext);
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Could not create parent directory: {:?}", parent))?;
        }
    } else {
        anyhow::bail!("No filename provided for output. Should be a .tsv file.");
    }
    Ok(())
}
