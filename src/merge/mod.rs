use anyhow::{Context, Result};
use humantime::format_duration;
use log::{debug, info};
use origami::{import_to_part, transaction::BatchRecorder, DecodeOptions, Part};
use serde::Serialize;
use std::{collections::BTreeSet, path::Path, time::Instant};

use crate::{
    data_load::load_design,
    inspect::ensure_tsv_output,
    processing::{decode_file, write_tsv},
};

pub mod args;

pub use args::MergeArgs;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelixRow {
    pub id_num: usize,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub size: i64,
    pub strands: usize,
}

pub fn merge(args: MergeArgs) -> Result<()> {
    info!(
        "Running strandloom 'merge': '{}' into part {} of '{}'",
        args.fragment, args.part, args.target
    );
    let outpath = Path::new(&args.output);
    ensure_tsv_output(outpath)?;

    let mut document = decode_file(&args.target, &DecodeOptions::default())?;
    let fragment = load_design(&args.fragment)?;
    let fragment_part = fragment
        .parts
        .first()
        .with_context(|| format!("Fragment has no parts: '{}'", args.fragment))?;

    let part = document
        .part_mut(args.part)
        .with_context(|| format!("Target has no part {}", args.part))?;

    let import_duration = Instant::now();
    let mut recorder = BatchRecorder::default();
    let new_ids = import_to_part(part, fragment_part, args.offset(), Some(&mut recorder))
        .context("Failed to import fragment")?;
    debug!("Committed batches: {:?}", recorder.committed);
    info!(
        "Imported {} of {} helices in {}",
        new_ids.len(),
        fragment_part.vh_list.len(),
        format_duration(import_duration.elapsed())
    );

    let rows = helix_rows(part, &new_ids);
    write_tsv(outpath, &rows)?;
    Ok(())
}

pub fn helix_rows(part: &Part, ids: &BTreeSet<usize>) -> Vec<HelixRow> {
    ids.iter()
        .filter_map(|&id_num| part.virtual_helix(id_num))
        .map(|vh| {
            let (fwd, rev) = vh.strand_sets();
            HelixRow {
                id_num: vh.id_num,
                name: vh.name.clone(),
                x: vh.x,
                y: vh.y,
                z: vh.z,
                size: vh.size,
                strands: fwd.len() + rev.len(),
            }
        })
        .collect()
}
