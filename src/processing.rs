use ahash::AHashSet;
use anyhow::{Context, Result};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressState, ProgressStyle};
use log::{debug, warn};
use origami::{
    model::PropertyValue, DecodeOptions, DesignObserver, Document, OligoId, OrthoViewType, PartId,
};
use rayon::prelude::*;
use serde::Serialize;
use std::{fmt::Write, path::Path};

use crate::data_load::load_design;

/// One row of the `inspect` summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartSummary {
    pub file: String,
    pub part: PartId,
    pub uuid: String,
    pub name: String,
    pub grid_type: String,
    pub view: String,
    pub helices: usize,
    pub strands: usize,
    pub xovers: usize,
    pub oligos: usize,
    pub circular_oligos: usize,
    pub colors: usize,
    pub insertions: usize,
    pub skips: usize,
    pub mods: usize,
}

/// Counts structural notifications while a file is decoded.
#[derive(Debug, Default)]
pub struct EventTally {
    pub helices: usize,
    pub oligos: usize,
    pub properties: usize,
}

impl DesignObserver for EventTally {
    fn virtual_helix_added(&mut self, _part: PartId, _id_num: usize) {
        self.helices += 1;
    }

    fn oligo_added(&mut self, _part: PartId, _oligo: OligoId) {
        self.oligos += 1;
    }

    fn part_property_changed(&mut self, part: PartId, key: &str, value: &PropertyValue) {
        debug!("Part {} property {} = {}", part, key, value);
        self.properties += 1;
    }

    fn ortho_view_type_changed(&mut self, view: OrthoViewType) {
        debug!("Default view: {}", view);
    }
}

pub fn decode_file<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<Document> {
    let design = load_design(&path)?;
    let mut document = Document::new();
    let mut tally = EventTally::default();
    origami::decode(&mut document, &design, options, &mut tally)
        .with_context(|| format!("Failed to decode design: {:?}", path.as_ref()))?;

    if options.emit_signals {
        debug!(
            "{:?}: {} helix, {} oligo and {} property notifications",
            path.as_ref(),
            tally.helices,
            tally.oligos,
            tally.properties
        );
    }
    Ok(document)
}

/// Decodes every file on its own document, `num_threads` at a time. Files
/// that fail are reported and left out.
pub fn decode_designs(
    paths: &[String],
    options: &DecodeOptions,
    num_threads: usize,
) -> Result<Vec<(String, Document)>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .context("Could not initialize threadpool")?;

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
        )
        .context("Invalid progress bar template")?
        .with_key("eta", |state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
        })
        .progress_chars("#>-"),
    );

    let documents: Vec<(String, Document)> = pool.install(|| {
        paths
            .par_iter()
            .progress_with(pb.clone())
            .filter_map(|path| match decode_file(path, options) {
                Ok(document) => Some((path.clone(), document)),
                Err(e) => {
                    warn!("Skipping {}: {:#}", path, e);
                    None
                }
            })
            .collect()
    });
    pb.finish_with_message("Finished decoding all designs.");

    Ok(documents)
}

pub fn summarize_document(file: &str, document: &Document) -> Vec<PartSummary> {
    let view = document
        .ortho_view_type()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "none".to_string());

    document
        .parts()
        .iter()
        .enumerate()
        .map(|(part_id, part)| {
            let colors: AHashSet<&str> = part.oligos().iter().map(|o| o.color.as_str()).collect();
            let insertions = part.insertions();
            let (insertions, skips) = insertions
                .values()
                .flat_map(|by_idx| by_idx.values())
                .fold((0, 0), |(ins, skip), &length| {
                    if length > 0 {
                        (ins + 1, skip)
                    } else {
                        (ins, skip + 1)
                    }
                });

            PartSummary {
                file: file.to_string(),
                part: part_id,
                uuid: part.uuid.clone(),
                name: part.properties.name.clone(),
                grid_type: part.grid_type.to_string(),
                view: view.clone(),
                helices: part.helix_count(),
                strands: part.strand_count(),
                xovers: part.xovers().len(),
                oligos: part.oligos().len(),
                circular_oligos: part.oligos().iter().filter(|o| o.is_circular).count(),
                colors: colors.len(),
                insertions,
                skips,
                mods: part.mod_instances().len(),
            }
        })
        .collect()
}

pub fn write_tsv<P: AsRef<Path>, T: Serialize>(path: P, rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&path)
        .with_context(|| format!("Failed to create file at: {:?}", path.as_ref()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
