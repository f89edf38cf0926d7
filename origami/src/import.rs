use log::{debug, info, warn};
use std::collections::BTreeSet;

use crate::decode::attach_insertion;
use crate::error::{DesignError, Result};
use crate::model::{HelixPlacement, Part};
use crate::record::PartRecord;
use crate::transaction::{NoopTransactionLog, TransactionLog};

pub const IMPORT_BATCH_LABEL: &str = "Import to Part";

/// Copies the helices of `fragment` into `part` under fresh ids.
///
/// Fragment helix `i` (by position in its `vh_list`) becomes
/// `max_id + 1 + i`, so existing ids are never reused. Origins are shifted by
/// `offset` and creation is collision checked; helices the part rejects are
/// left out together with every strand, crossover and insertion that touches
/// them. Returns the ids that were actually created.
///
/// All edits are bracketed in one batch on `log`.
pub fn import_to_part(
    part: &mut Part,
    fragment: &PartRecord,
    offset: Option<(f64, f64)>,
    log: Option<&mut dyn TransactionLog>,
) -> Result<BTreeSet<usize>> {
    let mut noop = NoopTransactionLog;
    let log: &mut dyn TransactionLog = match log {
        Some(log) => log,
        None => &mut noop,
    };

    log.begin_batch(IMPORT_BATCH_LABEL);
    let result = copy_fragment(part, fragment, offset);
    log.commit_batch();
    result
}

fn copy_fragment(
    part: &mut Part,
    fragment: &PartRecord,
    offset: Option<(f64, f64)>,
) -> Result<BTreeSet<usize>> {
    let id_offset = part.max_id_num().map_or(0, |max_id| max_id + 1);
    let (dx, dy) = offset.unwrap_or((0.0, 0.0));
    debug!("Importing {} helices from id {}", fragment.vh_list.len(), id_offset);

    let mut copied: BTreeSet<usize> = BTreeSet::new();
    let mut new_ids: BTreeSet<usize> = BTreeSet::new();

    for (i, &(id_num, size)) in fragment.vh_list.iter().enumerate() {
        let &(x, y) = fragment
            .origins
            .get(i)
            .ok_or(DesignError::MissingOrigin(i))?;
        let new_id = id_offset + i;
        let columns = fragment.helix_columns(i);
        if !columns.iter().any(|(key, _)| key == "name") {
            warn!("Fragment helix {} has no name, using vh{}", i, id_num);
        }
        // Unnamed helices fall back to their id in the fragment.
        let mut placement = HelixPlacement::from_columns(id_num, (x + dx, y + dy), size, &columns);
        placement.id_num = new_id;
        placement.name.push_str(&format!(".{}", new_id));

        if part.create_virtual_helix(placement, true) {
            copied.insert(i);
            new_ids.insert(new_id);
        } else {
            warn!("Skipped fragment helix {}: could not place it as {}", i, new_id);
        }
    }

    for &i in &copied {
        let Some(strands) = fragment.strands.helix_strands(i) else {
            continue;
        };
        let new_id = id_offset + i;
        let (fwd_strand_set, rev_strand_set) = part.strand_sets_mut(new_id)?;
        for (low_idx, high_idx, color) in &strands.fwd {
            fwd_strand_set.create_deserialized_strand(*low_idx, *high_idx, color);
        }
        for (low_idx, high_idx, color) in &strands.rev {
            rev_strand_set.create_deserialized_strand(*low_idx, *high_idx, color);
        }
        part.refresh_segments(new_id);
    }

    for &(from_i, from_dir, from_idx, to_i, to_dir, to_idx) in &fragment.xovers {
        if !copied.contains(&from_i) || !copied.contains(&to_i) {
            warn!(
                "Skipped crossover {}[{}] -> {}[{}]: endpoint helix was not imported",
                from_i, from_idx, to_i, to_idx
            );
            continue;
        }
        let linked = part
            .require_strand(from_dir, from_i + id_offset, from_idx)
            .and_then(|from| {
                let to = part.require_strand(to_dir, to_i + id_offset, to_idx)?;
                Ok((from, to))
            })
            .and_then(|(from, to)| part.create_xover(from, from_idx, to, to_idx));
        if let Err(e) = linked {
            warn!("Skipped crossover {}[{}] -> {}[{}]: {}", from_i, from_idx, to_i, to_idx, e);
        }
    }
    part.refresh_oligos();

    for &(i, idx, length) in &fragment.insertions {
        if copied.contains(&i) {
            attach_insertion(part, i + id_offset, idx, length);
        }
    }
    part.refresh_oligo_lengths();

    info!(
        "Imported {} of {} helices into part {}",
        new_ids.len(),
        fragment.vh_list.len(),
        part.uuid
    );
    Ok(new_ids)
}
