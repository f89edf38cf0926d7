use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::error::{DesignError, Result};
use crate::lattice::GridType;
use crate::model::{Document, HelixPlacement, Part, PartId, PropertyValue, DEFAULT_EULER_Z};
use crate::observer::{DesignEvent, DesignObserver, EventQueue};
use crate::record::{DesignFile, ModificationRecord, PartRecord, PointType};
use crate::view_mode::{determine_ortho_view_type, RecordedView};
use crate::Direction;

/// Part-level scalars restored after the topology, in this order.
pub const PART_PROPERTY_KEYS: [&str; 4] = ["name", "color", "crossover_span_angle", "max_vhelix_length"];

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Emit structural notifications (helices, oligos, z extent). Property
    /// changes are always reported.
    pub emit_signals: bool,
}

/// Parses a JSON design file and decodes it into `document`.
pub fn decode_str(
    document: &mut Document,
    text: &str,
    options: &DecodeOptions,
    observer: &mut dyn DesignObserver,
) -> Result<()> {
    let file = DesignFile::from_json(text)?;
    decode(document, &file, options, observer)
}

/// Decodes every part of `file` into `document`, then restores modification
/// attachments and the default view mode.
///
/// Parts are decoded one at a time and attached only once complete, so a
/// failure leaves earlier parts in place and no trace of the failing one.
pub fn decode(
    document: &mut Document,
    file: &DesignFile,
    options: &DecodeOptions,
    observer: &mut dyn DesignObserver,
) -> Result<()> {
    let grid_type = file.meta.grid_type.unwrap_or_default();
    let infer_view = file.meta.ortho_view_type == RecordedView::Missing;
    let mut ortho_view_type = file.meta.ortho_view_type.view();

    for part_record in &file.parts {
        decode_part(document, part_record, grid_type, options, observer)?;

        if infer_view && ortho_view_type.is_none() {
            ortho_view_type = Some(determine_ortho_view_type(part_record, grid_type));
        }
    }

    restore_modifications(document, &file.modifications, options, observer);

    if let Some(view) = ortho_view_type {
        document.set_ortho_view_type(view);
        observer.ortho_view_type_changed(view);
    }
    Ok(())
}

/// Builds one part from its record and attaches it to `document`.
///
/// Crossover endpoints and oligo 5' strands must resolve; if they do not the
/// file is corrupt and the part is abandoned. Insertions and skips that land
/// on no strand are only reported.
pub fn decode_part(
    document: &mut Document,
    record: &PartRecord,
    grid_type: GridType,
    options: &DecodeOptions,
    observer: &mut dyn DesignObserver,
) -> Result<PartId> {
    let part_id = document.parts().len();
    let uuid = record.uuid.clone().unwrap_or_else(|| part_id.to_string());
    let mut part = Part::new(uuid, grid_type);
    let mut events = EventQueue::new(options.emit_signals);
    events.structural(DesignEvent::PartAdded(part_id));

    if record.point_type == PointType::Arbitrary {
        warn!(
            "Part {}: arbitrary point placement is not supported, no helices placed",
            part_id
        );
    } else {
        for &(id_num, size) in &record.vh_list {
            let &origin = record
                .origins
                .get(id_num)
                .ok_or(DesignError::MissingOrigin(id_num))?;
            let mut placement =
                HelixPlacement::from_columns(id_num, origin, size, &record.helix_columns(id_num));
            // Stored offsets are discarded; every helix restarts at half a twist.
            placement.euler_z = DEFAULT_EULER_Z;
            if !part.create_virtual_helix(placement, false) {
                return Err(DesignError::DuplicateHelix(id_num));
            }
            events.structural(DesignEvent::VirtualHelixAdded(part_id, id_num));
        }
        if let Some((min_id, max_id)) = part.z_bounds_ids() {
            events.structural(DesignEvent::PartZDimensionsChanged(part_id, min_id, max_id));
        }
    }

    for (i, &(id_num, _size)) in record.vh_list.iter().enumerate() {
        let Some(strands) = record.strands.helix_strands(i) else {
            continue;
        };
        let Ok((fwd_strand_set, rev_strand_set)) = part.strand_sets_mut(id_num) else {
            warn!(
                "Part {}: strands listed for virtual helix {} which was not placed",
                part_id, id_num
            );
            continue;
        };
        for (low_idx, high_idx, color) in &strands.fwd {
            fwd_strand_set.create_deserialized_strand(*low_idx, *high_idx, color);
        }
        for (low_idx, high_idx, color) in &strands.rev {
            rev_strand_set.create_deserialized_strand(*low_idx, *high_idx, color);
        }
        part.refresh_segments(id_num);
    }

    for &(from_id, from_dir, from_idx, to_id, to_dir, to_idx) in &record.xovers {
        let from_strand = part.require_strand(from_dir, from_id, from_idx)?;
        let to_strand = part.require_strand(to_dir, to_id, to_idx)?;
        part.create_xover(from_strand, from_idx, to_strand, to_idx)?;
    }

    for oligo_id in part.refresh_oligos() {
        events.structural(DesignEvent::OligoAdded(part_id, oligo_id));
    }

    for oligo in &record.oligos {
        let strand_5p = part.require_strand(oligo.is_5p_fwd, oligo.id_num, oligo.idx5p)?;
        let oligo_id = part.oligo_of(strand_5p).ok_or(DesignError::StrandNotFound {
            id_num: oligo.id_num,
            direction: oligo.is_5p_fwd,
            idx: oligo.idx5p,
        })?;
        // Colours assigned by the refresh win over the recorded ones.
        if let Some(sequence) = &oligo.sequence {
            if let Some(target) = part.oligo_mut(oligo_id) {
                target.apply_sequence(sequence);
            }
        }
    }

    for &(id_num, idx, length) in &record.insertions {
        attach_insertion(&mut part, id_num, idx, length);
    }
    part.refresh_oligo_lengths();
    for oligo in part.oligos() {
        if !oligo.sequence_matches_length() {
            debug!(
                "Part {}: oligo {} has {} bases but a sequence of length {}",
                part_id,
                oligo.id,
                oligo.length,
                oligo.sequence.as_ref().map_or(0, String::len)
            );
        }
    }

    if let Some(order) = record.virtual_helix_order.as_deref() {
        if !order.is_empty() {
            part.set_imported_vhelix_order(order);
        }
    }

    let changed = restore_part_properties(&mut part, &record.properties, part_id);

    let attached = document.add_part(part);
    debug_assert_eq!(attached, part_id);
    for (key, value) in changed {
        events.always(DesignEvent::PartPropertyChanged(part_id, key.to_string(), value));
    }
    events.flush(observer);

    info!("Decoded part {} ({} virtual helices)", part_id, record.vh_list.len());
    Ok(part_id)
}

/// Attaches an insertion (`length > 0`) or skip to the forward strand covering
/// `idx`, falling back to the reverse strand. Returns `false`, after logging,
/// when neither exists.
pub fn attach_insertion(part: &mut Part, id_num: usize, idx: i64, length: i64) -> bool {
    let target = part
        .get_strand(Direction::Forward, id_num, idx)
        .or_else(|| part.get_strand(Direction::Reverse, id_num, idx));

    match target {
        Some(strand) => match part.add_insertion(strand, idx, length) {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not attach insertion at {}[{}]: {}", id_num, idx, e);
                false
            }
        },
        None => {
            let kind = if length > 0 { "Insertion" } else { "Skip" };
            warn!("Cannot find strand for {} at {}[{}]", kind, id_num, idx);
            false
        }
    }
}

fn restore_part_properties(
    part: &mut Part,
    properties: &BTreeMap<String, serde_json::Value>,
    part_id: PartId,
) -> Vec<(&'static str, PropertyValue)> {
    let mut changed = Vec::with_capacity(PART_PROPERTY_KEYS.len());
    for key in PART_PROPERTY_KEYS {
        let Some(raw) = properties.get(key) else {
            warn!("Part {}: property '{}' missing from file", part_id, key);
            continue;
        };
        let value = match PropertyValue::from_json(key, raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Part {}: {}", part_id, e);
                continue;
            }
        };
        if let Err(e) = part.set_property(key, value.clone()) {
            warn!("Part {}: {}", part_id, e);
            continue;
        }
        changed.push((key, value));
    }
    changed
}

fn restore_modifications(
    document: &mut Document,
    modifications: &BTreeMap<String, ModificationRecord>,
    options: &DecodeOptions,
    observer: &mut dyn DesignObserver,
) {
    for (mod_id, item) in modifications {
        document.create_mod(item.props.clone(), mod_id);
        if options.emit_signals {
            observer.modification_created(mod_id);
        }
        for key in &item.ext_locations {
            let attached = document
                .mod_strand_idx(key)
                .and_then(|(part_id, strand, idx)| {
                    document.add_mod_strand_instance(part_id, strand, idx, mod_id, key)
                });
            match attached {
                Ok(()) => debug!("Attached modification {} at {}", mod_id, key),
                Err(e) => warn!("Modification {}: skipping location '{}': {}", mod_id, key, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StrandRef;
    use crate::observer::{NullObserver, RecordingObserver};
    use crate::record::Keyed;
    use crate::view_mode::OrthoViewType;

    // 42 bases plus the insertions at 5 (3) and 12 (1).
    const SEQUENCE_A: &str = "ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTACGTAC";

    fn design_json() -> String {
        format!(
            r##"{{
            "name": "test design",
            "meta": {{"grid_type": 2}},
            "parts": [{{
                "uuid": "p0",
                "point_type": 0,
                "vh_list": [[0, 42], [1, 42]],
                "origins": [[0.0, 0.0], [1.948557158514987, 1.125]],
                "virtual_helices": {{
                    "name": ["vh0", "vh1"],
                    "z": [0.0, 0.0],
                    "eulerZ": [10.0, 10.0],
                    "bases_per_turn": [10.5, 10.5],
                    "neighbors": ["[1]", "[0]"]
                }},
                "strands": {{
                    "indices": [
                        [[[0, 20]], [[10, 15]]],
                        [[[25, 30]], [[0, 20]]]
                    ],
                    "properties": [
                        [["#cc0000"], ["#00cc00"]],
                        [["#0000cc"], ["#cc0000"]]
                    ]
                }},
                "xovers": [[0, true, 20, 1, false, 20]],
                "oligos": [
                    {{"id_num": 0, "idx5p": 0, "is_5p_fwd": true, "color": "#ff00ff", "sequence": "{}"}},
                    {{"id_num": 0, "idx5p": 15, "is_5p_fwd": false, "color": "#00cc00", "sequence": "GGGGGG"}},
                    {{"id_num": 1, "idx5p": 25, "is_5p_fwd": true, "color": "#0000cc", "sequence": null}}
                ],
                "insertions": [[0, 5, 3], [0, 12, 1], [1, 27, -1], [1, 35, 2]],
                "virtual_helix_order": [1, 0],
                "name": "part0",
                "color": "#0066cc",
                "crossover_span_angle": 30,
                "max_vhelix_length": 42
            }}],
            "modifications": {{
                "mod1": {{
                    "props": {{"name": "biotin"}},
                    "ext_locations": ["p0,0,1,3", "p0,1,1,40"]
                }}
            }}
        }}"##,
            SEQUENCE_A
        )
    }

    fn decoded(options: DecodeOptions) -> (Document, RecordingObserver) {
        let mut doc = Document::new();
        let mut observer = RecordingObserver::default();
        decode_str(&mut doc, &design_json(), &options, &mut observer).unwrap();
        (doc, observer)
    }

    #[test]
    fn test_decode_helices() {
        let (doc, _) = decoded(DecodeOptions::default());
        assert_eq!(doc.parts().len(), 1);
        let part = doc.part(0).unwrap();

        assert_eq!(part.helix_count(), 2);
        let vh1 = part.virtual_helix(1).unwrap();
        assert_eq!(vh1.name, "vh1");
        assert_eq!(vh1.size, 42);
        assert_eq!(vh1.euler_z, DEFAULT_EULER_Z);
        assert_eq!(
            vh1.extra.get("bases_per_turn"),
            Some(&PropertyValue::Float(10.5))
        );
        assert_eq!(
            vh1.extra.get("neighbors"),
            Some(&PropertyValue::Text("[0]".to_string()))
        );
        assert_eq!(part.vhelix_order(), vec![1, 0]);
        assert_eq!(part.properties.name, "part0");
        assert_eq!(part.properties.crossover_span_angle, 30.0);
        assert_eq!(part.segments(0), &[(0, 20)]);
        assert_eq!(doc.ortho_view_type(), Some(OrthoViewType::Slice));
    }

    #[test]
    fn test_decode_topology() {
        let (doc, _) = decoded(DecodeOptions::default());
        let part = doc.part(0).unwrap();

        for vh in part.virtual_helices() {
            let (fwd, rev) = vh.strand_sets();
            assert!(fwd.is_non_overlapping());
            assert!(rev.is_non_overlapping());
        }

        let xovers = part.xovers();
        assert_eq!(xovers.len(), 1);
        for xover in &xovers {
            assert!(part.strand(xover.from).is_some());
            assert!(part.strand(xover.to).is_some());
        }

        assert_eq!(part.oligos().len(), 3);
        let strand_5p = part.require_strand(Direction::Forward, 0, 0).unwrap();
        let oligo = part.oligo(part.oligo_of(strand_5p).unwrap()).unwrap();
        assert_eq!(oligo.sequence.as_deref(), Some(SEQUENCE_A));
        assert_eq!(oligo.color, "#cc0000");
        assert_eq!(oligo.strand_count, 2);
        assert_eq!(oligo.length, 46);
        assert!(oligo.sequence_matches_length());

        let rev_5p = part.require_strand(Direction::Reverse, 0, 15).unwrap();
        let rev_oligo = part.oligo(part.oligo_of(rev_5p).unwrap()).unwrap();
        assert_eq!(rev_oligo.sequence.as_deref(), Some("GGGGGG"));

        let short = part.require_strand(Direction::Forward, 1, 25).unwrap();
        let short_oligo = part.oligo(part.oligo_of(short).unwrap()).unwrap();
        assert_eq!(short_oligo.sequence, None);
        assert_eq!(short_oligo.length, 5);
    }

    #[test]
    fn test_decode_insertions() {
        let (doc, _) = decoded(DecodeOptions::default());
        let part = doc.part(0).unwrap();

        let insertions = part.insertions();
        assert_eq!(insertions[&0].get(&5), Some(&3));
        assert_eq!(insertions[&0].get(&12), Some(&1));
        assert_eq!(insertions[&1].get(&27), Some(&-1));
        assert!(!insertions[&1].contains_key(&35));

        // Index 12 is covered in both directions; only the forward strand
        // carries the insertion.
        let rev = part.require_strand(Direction::Reverse, 0, 12).unwrap();
        assert!(part.strand(rev).unwrap().insertions.is_empty());
        let fwd = part.require_strand(Direction::Forward, 0, 12).unwrap();
        assert_eq!(part.strand(fwd).unwrap().insertions.len(), 2);
    }

    #[test]
    fn test_decode_modifications() {
        let (doc, _) = decoded(DecodeOptions::default());
        let modification = doc.modification("mod1").unwrap();
        assert_eq!(modification.ext_locations.len(), 1);
        assert!(modification.ext_locations.contains("p0,0,1,3"));

        let part = doc.part(0).unwrap();
        let (location, mod_id) = part.mod_instances().iter().next().unwrap();
        assert_eq!(mod_id, "mod1");
        assert_eq!((location.id_num, location.idx), (0, 3));
    }

    #[test]
    fn test_decode_is_repeatable() {
        let (first, _) = decoded(DecodeOptions::default());
        let (second, _) = decoded(DecodeOptions::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_notifications() {
        let (_, quiet) = decoded(DecodeOptions::default());
        assert_eq!(quiet.events.len(), 5);
        assert_eq!(
            quiet.events[0],
            DesignEvent::PartPropertyChanged(
                0,
                "name".to_string(),
                PropertyValue::Text("part0".to_string())
            )
        );
        assert_eq!(
            quiet.events[4],
            DesignEvent::OrthoViewTypeChanged(OrthoViewType::Slice)
        );

        let (_, loud) = decoded(DecodeOptions { emit_signals: true });
        assert_eq!(loud.events[0], DesignEvent::PartAdded(0));
        assert_eq!(loud.events[1], DesignEvent::VirtualHelixAdded(0, 0));
        assert_eq!(loud.events[2], DesignEvent::VirtualHelixAdded(0, 1));
        assert_eq!(loud.events[3], DesignEvent::PartZDimensionsChanged(0, 0, 1));
        let oligo_events = loud
            .events
            .iter()
            .filter(|e| matches!(e, DesignEvent::OligoAdded(..)))
            .count();
        assert_eq!(oligo_events, 3);
        assert!(loud
            .events
            .contains(&DesignEvent::ModificationCreated("mod1".to_string())));
    }

    #[test]
    fn test_bad_xover_keeps_earlier_parts() {
        let mut file = DesignFile::from_json(&design_json()).unwrap();
        let mut broken = file.parts[0].clone();
        broken.uuid = Some("p1".to_string());
        broken.xovers.push((0, Direction::Forward, 35, 1, Direction::Reverse, 20));
        file.parts.push(broken);

        let mut doc = Document::new();
        let result = decode(&mut doc, &file, &DecodeOptions::default(), &mut NullObserver);
        assert!(matches!(
            result,
            Err(DesignError::StrandNotFound {
                id_num: 0,
                idx: 35,
                ..
            })
        ));
        assert_eq!(doc.parts().len(), 1);
        assert_eq!(doc.part(0).unwrap().xovers().len(), 1);
    }

    #[test]
    fn test_unresolved_oligo_is_fatal() {
        let mut file = DesignFile::from_json(&design_json()).unwrap();
        file.parts[0].oligos[0].idx5p = 40;
        let mut doc = Document::new();
        let result = decode(&mut doc, &file, &DecodeOptions::default(), &mut NullObserver);
        assert!(result.is_err());
        assert!(doc.parts().is_empty());
    }

    #[test]
    fn test_missing_insertion_strand_is_reported() {
        let mut part = Part::new("p".to_string(), GridType::Honeycomb);
        part.create_virtual_helix(HelixPlacement::from_columns(2, (0.0, 0.0), 42, &[]), false);
        part.strand_sets_mut(2)
            .unwrap()
            .0
            .create_deserialized_strand(0, 5, "#cc0000");

        assert!(!attach_insertion(&mut part, 2, 7, 3));
        assert!(attach_insertion(&mut part, 2, 4, 3));
        assert!(!attach_insertion(&mut part, 9, 4, 3));
        assert_eq!(part.insertions()[&2].len(), 1);
    }

    #[test]
    fn test_shifted_helix_infers_grid() {
        let mut file = DesignFile::from_json(&design_json()).unwrap();
        file.parts[0].origins = Keyed::Seq(vec![(0.001, 0.0), (1.948557158514987, 1.125)]);
        let mut doc = Document::new();
        decode(&mut doc, &file, &DecodeOptions::default(), &mut NullObserver).unwrap();
        assert_eq!(doc.ortho_view_type(), Some(OrthoViewType::Grid));
    }

    #[test]
    fn test_view_recorded_as_none_is_left_unset() {
        let text = design_json().replace(
            r#""meta": {"grid_type": 2}"#,
            r#""meta": {"grid_type": 2, "ortho_view_type": "None"}"#,
        );
        let mut file = DesignFile::from_json(&text).unwrap();
        assert_eq!(file.meta.ortho_view_type, RecordedView::Unset);
        file.parts[0].origins = Keyed::Seq(vec![(0.001, 0.0), (1.948557158514987, 1.125)]);

        let mut doc = Document::new();
        let mut observer = RecordingObserver::default();
        decode(&mut doc, &file, &DecodeOptions::default(), &mut observer).unwrap();
        assert_eq!(doc.ortho_view_type(), None);
        assert!(!observer
            .events
            .iter()
            .any(|e| matches!(e, DesignEvent::OrthoViewTypeChanged(_))));
    }

    #[test]
    fn test_explicit_view_type_wins() {
        let mut file = DesignFile::from_json(&design_json()).unwrap();
        file.meta.ortho_view_type = RecordedView::Set(OrthoViewType::Grid);
        let mut doc = Document::new();
        decode(&mut doc, &file, &DecodeOptions::default(), &mut NullObserver).unwrap();
        assert_eq!(doc.ortho_view_type(), Some(OrthoViewType::Grid));
    }

    #[test]
    fn test_arbitrary_point_type_skips_placement() {
        let mut file = DesignFile::from_json(&design_json()).unwrap();
        file.parts[0].point_type = PointType::Arbitrary;
        file.parts[0].xovers.clear();
        file.parts[0].oligos.clear();

        let mut doc = Document::new();
        decode(&mut doc, &file, &DecodeOptions::default(), &mut NullObserver).unwrap();
        let part = doc.part(0).unwrap();
        assert_eq!(part.helix_count(), 0);
        assert_eq!(part.strand_count(), 0);
        assert_eq!(part.properties.name, "part0");
    }

    #[test]
    fn test_duplicate_helix_is_fatal() {
        let mut file = DesignFile::from_json(&design_json()).unwrap();
        file.parts[0].vh_list.push((1, 42));
        let mut doc = Document::new();
        let result = decode(&mut doc, &file, &DecodeOptions::default(), &mut NullObserver);
        assert!(matches!(result, Err(DesignError::DuplicateHelix(1))));
    }

    #[test]
    fn test_strand_ref_is_stable() {
        let (doc, _) = decoded(DecodeOptions::default());
        let part = doc.part(0).unwrap();
        assert_eq!(
            part.get_strand(Direction::Reverse, 1, 7),
            Some(StrandRef {
                id_num: 1,
                direction: Direction::Reverse,
                low_idx: 0
            })
        );
    }
}
