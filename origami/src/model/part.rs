use ahash::{AHashMap, AHashSet};
use log::{debug, warn};
use std::collections::BTreeMap;

use crate::error::{DesignError, Result};
use crate::lattice::{GridType, DEFAULT_RADIUS};
use crate::model::oligo::{Oligo, OligoId};
use crate::model::property::PropertyValue;
use crate::model::strand::{Strand, StrandRef, StrandSet};
use crate::model::virtual_helix::{HelixPlacement, VirtualHelix};
use crate::Direction;

/// Part-level scalar properties. Known keys get typed fields, anything else a
/// file carries is kept in `extra`.
#[derive(Debug, Clone, PartialEq)]
pub struct PartProperties {
    pub name: String,
    pub color: String,
    pub crossover_span_angle: f64,
    pub max_vhelix_length: i64,
    pub extra: BTreeMap<String, PropertyValue>,
}

impl Default for PartProperties {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: "#0066cc".to_string(),
            crossover_span_angle: 45.0,
            max_vhelix_length: 42,
            extra: BTreeMap::new(),
        }
    }
}

/// A crossover as stored on the strand graph: the 3' end of `from` joined to
/// the 5' end of `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossover {
    pub from: StrandRef,
    pub from_idx: i64,
    pub to: StrandRef,
    pub to_idx: i64,
}

/// Where a modification is attached: a base on a strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModLocation {
    pub id_num: usize,
    pub direction: Direction,
    pub idx: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub uuid: String,
    pub grid_type: GridType,
    pub radius: f64,
    pub properties: PartProperties,
    helices: BTreeMap<usize, VirtualHelix>,
    oligos: Vec<Oligo>,
    imported_vh_order: Option<Vec<usize>>,
    segments: BTreeMap<usize, Vec<(i64, i64)>>,
    mod_instances: BTreeMap<ModLocation, String>,
}

impl Part {
    pub fn new(uuid: String, grid_type: GridType) -> Self {
        Self {
            uuid,
            grid_type,
            radius: DEFAULT_RADIUS,
            properties: PartProperties::default(),
            helices: BTreeMap::new(),
            oligos: Vec::new(),
            imported_vh_order: None,
            segments: BTreeMap::new(),
            mod_instances: BTreeMap::new(),
        }
    }

    /// Adds a virtual helix. Returns `false` when the id is already taken or,
    /// in `safe` mode, when the position lands inside an existing helix.
    pub fn create_virtual_helix(&mut self, placement: HelixPlacement, safe: bool) -> bool {
        if self.helices.contains_key(&placement.id_num) {
            warn!("Virtual helix id {} already in use", placement.id_num);
            return false;
        }
        if safe {
            if let Some(existing) = self
                .helices
                .values()
                .find(|vh| vh.distance_to(placement.x, placement.y) < self.radius)
            {
                debug!(
                    "Virtual helix {} at ({:.3}, {:.3}) collides with {}",
                    placement.id_num, placement.x, placement.y, existing.id_num
                );
                return false;
            }
        }
        let id_num = placement.id_num;
        self.helices.insert(id_num, VirtualHelix::new(placement));
        true
    }

    pub fn max_id_num(&self) -> Option<usize> {
        self.helices.keys().next_back().copied()
    }

    pub fn helix_count(&self) -> usize {
        self.helices.len()
    }

    pub fn virtual_helix(&self, id_num: usize) -> Option<&VirtualHelix> {
        self.helices.get(&id_num)
    }

    pub fn virtual_helices(&self) -> impl Iterator<Item = &VirtualHelix> {
        self.helices.values()
    }

    pub fn strand_sets(&self, id_num: usize) -> Result<(&StrandSet, &StrandSet)> {
        self.helices
            .get(&id_num)
            .map(|vh| vh.strand_sets())
            .ok_or(DesignError::HelixNotFound(id_num))
    }

    pub fn strand_sets_mut(&mut self, id_num: usize) -> Result<(&mut StrandSet, &mut StrandSet)> {
        self.helices
            .get_mut(&id_num)
            .map(|vh| vh.strand_sets_mut())
            .ok_or(DesignError::HelixNotFound(id_num))
    }

    /// Finds the strand covering `idx` on the given helix and direction.
    pub fn get_strand(&self, direction: Direction, id_num: usize, idx: i64) -> Option<StrandRef> {
        let strand_set = self.helices.get(&id_num)?.strand_set(direction);
        strand_set
            .strand_covering(idx)
            .map(|strand| strand_set.strand_ref(strand))
    }

    /// Like [`Part::get_strand`], but a miss is an error.
    pub fn require_strand(&self, direction: Direction, id_num: usize, idx: i64) -> Result<StrandRef> {
        self.get_strand(direction, id_num, idx)
            .ok_or(DesignError::StrandNotFound {
                id_num,
                direction,
                idx,
            })
    }

    pub fn strand(&self, strand_ref: StrandRef) -> Option<&Strand> {
        self.helices
            .get(&strand_ref.id_num)?
            .strand_set(strand_ref.direction)
            .get(strand_ref.low_idx)
    }

    fn strand_mut(&mut self, strand_ref: StrandRef) -> Result<&mut Strand> {
        self.helices
            .get_mut(&strand_ref.id_num)
            .ok_or(DesignError::HelixNotFound(strand_ref.id_num))?
            .strand_set_mut(strand_ref.direction)
            .get_mut(strand_ref.low_idx)
            .ok_or(DesignError::StrandNotFound {
                id_num: strand_ref.id_num,
                direction: strand_ref.direction,
                idx: strand_ref.low_idx,
            })
    }

    /// Every strand in the part, ordered by helix, then forward before
    /// reverse, then by index.
    pub fn strand_refs(&self) -> Vec<StrandRef> {
        self.helices
            .values()
            .flat_map(|vh| {
                let (fwd, rev) = vh.strand_sets();
                fwd.strands()
                    .map(move |s| fwd.strand_ref(s))
                    .chain(rev.strands().map(move |s| rev.strand_ref(s)))
            })
            .collect()
    }

    pub fn strand_count(&self) -> usize {
        self.helices
            .values()
            .map(|vh| {
                let (fwd, rev) = vh.strand_sets();
                fwd.len() + rev.len()
            })
            .sum()
    }

    /// Joins the 3' end of `from` (at `from_idx`) to the 5' end of `to` (at
    /// `to_idx`). Both indices must be the matching strand ends and both ends
    /// must be free.
    pub fn create_xover(
        &mut self,
        from: StrandRef,
        from_idx: i64,
        to: StrandRef,
        to_idx: i64,
    ) -> Result<()> {
        let from_strand = self.strand_mut(from)?;
        if from_strand.idx_3p() != from_idx {
            return Err(DesignError::NotAnEndpoint {
                id_num: from.id_num,
                direction: from.direction,
                idx: from_idx,
                end: "3'",
            });
        }
        if from_strand.connection_3p.is_some() {
            return Err(DesignError::AlreadyConnected {
                id_num: from.id_num,
                direction: from.direction,
                idx: from_idx,
            });
        }

        let to_strand = self.strand_mut(to)?;
        if to_strand.idx_5p() != to_idx {
            return Err(DesignError::NotAnEndpoint {
                id_num: to.id_num,
                direction: to.direction,
                idx: to_idx,
                end: "5'",
            });
        }
        if to_strand.connection_5p.is_some() {
            return Err(DesignError::AlreadyConnected {
                id_num: to.id_num,
                direction: to.direction,
                idx: to_idx,
            });
        }
        to_strand.connection_5p = Some(from);

        self.strand_mut(from)?.connection_3p = Some(to);
        Ok(())
    }

    pub fn xovers(&self) -> Vec<Crossover> {
        self.strand_refs()
            .into_iter()
            .filter_map(|from| {
                let strand = self.strand(from)?;
                let to = strand.connection_3p?;
                let to_idx = self.strand(to)?.idx_5p();
                Some(Crossover {
                    from,
                    from_idx: strand.idx_3p(),
                    to,
                    to_idx,
                })
            })
            .collect()
    }

    /// Rebuilds every oligo from the strand connection graph.
    ///
    /// Strands without a 5' connection start linear oligos; whatever is left
    /// afterwards sits on a cycle and becomes a circular oligo. An oligo whose
    /// 5' strand already headed an oligo keeps that oligo's id, colour and
    /// sequence. New oligos take the colour of their 5' strand, start with no
    /// sequence and are numbered after the kept ones.
    pub fn refresh_oligos(&mut self) -> Vec<OligoId> {
        let previous = std::mem::take(&mut self.oligos);
        let all = self.strand_refs();
        let mut visited: AHashSet<StrandRef> = AHashSet::with_capacity(all.len());

        let starts: Vec<StrandRef> = all
            .iter()
            .copied()
            .filter(|r| {
                self.strand(*r)
                    .map(|s| s.connection_5p.is_none())
                    .unwrap_or(false)
            })
            .collect();

        for start in starts {
            self.build_oligo(start, &mut visited, false);
        }
        for strand_ref in all {
            if !visited.contains(&strand_ref) {
                self.build_oligo(strand_ref, &mut visited, true);
            }
        }
        self.adopt_previous_oligos(previous);
        self.oligos.iter().map(|o| o.id).collect()
    }

    /// Renumbers freshly built oligos so that those headed by the same 5'
    /// strand as before come first, in their previous order.
    fn adopt_previous_oligos(&mut self, previous: Vec<Oligo>) {
        if previous.is_empty() {
            return;
        }
        let by_head: AHashMap<StrandRef, Oligo> =
            previous.into_iter().map(|o| (o.strand_5p, o)).collect();

        let mut rebuilt = std::mem::take(&mut self.oligos);
        rebuilt.sort_by_key(|o| {
            let kept = by_head.get(&o.strand_5p).map_or(usize::MAX, |old| old.id);
            (kept, o.id)
        });

        let mut renumber = vec![0; rebuilt.len()];
        for (id, oligo) in rebuilt.iter_mut().enumerate() {
            renumber[oligo.id] = id;
            oligo.id = id;
            if let Some(old) = by_head.get(&oligo.strand_5p) {
                oligo.color = old.color.clone();
                oligo.sequence = old.sequence.clone();
            }
        }
        for vh in self.helices.values_mut() {
            let (fwd, rev) = vh.strand_sets_mut();
            for strand in fwd.strands_mut().chain(rev.strands_mut()) {
                strand.oligo = strand.oligo.and_then(|id| renumber.get(id).copied());
            }
        }
        self.oligos = rebuilt;
    }

    fn build_oligo(&mut self, start: StrandRef, visited: &mut AHashSet<StrandRef>, is_circular: bool) {
        let id = self.oligos.len();
        let color = match self.strand(start) {
            Some(strand) => strand.color.clone(),
            None => return,
        };
        let mut oligo = Oligo::new(id, start, color);
        oligo.is_circular = is_circular;

        let mut current = Some(start);
        while let Some(strand_ref) = current {
            if !visited.insert(strand_ref) {
                break;
            }
            let Ok(strand) = self.strand_mut(strand_ref) else {
                break;
            };
            strand.oligo = Some(id);
            oligo.length += strand.total_length();
            oligo.strand_count += 1;
            current = strand.connection_3p;
        }
        self.oligos.push(oligo);
    }

    /// Recomputes oligo lengths after insertions or skips were added.
    pub fn refresh_oligo_lengths(&mut self) {
        for oligo in self.oligos.iter_mut() {
            oligo.length = 0;
        }
        for vh in self.helices.values() {
            let (fwd, rev) = vh.strand_sets();
            for strand in fwd.strands().chain(rev.strands()) {
                if let Some(oligo) = strand.oligo.and_then(|id| self.oligos.get_mut(id)) {
                    oligo.length += strand.total_length();
                }
            }
        }
    }

    pub fn oligos(&self) -> &[Oligo] {
        &self.oligos
    }

    pub fn oligo(&self, id: OligoId) -> Option<&Oligo> {
        self.oligos.get(id)
    }

    pub fn oligo_mut(&mut self, id: OligoId) -> Option<&mut Oligo> {
        self.oligos.get_mut(id)
    }

    pub fn oligo_of(&self, strand_ref: StrandRef) -> Option<OligoId> {
        self.strand(strand_ref)?.oligo
    }

    pub fn add_insertion(&mut self, strand_ref: StrandRef, idx: i64, length: i64) -> Result<()> {
        self.strand_mut(strand_ref)?.add_insertion(idx, length);
        Ok(())
    }

    /// Insertions and skips grouped by helix, then index.
    pub fn insertions(&self) -> BTreeMap<usize, BTreeMap<i64, i64>> {
        let mut out: BTreeMap<usize, BTreeMap<i64, i64>> = BTreeMap::new();
        for vh in self.helices.values() {
            let (fwd, rev) = vh.strand_sets();
            for strand in fwd.strands().chain(rev.strands()) {
                for (&idx, &length) in &strand.insertions {
                    out.entry(vh.id_num).or_default().insert(idx, length);
                }
            }
        }
        out
    }

    /// Recomputes the merged occupied ranges of one helix across both
    /// directions.
    pub fn refresh_segments(&mut self, id_num: usize) {
        let Some(vh) = self.helices.get(&id_num) else {
            return;
        };
        let (fwd, rev) = vh.strand_sets();
        let mut ranges = fwd.ranges();
        ranges.extend(rev.ranges());
        ranges.sort_unstable();

        let mut merged: Vec<(i64, i64)> = Vec::with_capacity(ranges.len());
        for (low, high) in ranges {
            match merged.last_mut() {
                Some(last) if low <= last.1 + 1 => last.1 = last.1.max(high),
                _ => merged.push((low, high)),
            }
        }
        self.segments.insert(id_num, merged);
    }

    pub fn segments(&self, id_num: usize) -> &[(i64, i64)] {
        self.segments.get(&id_num).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stores the display order read from a file. Ids that do not resolve
    /// are dropped.
    pub fn set_imported_vhelix_order(&mut self, order: &[usize]) {
        let known: Vec<usize> = order
            .iter()
            .copied()
            .filter(|id| {
                let found = self.helices.contains_key(id);
                if !found {
                    warn!("Ignoring unknown virtual helix {} in display order", id);
                }
                found
            })
            .collect();
        self.imported_vh_order = Some(known);
    }

    /// The display order: the imported one if any, else ascending id.
    pub fn vhelix_order(&self) -> Vec<usize> {
        match &self.imported_vh_order {
            Some(order) => order.clone(),
            None => self.helices.keys().copied().collect(),
        }
    }

    pub fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        let invalid = |reason: &str| DesignError::InvalidProperty {
            key: key.to_string(),
            reason: reason.to_string(),
        };
        match key {
            "name" => {
                self.properties.name = match value {
                    PropertyValue::Text(s) => s,
                    other => other.to_string(),
                }
            }
            "color" => {
                self.properties.color = value
                    .as_str()
                    .ok_or_else(|| invalid("expected a color string"))?
                    .to_string()
            }
            "crossover_span_angle" => {
                self.properties.crossover_span_angle =
                    value.as_f64().ok_or_else(|| invalid("expected a number"))?
            }
            "max_vhelix_length" => {
                self.properties.max_vhelix_length =
                    value.as_i64().ok_or_else(|| invalid("expected an integer"))?
            }
            _ => {
                self.properties.extra.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    /// Ids of the helices with the lowest and highest z offset.
    pub fn z_bounds_ids(&self) -> Option<(usize, usize)> {
        let min = self
            .helices
            .values()
            .min_by(|a, b| a.z.total_cmp(&b.z))?;
        let max = self
            .helices
            .values()
            .max_by(|a, b| a.z.total_cmp(&b.z))?;
        Some((min.id_num, max.id_num))
    }

    pub fn add_mod_strand_instance(&mut self, strand_ref: StrandRef, idx: i64, mod_id: &str) {
        let location = ModLocation {
            id_num: strand_ref.id_num,
            direction: strand_ref.direction,
            idx,
        };
        self.mod_instances.insert(location, mod_id.to_string());
    }

    pub fn mod_instances(&self) -> &BTreeMap<ModLocation, String> {
        &self.mod_instances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(id_num: usize, x: f64, y: f64) -> HelixPlacement {
        HelixPlacement::from_columns(id_num, (x, y), 42, &[])
    }

    fn two_helix_part() -> Part {
        let mut part = Part::new("p0".to_string(), GridType::Honeycomb);
        assert!(part.create_virtual_helix(placement(0, 0.0, 0.0), false));
        assert!(part.create_virtual_helix(placement(1, 1.948557, 1.125), false));
        part
    }

    #[test]
    fn test_create_virtual_helix_rejects() {
        let mut part = two_helix_part();
        assert!(!part.create_virtual_helix(placement(1, 10.0, 10.0), false));
        assert!(!part.create_virtual_helix(placement(2, 0.5, 0.0), true));
        assert!(part.create_virtual_helix(placement(2, 0.5, 0.0), false));
        assert_eq!(part.max_id_num(), Some(2));
    }

    #[test]
    fn test_xover_and_oligo_refresh() -> Result<()> {
        let mut part = two_helix_part();
        {
            let (fwd, _) = part.strand_sets_mut(0)?;
            fwd.create_deserialized_strand(0, 9, "#cc0000");
        }
        {
            let (_, rev) = part.strand_sets_mut(1)?;
            rev.create_deserialized_strand(0, 9, "#00cc00");
        }
        let from = part.require_strand(Direction::Forward, 0, 9)?;
        let to = part.require_strand(Direction::Reverse, 1, 9)?;
        part.create_xover(from, 9, to, 9)?;

        let oligos = part.refresh_oligos();
        assert_eq!(oligos.len(), 1);
        let oligo = part.oligo(0).unwrap();
        assert_eq!(oligo.strand_5p, from);
        assert_eq!(oligo.length, 20);
        assert_eq!(oligo.color, "#cc0000");
        assert!(!oligo.is_circular);
        assert_eq!(part.oligo_of(to), Some(0));
        assert_eq!(part.xovers().len(), 1);
        Ok(())
    }

    #[test]
    fn test_xover_must_use_strand_ends() -> Result<()> {
        let mut part = two_helix_part();
        part.strand_sets_mut(0)?.0.create_deserialized_strand(0, 9, "#cc0000");
        part.strand_sets_mut(1)?.1.create_deserialized_strand(0, 9, "#cc0000");
        let from = part.require_strand(Direction::Forward, 0, 5)?;
        let to = part.require_strand(Direction::Reverse, 1, 9)?;

        let result = part.create_xover(from, 5, to, 9);
        assert!(matches!(result, Err(DesignError::NotAnEndpoint { .. })));
        assert!(part.xovers().is_empty());
        Ok(())
    }

    #[test]
    fn test_circular_oligo() -> Result<()> {
        let mut part = two_helix_part();
        part.strand_sets_mut(0)?.0.create_deserialized_strand(0, 9, "#cc0000");
        part.strand_sets_mut(1)?.1.create_deserialized_strand(0, 9, "#cc0000");
        let a = part.require_strand(Direction::Forward, 0, 0)?;
        let b = part.require_strand(Direction::Reverse, 1, 0)?;
        part.create_xover(a, 9, b, 9)?;
        part.create_xover(b, 0, a, 0)?;

        part.refresh_oligos();
        assert_eq!(part.oligos().len(), 1);
        assert!(part.oligos()[0].is_circular);
        assert_eq!(part.oligos()[0].strand_count, 2);
        Ok(())
    }

    #[test]
    fn test_refresh_keeps_oligo_ids_and_sequences() -> Result<()> {
        let mut part = two_helix_part();
        part.strand_sets_mut(0)?.0.create_deserialized_strand(0, 9, "#cc0000");
        part.strand_sets_mut(1)?.1.create_deserialized_strand(0, 9, "#cc0000");
        let a = part.require_strand(Direction::Forward, 0, 0)?;
        let b = part.require_strand(Direction::Reverse, 1, 0)?;
        part.create_xover(a, 9, b, 9)?;
        part.create_xover(b, 0, a, 0)?;
        part.refresh_oligos();
        part.oligo_mut(0).unwrap().apply_sequence("ACGT");

        // A linear oligo would normally be numbered before the circular one.
        assert!(part.create_virtual_helix(placement(2, 3.897114, 0.0), true));
        part.strand_sets_mut(2)?.0.create_deserialized_strand(0, 4, "#00cc00");
        let ids = part.refresh_oligos();

        assert_eq!(ids, vec![0, 1]);
        assert!(part.oligos()[0].is_circular);
        assert_eq!(part.oligos()[0].sequence.as_deref(), Some("ACGT"));
        assert_eq!(part.oligo_of(a), Some(0));
        assert_eq!(part.oligo_of(b), Some(0));

        let c = part.require_strand(Direction::Forward, 2, 0)?;
        assert_eq!(part.oligo_of(c), Some(1));
        assert_eq!(part.oligos()[1].sequence, None);
        assert_eq!(part.oligos()[1].color, "#00cc00");
        Ok(())
    }

    #[test]
    fn test_segments_merge_both_directions() -> Result<()> {
        let mut part = two_helix_part();
        {
            let (fwd, rev) = part.strand_sets_mut(0)?;
            fwd.create_deserialized_strand(0, 9, "#cc0000");
            rev.create_deserialized_strand(5, 14, "#cc0000");
            fwd.create_deserialized_strand(20, 25, "#cc0000");
        }
        part.refresh_segments(0);
        assert_eq!(part.segments(0), &[(0, 14), (20, 25)]);
        assert!(part.segments(1).is_empty());
        Ok(())
    }

    #[test]
    fn test_set_property_validates_known_keys() {
        let mut part = two_helix_part();
        part.set_property("crossover_span_angle", PropertyValue::Int(30))
            .unwrap();
        assert_eq!(part.properties.crossover_span_angle, 30.0);
        assert!(part
            .set_property("color", PropertyValue::Int(3))
            .is_err());
        part.set_property("is_visible", PropertyValue::Bool(true))
            .unwrap();
        assert_eq!(
            part.properties.extra.get("is_visible"),
            Some(&PropertyValue::Bool(true))
        );
    }
}
