use log::warn;
use std::collections::BTreeMap;

use crate::model::property::PropertyValue;
use crate::model::strand::StrandSet;
use crate::Direction;

/// Angular offset every decoded helix starts from: half a helical twist at
/// 10.5 bases per turn.
pub const DEFAULT_EULER_Z: f64 = 0.5 * (360.0 / 10.5);

/// Everything needed to place a new virtual helix in a part.
#[derive(Debug, Clone, PartialEq)]
pub struct HelixPlacement {
    pub id_num: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub euler_z: f64,
    pub size: i64,
    pub name: String,
    pub extra: BTreeMap<String, PropertyValue>,
}

impl HelixPlacement {
    /// Builds a placement from a full row of the per-helix property table.
    ///
    /// `z`, `eulerZ` and `name` are lifted into fields; every other column is
    /// kept in `extra`. Columns that are not scalars are logged and dropped.
    pub fn from_columns(
        id_num: usize,
        (x, y): (f64, f64),
        size: i64,
        columns: &[(String, serde_json::Value)],
    ) -> Self {
        let mut placement = Self {
            id_num,
            x,
            y,
            z: 0.0,
            euler_z: DEFAULT_EULER_Z,
            size,
            name: format!("vh{}", id_num),
            extra: BTreeMap::new(),
        };

        let mut has_z = false;
        for (key, raw) in columns {
            let value = match PropertyValue::from_json(key, raw) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Virtual helix {}: {}. Column dropped.", id_num, e);
                    continue;
                }
            };
            match key.as_str() {
                "z" => match value.as_f64() {
                    Some(z) => {
                        placement.z = z;
                        has_z = true;
                    }
                    None => warn!("Virtual helix {}: non-numeric z '{}'", id_num, value),
                },
                "eulerZ" => {
                    if let Some(euler_z) = value.as_f64() {
                        placement.euler_z = euler_z;
                    }
                }
                "name" => match value {
                    PropertyValue::Text(name) => placement.name = name,
                    other => placement.name = other.to_string(),
                },
                _ => {
                    placement.extra.insert(key.clone(), value);
                }
            }
        }
        if !has_z {
            warn!("Virtual helix {}: missing z, using 0.0", id_num);
        }
        placement
    }
}

/// One double helix placed in a part, carrying its two strand sets.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualHelix {
    pub id_num: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub euler_z: f64,
    pub size: i64,
    pub name: String,
    pub extra: BTreeMap<String, PropertyValue>,
    fwd_strand_set: StrandSet,
    rev_strand_set: StrandSet,
}

impl VirtualHelix {
    pub fn new(placement: HelixPlacement) -> Self {
        let id_num = placement.id_num;
        Self {
            id_num,
            x: placement.x,
            y: placement.y,
            z: placement.z,
            euler_z: placement.euler_z,
            size: placement.size,
            name: placement.name,
            extra: placement.extra,
            fwd_strand_set: StrandSet::new(id_num, Direction::Forward),
            rev_strand_set: StrandSet::new(id_num, Direction::Reverse),
        }
    }

    pub fn strand_sets(&self) -> (&StrandSet, &StrandSet) {
        (&self.fwd_strand_set, &self.rev_strand_set)
    }

    pub fn strand_sets_mut(&mut self) -> (&mut StrandSet, &mut StrandSet) {
        (&mut self.fwd_strand_set, &mut self.rev_strand_set)
    }

    pub fn strand_set(&self, direction: Direction) -> &StrandSet {
        match direction {
            Direction::Forward => &self.fwd_strand_set,
            Direction::Reverse => &self.rev_strand_set,
        }
    }

    pub fn strand_set_mut(&mut self, direction: Direction) -> &mut StrandSet {
        match direction {
            Direction::Forward => &mut self.fwd_strand_set,
            Direction::Reverse => &mut self.rev_strand_set,
        }
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}
