use serde::de::{self, Deserialize, Deserializer};
use std::fmt;

use crate::lattice::{distance_from_closest_lattice_coord, GridType, DEFAULT_RADIUS};
use crate::record::PartRecord;

/// How far (in nanometers) a helix may sit from its lattice cell before the
/// design counts as free-form.
pub const LATTICE_SNAP_THRESHOLD: f64 = 0.0005;

/// Default 2D projection a design opens in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrthoViewType {
    /// Lattice-aligned slice view.
    Slice,
    /// Free-form grid view.
    Grid,
}

impl OrthoViewType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(OrthoViewType::Slice),
            1 => Some(OrthoViewType::Grid),
            _ => None,
        }
    }
}

impl fmt::Display for OrthoViewType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OrthoViewType::Slice => write!(f, "slice"),
            OrthoViewType::Grid => write!(f, "grid"),
        }
    }
}

/// What a file says about its default view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordedView {
    /// The field is absent or `null`; the view is inferred from the helices.
    #[default]
    Missing,
    /// The encoder wrote the string `"None"`: no view is set and none is
    /// inferred.
    Unset,
    Set(OrthoViewType),
}

impl RecordedView {
    pub fn view(&self) -> Option<OrthoViewType> {
        match self {
            RecordedView::Set(view) => Some(*view),
            RecordedView::Missing | RecordedView::Unset => None,
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawViewType {
    Code(i64),
    Name(String),
}

/// Reads `meta.ortho_view_type`. `null` counts as missing; encoders that ran
/// without a GUI write the string `"None"`, which is kept apart as
/// [`RecordedView::Unset`].
pub fn deserialize_ortho_view_type<'de, D>(deserializer: D) -> Result<RecordedView, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawViewType>::deserialize(deserializer)? {
        None => Ok(RecordedView::Missing),
        Some(RawViewType::Code(code)) => OrthoViewType::from_code(code)
            .map(RecordedView::Set)
            .ok_or_else(|| de::Error::custom(format!("Unsupported ortho view type: {}", code))),
        Some(RawViewType::Name(name)) => match name.to_ascii_lowercase().as_str() {
            "none" | "" => Ok(RecordedView::Unset),
            "slice" => Ok(RecordedView::Set(OrthoViewType::Slice)),
            "grid" => Ok(RecordedView::Set(OrthoViewType::Grid)),
            _ => Err(de::Error::custom(format!(
                "Unsupported ortho view type: {}",
                name
            ))),
        },
    }
}

/// Classifies a part by how well its helices sit on the lattice.
///
/// Returns `Grid` as soon as one helix is further than
/// [`LATTICE_SNAP_THRESHOLD`] from its nearest cell centre, and `Slice` when
/// all of them snap. Parts without a lattice, and helices without an origin,
/// are not checked.
pub fn determine_ortho_view_type(part: &PartRecord, grid_type: GridType) -> OrthoViewType {
    let Some(kind) = grid_type.lattice() else {
        return OrthoViewType::Slice;
    };
    for &(id_num, _size) in &part.vh_list {
        let Some(&(x, y)) = part.origins.get(id_num) else {
            continue;
        };
        let (distance, _coord) = distance_from_closest_lattice_coord(x, y, DEFAULT_RADIUS, kind);
        if distance > LATTICE_SNAP_THRESHOLD {
            return OrthoViewType::Grid;
        }
    }
    OrthoViewType::Slice
}
