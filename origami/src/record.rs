//! Serialized shape of a design file, as produced by the v3 JSON encoder.
//!
//! These records mirror the file closely and carry no invariants of their
//! own; the decoder is what turns them into a consistent [`crate::Part`].

use log::warn;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Read;

use crate::error::Result;
use crate::lattice::GridType;
use crate::view_mode::{deserialize_ortho_view_type, RecordedView};
use crate::Direction;

/// Colour given to strands whose colour entry is missing from the file.
pub const DEFAULT_STRAND_COLOR: &str = "#0066cc";

#[derive(Debug, Clone, Deserialize)]
pub struct DesignFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub meta: FileMeta,
    #[serde(default)]
    pub parts: Vec<PartRecord>,
    #[serde(default)]
    pub modifications: BTreeMap<String, ModificationRecord>,
}

impl DesignFile {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileMeta {
    #[serde(default)]
    pub grid_type: Option<GridType>,
    #[serde(default, deserialize_with = "deserialize_ortho_view_type")]
    pub ortho_view_type: RecordedView,
}

/// How helix origins are laid out in a part record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointType {
    /// Origins, sizes and columns are tables keyed by helix id.
    #[default]
    Primitive,
    /// Free-form point clouds. Not supported by the decoder yet.
    Arbitrary,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawPointType {
    Code(i64),
    Name(String),
}

impl<'de> Deserialize<'de> for PointType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawPointType::deserialize(deserializer)? {
            RawPointType::Code(0) => Ok(PointType::Primitive),
            RawPointType::Code(1) => Ok(PointType::Arbitrary),
            RawPointType::Name(name) if name.eq_ignore_ascii_case("primitive") => {
                Ok(PointType::Primitive)
            }
            RawPointType::Name(name) if name.eq_ignore_ascii_case("arbitrary") => {
                Ok(PointType::Arbitrary)
            }
            _ => Err(de::Error::custom("Unsupported point type")),
        }
    }
}

/// A per-helix table. Encoders write either a plain array indexed by id or an
/// object keyed by the stringified id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Keyed<T> {
    Seq(Vec<T>),
    Map(BTreeMap<String, T>),
}

impl<T> Default for Keyed<T> {
    fn default() -> Self {
        Keyed::Seq(Vec::new())
    }
}

impl<T> Keyed<T> {
    pub fn get(&self, key: usize) -> Option<&T> {
        match self {
            Keyed::Seq(items) => items.get(key),
            Keyed::Map(items) => items.get(&key.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Keyed::Seq(items) => items.len(),
            Keyed::Map(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type IndexRanges = Vec<(i64, i64)>;

/// `(from_id, from_is_fwd, from_idx, to_id, to_is_fwd, to_idx)`
pub type XoverRecord = (usize, Direction, i64, usize, Direction, i64);

/// `(id, idx, length)`
pub type InsertionRecord = (usize, i64, i64);

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrandTable {
    #[serde(default)]
    pub indices: Vec<Option<(IndexRanges, IndexRanges)>>,
    #[serde(default)]
    pub properties: Vec<Option<(Vec<String>, Vec<String>)>>,
}

/// Strand ranges paired with their colours for one helix.
#[derive(Debug, Clone, PartialEq)]
pub struct HelixStrands {
    pub fwd: Vec<(i64, i64, String)>,
    pub rev: Vec<(i64, i64, String)>,
}

impl StrandTable {
    /// Strand data at position `i`, or `None` for helices without strands.
    pub fn helix_strands(&self, i: usize) -> Option<HelixStrands> {
        let (fwd_idxs, rev_idxs) = self.indices.get(i)?.as_ref()?;
        let colors = self.properties.get(i).and_then(|c| c.as_ref());
        if colors.is_none() {
            warn!("Missing strand colors at position {}, using {}", i, DEFAULT_STRAND_COLOR);
        }
        let pair = |idxs: &IndexRanges, colors: Option<&Vec<String>>| {
            idxs.iter()
                .enumerate()
                .map(|(n, &(low, high))| {
                    let color = colors
                        .and_then(|c| c.get(n))
                        .cloned()
                        .unwrap_or_else(|| DEFAULT_STRAND_COLOR.to_string());
                    (low, high, color)
                })
                .collect::<Vec<_>>()
        };
        Some(HelixStrands {
            fwd: pair(fwd_idxs, colors.map(|c| &c.0)),
            rev: pair(rev_idxs, colors.map(|c| &c.1)),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OligoRecord {
    pub id_num: usize,
    pub idx5p: i64,
    pub is_5p_fwd: Direction,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub sequence: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModificationRecord {
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default)]
    pub ext_locations: Vec<String>,
}

/// One serialized part, or a fragment of one handed to the importer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartRecord {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub point_type: PointType,
    #[serde(default)]
    pub vh_list: Vec<(usize, i64)>,
    #[serde(default)]
    pub origins: Keyed<(f64, f64)>,
    #[serde(default)]
    pub virtual_helices: BTreeMap<String, Keyed<Value>>,
    #[serde(default)]
    pub strands: StrandTable,
    #[serde(default)]
    pub xovers: Vec<XoverRecord>,
    #[serde(default)]
    pub oligos: Vec<OligoRecord>,
    #[serde(default)]
    pub insertions: Vec<InsertionRecord>,
    #[serde(default)]
    pub virtual_helix_order: Option<Vec<usize>>,
    /// Part-level scalars (`name`, `color`, ...) and anything else the
    /// encoder wrote.
    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

impl PartRecord {
    /// Every column of the helix property table at `key`, in column order.
    /// Columns with no entry for `key` are left out.
    pub fn helix_columns(&self, key: usize) -> Vec<(String, Value)> {
        self.virtual_helices
            .iter()
            .filter_map(|(column, table)| table.get(key).map(|v| (column.clone(), v.clone())))
            .collect()
    }
}
