use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{DesignError, Result};
use crate::model::part::Part;
use crate::model::strand::StrandRef;
use crate::view_mode::OrthoViewType;
use crate::Direction;

pub type PartId = usize;

static LOCATION_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<part>[^,]+),(?P<id>\d+),(?P<fwd>[01]),(?P<idx>-?\d+)$")
        .expect("Expected regex pattern")
});

/// A named bag of properties that can be attached to strand bases anywhere
/// in the document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Modification {
    pub props: Map<String, Value>,
    pub ext_locations: BTreeSet<String>,
}

/// Root of a loaded design.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    parts: Vec<Part>,
    mods: BTreeMap<String, Modification>,
    ortho_view_type: Option<OrthoViewType>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_part(&mut self, part: Part) -> PartId {
        self.parts.push(part);
        self.parts.len() - 1
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id)
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.get_mut(id)
    }

    pub fn part_by_uuid(&self, uuid: &str) -> Option<PartId> {
        self.parts.iter().position(|p| p.uuid == uuid)
    }

    pub fn create_mod(&mut self, props: Map<String, Value>, mod_id: &str) {
        self.mods.insert(
            mod_id.to_string(),
            Modification {
                props,
                ext_locations: BTreeSet::new(),
            },
        );
    }

    pub fn modification(&self, mod_id: &str) -> Option<&Modification> {
        self.mods.get(mod_id)
    }

    pub fn modifications(&self) -> &BTreeMap<String, Modification> {
        &self.mods
    }

    /// Resolves a location key of the form `<part uuid>,<id_num>,<is_fwd>,<idx>`
    /// to a live strand.
    pub fn mod_strand_idx(&self, key: &str) -> Result<(PartId, StrandRef, i64)> {
        let caps = LOCATION_KEY
            .captures(key)
            .ok_or_else(|| DesignError::BadLocationKey(key.to_string()))?;

        let bad_key = || DesignError::BadLocationKey(key.to_string());
        let id_num: usize = caps["id"].parse().map_err(|_| bad_key())?;
        let idx: i64 = caps["idx"].parse().map_err(|_| bad_key())?;
        let direction = Direction::from_str(&caps["fwd"])?;

        let part_id = self
            .part_by_uuid(&caps["part"])
            .ok_or_else(|| DesignError::PartNotFound(caps["part"].to_string()))?;
        let strand = self.parts[part_id].require_strand(direction, id_num, idx)?;
        Ok((part_id, strand, idx))
    }

    /// Attaches `mod_id` at a resolved location and records the key.
    pub fn add_mod_strand_instance(
        &mut self,
        part_id: PartId,
        strand: StrandRef,
        idx: i64,
        mod_id: &str,
        key: &str,
    ) -> Result<()> {
        let part = self
            .parts
            .get_mut(part_id)
            .ok_or_else(|| DesignError::PartNotFound(part_id.to_string()))?;
        part.add_mod_strand_instance(strand, idx, mod_id);
        self.mods
            .entry(mod_id.to_string())
            .or_default()
            .ext_locations
            .insert(key.to_string());
        Ok(())
    }

    pub fn ortho_view_type(&self) -> Option<OrthoViewType> {
        self.ortho_view_type
    }

    pub fn set_ortho_view_type(&mut self, ortho_view_type: OrthoViewType) {
        self.ortho_view_type = Some(ortho_view_type);
    }
}
