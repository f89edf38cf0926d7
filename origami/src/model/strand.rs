use std::collections::BTreeMap;

use crate::model::oligo::OligoId;
use crate::Direction;

/// Stable address of a strand inside a part. Strands never overlap within a
/// strand set, so the low index identifies one uniquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrandRef {
    pub id_num: usize,
    pub direction: Direction,
    pub low_idx: i64,
}

/// A contiguous run of bases on one helix in one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Strand {
    pub low_idx: i64,
    pub high_idx: i64,
    pub color: String,
    pub oligo: Option<OligoId>,
    pub insertions: BTreeMap<i64, i64>,
    pub connection_5p: Option<StrandRef>,
    pub connection_3p: Option<StrandRef>,
    direction: Direction,
}

impl Strand {
    pub fn new(direction: Direction, low_idx: i64, high_idx: i64, color: String) -> Self {
        Self {
            low_idx,
            high_idx,
            color,
            oligo: None,
            insertions: BTreeMap::new(),
            connection_5p: None,
            connection_3p: None,
            direction,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn idx_5p(&self) -> i64 {
        match self.direction {
            Direction::Forward => self.low_idx,
            Direction::Reverse => self.high_idx,
        }
    }

    pub fn idx_3p(&self) -> i64 {
        match self.direction {
            Direction::Forward => self.high_idx,
            Direction::Reverse => self.low_idx,
        }
    }

    pub fn covers(&self, idx: i64) -> bool {
        self.low_idx <= idx && idx <= self.high_idx
    }

    /// Number of bases, counting insertions and skips.
    pub fn total_length(&self) -> i64 {
        let base = self.high_idx - self.low_idx + 1;
        let adjust: i64 = self
            .insertions
            .values()
            .map(|&length| if length > 0 { length } else { -1 })
            .sum();
        base + adjust
    }

    /// Records an insertion (`length > 0`) or skip (`length <= 0`) at `idx`.
    pub fn add_insertion(&mut self, idx: i64, length: i64) {
        self.insertions.insert(idx, length);
    }
}

/// All strands of one helix in one direction, ordered by low index.
#[derive(Debug, Clone, PartialEq)]
pub struct StrandSet {
    id_num: usize,
    direction: Direction,
    strands: BTreeMap<i64, Strand>,
}

impl StrandSet {
    pub fn new(id_num: usize, direction: Direction) -> Self {
        Self {
            id_num,
            direction,
            strands: BTreeMap::new(),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn len(&self) -> usize {
        self.strands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strands.is_empty()
    }

    pub fn strands(&self) -> impl Iterator<Item = &Strand> {
        self.strands.values()
    }

    pub fn strands_mut(&mut self) -> impl Iterator<Item = &mut Strand> {
        self.strands.values_mut()
    }

    pub fn get(&self, low_idx: i64) -> Option<&Strand> {
        self.strands.get(&low_idx)
    }

    pub fn get_mut(&mut self, low_idx: i64) -> Option<&mut Strand> {
        self.strands.get_mut(&low_idx)
    }

    pub fn strand_ref(&self, strand: &Strand) -> StrandRef {
        StrandRef {
            id_num: self.id_num,
            direction: self.direction,
            low_idx: strand.low_idx,
        }
    }

    /// Adds a strand read from a file. Ranges are trusted not to overlap.
    pub fn create_deserialized_strand(
        &mut self,
        low_idx: i64,
        high_idx: i64,
        color: &str,
    ) -> StrandRef {
        let strand = Strand::new(self.direction, low_idx, high_idx, color.to_string());
        self.strands.insert(low_idx, strand);
        StrandRef {
            id_num: self.id_num,
            direction: self.direction,
            low_idx,
        }
    }

    /// The strand whose range contains `idx`, if any.
    pub fn strand_covering(&self, idx: i64) -> Option<&Strand> {
        self.strands
            .range(..=idx)
            .next_back()
            .map(|(_, strand)| strand)
            .filter(|strand| strand.covers(idx))
    }

    /// Sorted `(low, high)` ranges, as cached by the part's segment map.
    pub fn ranges(&self) -> Vec<(i64, i64)> {
        self.strands
            .values()
            .map(|s| (s.low_idx, s.high_idx))
            .collect()
    }

    /// True when no two strands share an index.
    pub fn is_non_overlapping(&self) -> bool {
        self.strands
            .values()
            .zip(self.strands.values().skip(1))
            .all(|(a, b)| a.high_idx < b.low_idx)
    }
}
