use crate::model::strand::StrandRef;

pub type OligoId = usize;

/// A chain of strands joined end to end by crossovers.
#[derive(Debug, Clone, PartialEq)]
pub struct Oligo {
    pub id: OligoId,
    pub strand_5p: StrandRef,
    pub is_circular: bool,
    pub color: String,
    pub sequence: Option<String>,
    pub length: i64,
    pub strand_count: usize,
}

impl Oligo {
    pub fn new(id: OligoId, strand_5p: StrandRef, color: String) -> Self {
        Self {
            id,
            strand_5p,
            is_circular: false,
            color,
            sequence: None,
            length: 0,
            strand_count: 0,
        }
    }

    pub fn apply_sequence(&mut self, sequence: &str) {
        self.sequence = Some(sequence.to_string());
    }

    /// `true` when there is no sequence, or it has one letter per base
    /// including insertions and skips. Only meaningful once lengths are final.
    pub fn sequence_matches_length(&self) -> bool {
        self.sequence
            .as_ref()
            .map_or(true, |sequence| sequence.len() as i64 == self.length)
    }
}
