use thiserror::Error;

use crate::Direction;

/// Errors raised while building or merging a design.
///
/// Only structural problems end up here. Annotation problems (an insertion
/// with no strand underneath it, an unresolvable modification location) are
/// logged and skipped by the decoder instead.
#[derive(Error, Debug)]
pub enum DesignError {
    #[error("No {direction} strand on virtual helix {id_num} covers index {idx}")]
    StrandNotFound {
        id_num: usize,
        direction: Direction,
        idx: i64,
    },

    #[error("Virtual helix {0} does not exist in part")]
    HelixNotFound(usize),

    #[error("Virtual helix {0} is declared more than once")]
    DuplicateHelix(usize),

    #[error("Missing origin for virtual helix {0}")]
    MissingOrigin(usize),

    #[error(
        "Crossover endpoint {id_num}[{idx}] ({direction}) is not the {end} end of its strand"
    )]
    NotAnEndpoint {
        id_num: usize,
        direction: Direction,
        idx: i64,
        end: &'static str,
    },

    #[error("Strand end at {id_num}[{idx}] ({direction}) is already connected")]
    AlreadyConnected {
        id_num: usize,
        direction: Direction,
        idx: i64,
    },

    #[error("Invalid value for property '{key}': {reason}")]
    InvalidProperty { key: String, reason: String },

    #[error("Malformed modification location key: '{0}'")]
    BadLocationKey(String),

    #[error("No part with uuid '{0}' in document")]
    PartNotFound(String),

    #[error("Could not parse design file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not read design file: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DesignError>;
