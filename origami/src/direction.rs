use serde::de::{self, Deserialize, Deserializer};
use std::fmt::Display;

use crate::error::{DesignError, Result};

/// Which of the two strand sets of a virtual helix a strand lives on.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let txt = match self {
            Direction::Forward => "fwd",
            Direction::Reverse => "rev",
        };
        write!(f, "{}", txt)
    }
}

impl Direction {
    pub fn from_is_fwd(is_fwd: bool) -> Self {
        if is_fwd {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    pub fn is_fwd(&self) -> bool {
        matches!(self, Direction::Forward)
    }

    /// Parses the `0`/`1` flag used in modification location keys, as well as
    /// the `fwd`/`rev` spelling used by `Display`.
    pub fn from_str(direction: &str) -> Result<Self> {
        match direction {
            "1" | "fwd" | "true" => Ok(Direction::Forward),
            "0" | "rev" | "false" => Ok(Direction::Reverse),
            _ => Err(DesignError::InvalidProperty {
                key: "direction".to_string(),
                reason: format!("Could not parse '{}' to Direction", direction),
            }),
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(i64),
}

/// Direction flags show up as booleans in files written by newer encoders and
/// as `0`/`1` in older ones.
impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawFlag::deserialize(deserializer)? {
            RawFlag::Bool(b) => Ok(Direction::from_is_fwd(b)),
            RawFlag::Int(1) => Ok(Direction::Forward),
            RawFlag::Int(0) => Ok(Direction::Reverse),
            RawFlag::Int(other) => Err(de::Error::custom(format!(
                "Could not parse '{}' to Direction",
                other
            ))),
        }
    }
}
