use serde_json::Value;
use std::fmt;

use crate::error::{DesignError, Result};

/// A single scalar cell from one of the open property tables in a design
/// file (per-helix columns and extra part properties).
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl PropertyValue {
    /// Converts a JSON value, rejecting arrays and objects.
    pub fn from_json(key: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(PropertyValue::Null),
            Value::Bool(b) => Ok(PropertyValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(PropertyValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(PropertyValue::Float(f))
                } else {
                    Err(DesignError::InvalidProperty {
                        key: key.to_string(),
                        reason: format!("number {} out of range", n),
                    })
                }
            }
            Value::String(s) => Ok(PropertyValue::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => Err(DesignError::InvalidProperty {
                key: key.to_string(),
                reason: "expected a scalar value".to_string(),
            }),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            PropertyValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "None"),
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::Text(s) => write!(f, "{}", s),
        }
    }
}
