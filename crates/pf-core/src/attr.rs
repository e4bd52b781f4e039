//! Dynamically typed attribute values.
//!
//! Components expose their independent attributes through a string-keyed
//! interface so that a declarative build spec and dotted-path property
//! access can reach them. `AttrValue` is the value type of that interface.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{PfError, PfResult};

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Text(String),
    /// List of component names (chamber lists, contained compartments).
    Names(Vec<String>),
    /// Named numeric mapping (solute concentrations).
    Map(BTreeMap<String, f64>),
}

impl AttrValue {
    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "bool",
            AttrValue::Number(_) => "number",
            AttrValue::Text(_) => "text",
            AttrValue::Names(_) => "names",
            AttrValue::Map(_) => "map",
        }
    }

    pub fn as_f64(&self) -> PfResult<f64> {
        match self {
            AttrValue::Number(v) => Ok(*v),
            other => Err(PfError::AttrType {
                expected: "number",
                found: other.kind(),
            }),
        }
    }

    pub fn as_bool(&self) -> PfResult<bool> {
        match self {
            AttrValue::Bool(v) => Ok(*v),
            other => Err(PfError::AttrType {
                expected: "bool",
                found: other.kind(),
            }),
        }
    }

    pub fn as_str(&self) -> PfResult<&str> {
        match self {
            AttrValue::Text(v) => Ok(v),
            other => Err(PfError::AttrType {
                expected: "text",
                found: other.kind(),
            }),
        }
    }

    /// A single name is accepted where a list is expected.
    pub fn as_names(&self) -> PfResult<Vec<String>> {
        match self {
            AttrValue::Names(v) => Ok(v.clone()),
            AttrValue::Text(v) => Ok(vec![v.clone()]),
            other => Err(PfError::AttrType {
                expected: "names",
                found: other.kind(),
            }),
        }
    }

    pub fn as_map(&self) -> PfResult<&BTreeMap<String, f64>> {
        match self {
            AttrValue::Map(v) => Ok(v),
            other => Err(PfError::AttrType {
                expected: "map",
                found: other.kind(),
            }),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Number(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        AttrValue::Names(v)
    }
}

impl From<BTreeMap<String, f64>> for AttrValue {
    fn from(v: BTreeMap<String, f64>) -> Self {
        AttrValue::Map(v)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{v}"),
            AttrValue::Number(v) => write!(f, "{v}"),
            AttrValue::Text(v) => write!(f, "{v}"),
            AttrValue::Names(v) => write!(f, "[{}]", v.join(", ")),
            AttrValue::Map(v) => {
                let parts: Vec<String> = v.iter().map(|(k, x)| format!("{k}: {x}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}
