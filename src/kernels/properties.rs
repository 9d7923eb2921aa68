//! Kernel specialization properties.
//!
//! Each kernel is compiled against a bag of `p_*` defines (polynomial
//! degree, cubature degree, history depths, feature flags) fixed at
//! registration time. The bag merges a base set shared by a whole solver
//! section with operator-specific additions; on collision the
//! operator-specific value wins.

use std::collections::BTreeMap;

/// A single define value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl PropValue {
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            PropValue::Int(v) if *v >= 0 => Some(*v as usize),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropValue::Float(v) => Some(*v),
            PropValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(v) => Some(*v),
            PropValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }
}

impl From<usize> for PropValue {
    fn from(v: usize) -> Self {
        PropValue::Int(v as i64)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::Int(v)
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        PropValue::Int(v as i64)
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        PropValue::Float(v)
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Bool(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::Str(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::Str(v)
    }
}

/// Ordered bag of defines.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KernelProps {
    defines: BTreeMap<String, PropValue>,
}

impl KernelProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one define, returning the bag for chaining.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set one define in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.defines.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.defines.get(name)
    }

    /// Merge `other` on top of this bag; `other`'s values win on collision.
    pub fn merged(&self, other: &KernelProps) -> KernelProps {
        let mut defines = self.defines.clone();
        for (k, v) in &other.defines {
            defines.insert(k.clone(), v.clone());
        }
        KernelProps { defines }
    }

    pub fn len(&self) -> usize {
        self.defines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropValue)> {
        self.defines.iter()
    }
}
