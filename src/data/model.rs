use std::fmt;

use ndarray::Array1;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::schema::ColumnType;

// ---------------------------------------------------------------------------
// FieldValue – a single decoded cell
// ---------------------------------------------------------------------------

/// A decoded scalar, typed by its schema column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i32),
    Float(f32),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
        }
    }
}

impl FieldValue {
    pub fn kind(&self) -> ColumnType {
        match self {
            FieldValue::String(_) => ColumnType::String,
            FieldValue::Integer(_) => ColumnType::Integer,
            FieldValue::Float(_) => ColumnType::Float,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// DecodedRecord – one parsed line
// ---------------------------------------------------------------------------

/// The typed fields of one line, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DecodedRecord {
    fields: Vec<FieldValue>,
}

impl DecodedRecord {
    pub fn new(fields: Vec<FieldValue>) -> Self {
        DecodedRecord { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FieldValue> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }

    pub fn float(&self, index: usize) -> Option<f32> {
        self.get(index).and_then(FieldValue::as_f32)
    }

    pub fn integer(&self, index: usize) -> Option<i32> {
        self.get(index).and_then(FieldValue::as_i32)
    }

    pub fn string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(FieldValue::as_str)
    }
}

// ---------------------------------------------------------------------------
// FeatureMap – named estimator features
// ---------------------------------------------------------------------------

/// Fixed-key feature mapping that keeps its insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMap {
    entries: Vec<(&'static str, f32)>,
}

impl FeatureMap {
    pub fn from_entries(entries: Vec<(&'static str, f32)>) -> Self {
        FeatureMap { entries }
    }

    pub fn get(&self, key: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.entries.iter().map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FeatureMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Projected examples
// ---------------------------------------------------------------------------

/// Training-policy output: one-hot label and fixed-order features.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    /// One-hot, width = number of pitch classes.
    pub label: Array1<f32>,
    /// `[ax, ay, az, vx0, vy0, vz0, px, pz]`.
    pub features: Array1<f32>,
}

/// Estimator-policy output: named features and the raw class code.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorExample {
    pub features: FeatureMap,
    pub pitch_code: i32,
}

/// Output of either policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Training(TrainingExample),
    Estimator(EstimatorExample),
}
