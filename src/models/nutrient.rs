//! Per-ingredient nutrient values
//!
//! A COA reports up to four values per nutrient. Older saved formulations
//! store a single bare number instead, so both shapes are accepted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which of a cell's values feeds the calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    Actual,
    Min,
    Max,
    Average,
    Custom,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Actual => "actual",
            ValueKind::Min => "min",
            ValueKind::Max => "max",
            ValueKind::Average => "average",
            ValueKind::Custom => "custom",
        }
    }

    /// Parse from string, None for anything unrecognized
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "actual" => Some(ValueKind::Actual),
            "min" => Some(ValueKind::Min),
            "max" => Some(ValueKind::Max),
            "average" | "avg" => Some(ValueKind::Average),
            "custom" => Some(ValueKind::Custom),
            _ => None,
        }
    }
}

/// The four measured values of one nutrient on a COA
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutrientCell {
    #[serde(default)]
    pub actual: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub average: Option<f64>,
}

impl NutrientCell {
    /// Value stored for a measured kind. `Custom` is never stored on the cell.
    pub fn get(&self, kind: ValueKind) -> Option<f64> {
        match kind {
            ValueKind::Actual => self.actual,
            ValueKind::Min => self.min,
            ValueKind::Max => self.max,
            ValueKind::Average => self.average,
            ValueKind::Custom => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actual.is_none() && self.min.is_none() && self.max.is_none() && self.average.is_none()
    }
}

/// One entry of an ingredient's nutrient table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NutrientEntry {
    /// Legacy single-value form
    Scalar(f64),
    Cell(NutrientCell),
}

impl NutrientEntry {
    /// Raw value of a given kind, as shown next to each option in a picker
    pub fn raw_value(&self, kind: ValueKind) -> Option<f64> {
        match self {
            NutrientEntry::Scalar(v) => match kind {
                ValueKind::Actual => Some(*v),
                _ => None,
            },
            NutrientEntry::Cell(cell) => cell.get(kind),
        }
    }
}

impl From<f64> for NutrientEntry {
    fn from(v: f64) -> Self {
        NutrientEntry::Scalar(v)
    }
}

impl From<NutrientCell> for NutrientEntry {
    fn from(cell: NutrientCell) -> Self {
        NutrientEntry::Cell(cell)
    }
}

/// Nutrient name -> entry, as extracted from a COA
pub type NutrientTable = BTreeMap<String, NutrientEntry>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind_parsing() {
        assert_eq!(ValueKind::from_str("MAX"), Some(ValueKind::Max));
        assert_eq!(ValueKind::from_str(" average "), Some(ValueKind::Average));
        assert_eq!(ValueKind::from_str("median"), None);
        assert_eq!(ValueKind::default(), ValueKind::Actual);
    }

    #[test]
    fn test_entry_deserializes_both_shapes() {
        let json = r#"{"Protein": 80.5, "Fat": {"actual": 5.2, "min": 4.0, "max": null}}"#;
        let table: NutrientTable = serde_json::from_str(json).unwrap();

        assert_eq!(table["Protein"], NutrientEntry::Scalar(80.5));
        match table["Fat"] {
            NutrientEntry::Cell(cell) => {
                assert_eq!(cell.actual, Some(5.2));
                assert_eq!(cell.min, Some(4.0));
                assert_eq!(cell.max, None);
                assert_eq!(cell.average, None);
            }
            NutrientEntry::Scalar(_) => panic!("expected a cell"),
        }
    }

    #[test]
    fn test_raw_value_for_scalar_only_has_actual() {
        let entry = NutrientEntry::Scalar(12.0);
        assert_eq!(entry.raw_value(ValueKind::Actual), Some(12.0));
        assert_eq!(entry.raw_value(ValueKind::Min), None);
        assert_eq!(entry.raw_value(ValueKind::Custom), None);
    }

    #[test]
    fn test_value_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ValueKind::Average).unwrap();
        assert_eq!(json, "\"average\"");
    }
}
