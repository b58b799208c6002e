//! Serve size units

use serde::{Deserialize, Serialize};

/// Unit of a serve size. All nutrient values are per 100 of the same unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ServeUnit {
    #[default]
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "ml")]
    Milliliters,
}

impl ServeUnit {
    /// Short unit label
    pub fn as_str(&self) -> &'static str {
        match self {
            ServeUnit::Grams => "g",
            ServeUnit::Milliliters => "ml",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "g" | "gram" | "grams" => Some(ServeUnit::Grams),
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
                Some(ServeUnit::Milliliters)
            }
            _ => None,
        }
    }
}

/// Convert a per-100 value to a per-serve value
pub fn per_serve(per_100: f64, serve_size: f64) -> f64 {
    per_100 * serve_size / 100.0
}
