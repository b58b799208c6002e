//! Ingredient model
//!
//! One row of a formulation: a COA-backed raw material and its share of the blend.

use serde::{Deserialize, Serialize};

use super::{NutrientEntry, NutrientTable};

/// Session-local ingredient identifier
pub type IngredientId = u64;

/// An ingredient in the formulation being authored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: IngredientId,
    /// Source COA, None until one is picked
    pub coa_id: Option<String>,
    pub coa_name: String,
    /// Percentage of the total formula; not bounded to 100
    pub percentage: f64,
    pub nutritional_data: NutrientTable,
}

impl Ingredient {
    /// An empty row, as created by "add ingredient"
    pub fn empty(id: IngredientId) -> Self {
        Self {
            id,
            coa_id: None,
            coa_name: String::new(),
            percentage: 0.0,
            nutritional_data: NutrientTable::new(),
        }
    }

    pub fn nutrient(&self, name: &str) -> Option<&NutrientEntry> {
        self.nutritional_data.get(name)
    }

    /// Weight of this ingredient in the blend (percentage / 100)
    pub fn fraction(&self) -> f64 {
        self.percentage / 100.0
    }
}
