//! Formulation model
//!
//! A blend of ingredients plus the per-cell value choices made while authoring it.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use super::{Ingredient, IngredientId, ValueKind};
use crate::nutrition::ServeUnit;

/// Default serve size in grams when none has been chosen
pub const DEFAULT_SERVE_SIZE: f64 = 55.0;

/// Identifies one (ingredient, nutrient) cell of the formulation grid
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub ingredient_id: IngredientId,
    pub nutrient: String,
}

impl CellKey {
    pub fn new(ingredient_id: IngredientId, nutrient: impl Into<String>) -> Self {
        Self {
            ingredient_id,
            nutrient: nutrient.into(),
        }
    }

    /// Encode as the API's `"<id>-<nutrient>"` string key
    pub fn to_wire(&self) -> String {
        format!("{}-{}", self.ingredient_id, self.nutrient)
    }

    /// Decode an `"<id>-<nutrient>"` key. The id never contains a dash, so
    /// the first dash separates it from the nutrient name.
    pub fn parse_wire(key: &str) -> Result<Self, FormulationError> {
        let (id, nutrient) = key
            .split_once('-')
            .ok_or_else(|| FormulationError::InvalidSelectionKey(key.to_string()))?;
        let ingredient_id = id
            .trim()
            .parse::<IngredientId>()
            .map_err(|_| FormulationError::InvalidSelectionKey(key.to_string()))?;
        if nutrient.is_empty() {
            return Err(FormulationError::InvalidSelectionKey(key.to_string()));
        }
        Ok(Self::new(ingredient_id, nutrient))
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Chosen value kind per cell; unset cells mean `Actual`
pub type CellSelections = HashMap<CellKey, ValueKind>;

/// User-entered overrides for cells set to `Custom`
pub type CustomValues = HashMap<CellKey, f64>;

/// Formulation errors
#[derive(Debug, Error, PartialEq)]
pub enum FormulationError {
    #[error("Please enter a formulation name")]
    MissingName,

    #[error("Please add at least one ingredient")]
    NoIngredients,

    #[error("Ingredient not found with id: {0}")]
    UnknownIngredient(IngredientId),

    #[error("Invalid nutrient selection key: {0}")]
    InvalidSelectionKey(String),
}

/// A formulation as held in memory by the authoring session
#[derive(Debug, Clone, PartialEq)]
pub struct Formulation {
    /// Store id once saved
    pub id: Option<String>,
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub selections: CellSelections,
    pub custom_values: CustomValues,
    pub serve_size: f64,
    pub serve_size_unit: ServeUnit,
    pub created_by: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Default for Formulation {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            ingredients: Vec::new(),
            selections: CellSelections::new(),
            custom_values: CustomValues::new(),
            serve_size: DEFAULT_SERVE_SIZE,
            serve_size_unit: ServeUnit::Grams,
            created_by: None,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Formulation {
    pub fn ingredient(&self, id: IngredientId) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }

    pub fn ingredient_mut(&mut self, id: IngredientId) -> Option<&mut Ingredient> {
        self.ingredients.iter_mut().find(|i| i.id == id)
    }

    /// Value kind chosen for a cell (defaults to `Actual`)
    pub fn selection(&self, ingredient_id: IngredientId, nutrient: &str) -> ValueKind {
        self.selections
            .get(&CellKey::new(ingredient_id, nutrient))
            .copied()
            .unwrap_or_default()
    }

    pub fn custom_value(&self, ingredient_id: IngredientId, nutrient: &str) -> Option<f64> {
        self.custom_values
            .get(&CellKey::new(ingredient_id, nutrient))
            .copied()
    }

    /// Sum of ingredient percentages (advisory; not required to be 100)
    pub fn total_percentage(&self) -> f64 {
        self.ingredients.iter().map(|i| i.percentage).sum()
    }

    /// Check the name/ingredient requirements for saving; returns the trimmed name
    pub fn validate_for_save(&self, name: &str) -> Result<String, FormulationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FormulationError::MissingName);
        }
        if self.ingredients.is_empty() {
            return Err(FormulationError::NoIngredients);
        }
        Ok(name.to_string())
    }

    /// Copy with ingredient ids renumbered 1..=n in list order, cell keys
    /// following their ingredient. Keys of removed ingredients are dropped.
    pub fn renumbered(&self) -> Self {
        let mapping: HashMap<IngredientId, IngredientId> = self
            .ingredients
            .iter()
            .enumerate()
            .map(|(index, ing)| (ing.id, index as IngredientId + 1))
            .collect();

        let remap = |key: &CellKey| {
            mapping
                .get(&key.ingredient_id)
                .map(|new_id| CellKey::new(*new_id, key.nutrient.clone()))
        };

        let mut copy = self.clone();
        for ing in &mut copy.ingredients {
            ing.id = mapping[&ing.id];
        }
        copy.selections = self
            .selections
            .iter()
            .filter_map(|(key, kind)| remap(key).map(|k| (k, *kind)))
            .collect();
        copy.custom_values = self
            .custom_values
            .iter()
            .filter_map(|(key, value)| remap(key).map(|k| (k, *value)))
            .collect();
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_key_wire_round_trip_with_dashed_nutrient() {
        let key = CellKey::new(3, "Alpha-Linolenic Acid");
        assert_eq!(key.to_wire(), "3-Alpha-Linolenic Acid");
        assert_eq!(CellKey::parse_wire("3-Alpha-Linolenic Acid").unwrap(), key);
    }

    #[test]
    fn test_cell_key_rejects_malformed() {
        assert!(CellKey::parse_wire("Protein").is_err());
        assert!(CellKey::parse_wire("x-Protein").is_err());
        assert!(CellKey::parse_wire("4-").is_err());
    }

    #[test]
    fn test_selection_defaults_to_actual() {
        let f = Formulation::default();
        assert_eq!(f.selection(1, "Protein"), ValueKind::Actual);
        assert_eq!(f.serve_size, DEFAULT_SERVE_SIZE);
    }

    #[test]
    fn test_validate_for_save() {
        let mut f = Formulation::default();
        assert_eq!(f.validate_for_save("  "), Err(FormulationError::MissingName));
        assert_eq!(f.validate_for_save("Bar v1"), Err(FormulationError::NoIngredients));

        f.ingredients.push(Ingredient::empty(1));
        assert_eq!(f.validate_for_save("  Bar v1 "), Ok("Bar v1".to_string()));
    }

    #[test]
    fn test_renumbered_moves_keys_with_ingredients() {
        let mut f = Formulation::default();
        f.ingredients.push(Ingredient::empty(2));
        f.ingredients.push(Ingredient::empty(5));
        f.selections.insert(CellKey::new(5, "Protein"), ValueKind::Max);
        f.selections.insert(CellKey::new(9, "Protein"), ValueKind::Min);
        f.custom_values.insert(CellKey::new(2, "Fat"), 1.5);

        let r = f.renumbered();
        let ids: Vec<_> = r.ingredients.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(r.selection(2, "Protein"), ValueKind::Max);
        assert_eq!(r.selections.len(), 1);
        assert_eq!(r.custom_value(1, "Fat"), Some(1.5));
    }
}
