//! Data models
//!
//! Rust structs for formulations, ingredients, COAs and compared products.

mod coa;
mod formulation;
mod ingredient;
mod nutrient;
mod product;

pub use coa::{filter_by_ingredient_name, CoaList, CoaNutrient, CoaRecord, CoaSummary};
pub use formulation::{
    CellKey, CellSelections, CustomValues, Formulation, FormulationError, DEFAULT_SERVE_SIZE,
};
pub use ingredient::{Ingredient, IngredientId};
pub use nutrient::{NutrientCell, NutrientEntry, NutrientTable, ValueKind};
pub use product::{ComparedProduct, ProductNutrient};
