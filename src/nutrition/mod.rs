//! Formulation calculator
//!
//! Value resolution, weighted aggregation, energy derivation, nutrient
//! ordering and RDA percentages. Pure functions over the in-memory models.

pub mod aggregate;
pub mod catalog;
pub mod energy;
pub mod rda;
pub mod resolver;
pub mod units;

pub use aggregate::{aggregate, nutrient_union, Composition, CompositionRow};
pub use catalog::{
    lookup, priority_index, sorted_nutrient_names, NutrientIdentity, Section, NUTRIENT_CATALOG,
};
pub use energy::{derive_energy, energy_factor, percentage_energy, total_energy};
pub use rda::{rda_percentage, rda_percentages, rda_value, Demographic, NutrientRda, RdaPercentage};
pub use resolver::resolve_value;
pub use units::{per_serve, ServeUnit};
