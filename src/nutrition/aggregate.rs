//! Weighted aggregation
//!
//! Blends per-ingredient values by percentage into the formula's composition.
//! Everything is recomputed from the current formulation on each call.

use std::collections::BTreeSet;

use serde::Serialize;

use super::catalog::sorted_nutrient_names;
use super::energy::{derive_energy, percentage_energy};
use super::resolver::resolve_value;
use crate::models::{Formulation, Ingredient};

/// Weighted total of one nutrient per 100 g of the blend.
/// Ingredients without the nutrient contribute 0.
pub fn aggregate(nutrient: &str, formulation: &Formulation) -> f64 {
    formulation
        .ingredients
        .iter()
        .map(|ing| {
            let value = resolve_value(
                ing.id,
                nutrient,
                &ing.nutritional_data,
                &formulation.selections,
                &formulation.custom_values,
            );
            value * ing.fraction()
        })
        .sum()
}

/// Every nutrient name present in any ingredient, in display order
pub fn nutrient_union(ingredients: &[Ingredient]) -> Vec<String> {
    let names: BTreeSet<&str> = ingredients
        .iter()
        .flat_map(|ing| ing.nutritional_data.keys().map(String::as_str))
        .collect();
    sorted_nutrient_names(names)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionRow {
    pub nutrient: String,
    pub total: f64,
    pub energy_kcal: f64,
    pub energy_percentage: f64,
}

/// Blended composition of a formulation
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Composition {
    pub rows: Vec<CompositionRow>,
    pub total_energy: f64,
    pub total_percentage: f64,
}

impl Composition {
    pub fn compute(formulation: &Formulation) -> Self {
        let totals: Vec<(String, f64)> = nutrient_union(&formulation.ingredients)
            .into_iter()
            .map(|name| {
                let total = aggregate(&name, formulation);
                (name, total)
            })
            .collect();

        let total_energy: f64 = totals
            .iter()
            .map(|(name, total)| derive_energy(name, *total))
            .sum();

        let rows = totals
            .into_iter()
            .map(|(nutrient, total)| {
                let energy_kcal = derive_energy(&nutrient, total);
                CompositionRow {
                    energy_percentage: percentage_energy(energy_kcal, total_energy),
                    nutrient,
                    total,
                    energy_kcal,
                }
            })
            .collect();

        Self {
            rows,
            total_energy,
            total_percentage: formulation.total_percentage(),
        }
    }

    /// Total for a nutrient: exact name first, then ignoring case
    pub fn total(&self, nutrient: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.nutrient == nutrient)
            .or_else(|| {
                self.rows
                    .iter()
                    .find(|r| r.nutrient.eq_ignore_ascii_case(nutrient.trim()))
            })
            .map(|r| r.total)
    }

    /// (nutrient, total) pairs in display order
    pub fn totals(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rows.iter().map(|r| (r.nutrient.as_str(), r.total))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellKey, NutrientCell, NutrientEntry, ValueKind};

    fn ingredient(id: u64, pct: f64, nutrients: &[(&str, f64)]) -> Ingredient {
        let mut ing = Ingredient::empty(id);
        ing.percentage = pct;
        for (name, actual) in nutrients {
            ing.nutritional_data.insert(
                name.to_string(),
                NutrientEntry::Cell(NutrientCell { actual: Some(*actual), ..Default::default() }),
            );
        }
        ing
    }

    fn blend(ingredients: Vec<Ingredient>) -> Formulation {
        Formulation { ingredients, ..Default::default() }
    }

    #[test]
    fn test_sixty_forty_protein_blend() {
        let f = blend(vec![
            ingredient(1, 60.0, &[("Protein", 20.0)]),
            ingredient(2, 40.0, &[("Protein", 10.0)]),
        ]);
        assert!((aggregate("Protein", &f) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_absent_nutrient_contributes_zero() {
        let f = blend(vec![
            ingredient(1, 50.0, &[("Protein", 20.0), ("Iron", 4.0)]),
            ingredient(2, 50.0, &[("Protein", 10.0)]),
        ]);
        assert!((aggregate("Iron", &f) - 2.0).abs() < 1e-9);
        assert_eq!(aggregate("Zinc", &f), 0.0);
    }

    #[test]
    fn test_aggregate_is_linear_in_percentage() {
        let mut f = blend(vec![
            ingredient(1, 30.0, &[("Protein", 20.0)]),
            ingredient(2, 40.0, &[("Protein", 10.0)]),
        ]);
        let before = aggregate("Protein", &f);
        f.ingredients[0].percentage = 60.0;
        let after = aggregate("Protein", &f);
        assert!((after - before - 20.0 * 30.0 / 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_honours_selections() {
        let mut f = blend(vec![ingredient(1, 50.0, &[("Protein", 20.0)])]);
        f.selections.insert(CellKey::new(1, "Protein"), ValueKind::Custom);
        assert_eq!(aggregate("Protein", &f), 0.0);
        f.custom_values.insert(CellKey::new(1, "Protein"), 40.0);
        assert!((aggregate("Protein", &f) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_nutrient_union_is_ordered_and_distinct() {
        let ings = vec![
            ingredient(1, 50.0, &[("Sodium", 1.0), ("Protein", 2.0), ("Zeaxanthin", 1.0)]),
            ingredient(2, 50.0, &[("Energy", 1.0), ("Protein", 3.0)]),
        ];
        assert_eq!(nutrient_union(&ings), vec!["Energy", "Protein", "Sodium", "Zeaxanthin"]);
    }

    #[test]
    fn test_energy_percentages_sum_to_hundred() {
        let f = blend(vec![
            ingredient(1, 70.0, &[("Protein", 20.0), ("Total Fat", 10.0), ("Sodium", 500.0)]),
            ingredient(2, 30.0, &[("Carbohydrate", 60.0), ("Dietary Fiber", 8.0)]),
        ]);
        let c = Composition::compute(&f);
        assert!(c.total_energy > 0.0);
        let sum: f64 = c.rows.iter().map(|r| r.energy_percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);

        let sodium = c.rows.iter().find(|r| r.nutrient == "Sodium").unwrap();
        assert_eq!(sodium.energy_kcal, 0.0);
        assert_eq!(sodium.energy_percentage, 0.0);
    }

    #[test]
    fn test_zero_energy_gives_zero_percentages() {
        let f = blend(vec![ingredient(1, 100.0, &[("Sodium", 500.0), ("Calcium", 100.0)])]);
        let c = Composition::compute(&f);
        assert_eq!(c.total_energy, 0.0);
        assert!(c.rows.iter().all(|r| r.energy_percentage == 0.0));
    }

    #[test]
    fn test_total_lookup_ignores_case() {
        let f = blend(vec![ingredient(1, 50.0, &[("Total Fat", 10.0)])]);
        let c = Composition::compute(&f);
        assert_eq!(c.total("Total Fat"), Some(5.0));
        assert_eq!(c.total("total fat"), Some(5.0));
        assert_eq!(c.total("Protein"), None);
        assert_eq!(c.total_percentage, 50.0);
    }
}
