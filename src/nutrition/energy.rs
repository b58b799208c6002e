//! Energy derivation
//!
//! Caloric contribution of macronutrients using fixed Atwater-style factors.
//! Matching is exact against a small set of known spellings (ignoring case),
//! so "Protein (g)" or "Sodium" contribute nothing.

/// kcal per gram, by accepted nutrient spelling
const ENERGY_FACTORS: &[(&str, f64)] = &[
    // Protein
    ("Protein", 4.0),
    ("Proteins", 4.0),
    // Carbohydrate
    ("Carbohydrate", 4.0),
    ("Carbohydrates", 4.0),
    ("A. Carbohydrates", 4.0),
    ("Total Carbohydrates", 4.0),
    // Fiber
    ("Dietary Fiber", 2.0),
    ("Dietary Fibre", 2.0),
    ("Fiber", 2.0),
    ("Fibre", 2.0),
    // Fat and its sub-types
    ("Fat", 9.0),
    ("Fats", 9.0),
    ("Total Fat", 9.0),
    ("Saturated Fat", 9.0),
    ("SFA", 9.0),
    ("MUFA", 9.0),
    ("Monounsaturated Fat", 9.0),
    ("PUFA", 9.0),
    ("Polyunsaturated Fat", 9.0),
    ("LA", 9.0),
    ("Linoleic Acid", 9.0),
];

/// kcal per gram for a nutrient name, 0 when it carries no energy
pub fn energy_factor(nutrient: &str) -> f64 {
    let nutrient = nutrient.trim();
    ENERGY_FACTORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(nutrient))
        .map(|(_, factor)| *factor)
        .unwrap_or(0.0)
}

/// kcal contributed by `amount` grams of a nutrient
pub fn derive_energy(nutrient: &str, amount: f64) -> f64 {
    amount * energy_factor(nutrient)
}

/// Sum of derived energy over (nutrient, amount) pairs
pub fn total_energy<'a, I>(totals: I) -> f64
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    totals
        .into_iter()
        .map(|(name, amount)| derive_energy(name, amount))
        .sum()
}

/// Share of total energy, 0 when there is no energy at all
pub fn percentage_energy(kcal: f64, total_energy: f64) -> f64 {
    if total_energy > 0.0 {
        kcal / total_energy * 100.0
    } else {
        0.0
    }
}
