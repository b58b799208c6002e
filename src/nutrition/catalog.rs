//! Canonical nutrient catalog
//!
//! One table drives nutrient identity everywhere: regulatory display order,
//! export names and units, synonym resolution, and RDA reference values
//! (ICMR-NIN 2020). Both the RDA calculator and the exporters resolve names
//! through [`lookup`], so the two can never disagree about synonyms.

use serde::Serialize;

use super::rda::{Demographic, DEMOGRAPHIC_COUNT};

/// RDA values in [`Demographic::ALL`] order; 0 means no reference value
pub type RdaRow = [f64; DEMOGRAPHIC_COUNT];

const NO_RDA: RdaRow = [0.0; DEMOGRAPHIC_COUNT];

/// Same value for every category
const fn uniform(v: f64) -> RdaRow {
    [v; DEMOGRAPHIC_COUNT]
}

/// Defined from one year of age up, including pregnancy and lactation
const fn from_children(v: f64) -> RdaRow {
    let mut row = [v; DEMOGRAPHIC_COUNT];
    row[0] = 0.0;
    row[1] = 0.0;
    row
}

/// Defined for children, adolescents and sedentary adults only
const fn general_population(v: f64) -> RdaRow {
    let mut row = from_children(v);
    row[13] = 0.0;
    row[14] = 0.0;
    row
}

/// Export section a nutrient is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Section {
    Vitamins,
    Minerals,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::Vitamins => "Vitamins",
            Section::Minerals => "Minerals",
        }
    }
}

/// A canonical nutrient
#[derive(Debug, Clone, Copy)]
pub struct NutrientIdentity {
    /// Display name used in exports
    pub name: &'static str,
    pub unit: &'static str,
    /// 0 = parent row, 1 = child, 2 = grandchild
    pub indent: u8,
    pub section: Option<Section>,
    /// Synonyms seen in source documents
    pub aliases: &'static [&'static str],
    rda: RdaRow,
}

impl NutrientIdentity {
    const fn new(name: &'static str, unit: &'static str, indent: u8) -> Self {
        Self {
            name,
            unit,
            indent,
            section: None,
            aliases: &[],
            rda: NO_RDA,
        }
    }

    const fn aka(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    const fn rda(mut self, rda: RdaRow) -> Self {
        self.rda = rda;
        self
    }

    const fn section(mut self, section: Section) -> Self {
        self.section = Some(section);
        self
    }

    /// Display name followed by aliases
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }

    /// True if `name` equals the display name or an alias, ignoring case
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        self.names().any(|n| n.eq_ignore_ascii_case(name))
    }

    /// Reference intake for a category, if one is defined
    pub fn rda_for(&self, category: Demographic) -> Option<f64> {
        let value = self.rda[category.index()];
        if value > 0.0 { Some(value) } else { None }
    }

    /// Name prefixed with the indentation used in exports
    pub fn indented_name(&self) -> String {
        let prefix = match self.indent {
            0 => "",
            1 => "    ",
            _ => "        ",
        };
        format!("{}{}", prefix, self.name)
    }
}

use Section::{Minerals, Vitamins};

/// Canonical nutrients in regulatory display order
pub static NUTRIENT_CATALOG: &[NutrientIdentity] = &[
    NutrientIdentity::new("Energy", "kcal", 0).rda(from_children(2000.0)),
    NutrientIdentity::new("Protein", "g", 0).rda([
        8.0, 10.5, 12.5, 16.0, 23.0, 32.0, 33.0, 45.0, 43.0, 55.0, 46.0, 54.0, 46.0, 55.0, 63.0,
    ]),
    NutrientIdentity::new("Carbohydrate", "g", 0).aka(&["Total Carbohydrates"]),
    NutrientIdentity::new("Total sugars", "g", 1),
    NutrientIdentity::new("Added sugars", "g", 2).rda(general_population(50.0)),
    NutrientIdentity::new("Dietary Fiber", "g", 1).aka(&["Dietary Fibre"]).rda([
        0.0, 0.0, 15.0, 20.0, 26.0, 33.0, 30.0, 43.0, 36.0, 50.0, 38.0, 30.0, 25.0, 0.0, 0.0,
    ]),
    NutrientIdentity::new("Soluble Fiber", "g", 1).aka(&["Soluble Fibre"]),
    NutrientIdentity::new("Insoluble Fiber", "g", 1).aka(&["Insoluble Fibre"]),
    NutrientIdentity::new("Total fat", "g", 0).rda(general_population(67.0)),
    NutrientIdentity::new("Saturated Fat", "g", 1)
        .aka(&["Safa", "SFA"])
        .rda(general_population(22.0)),
    NutrientIdentity::new("MUFA", "g", 1).aka(&["Monounsaturated Fat"]),
    NutrientIdentity::new("PUFA", "g", 1).aka(&["Polyunsaturated Fat"]),
    NutrientIdentity::new("Linoleic Acid", "g", 2).aka(&["LA"]),
    NutrientIdentity::new("Alpha-Linolenic Acid (ALA)", "mg", 2)
        .aka(&["Alpha-Linolenic Acid", "ALA"]),
    NutrientIdentity::new("Trans Fat", "g", 1).rda(general_population(2.0)),
    NutrientIdentity::new("Cholesterol", "mg", 1),
    NutrientIdentity::new("Vitamin A (palmitate)", "mcg (RE)", 0)
        .aka(&["Vitamin A"])
        .section(Vitamins)
        .rda([
            350.0, 350.0, 390.0, 510.0, 630.0, 770.0, 790.0, 930.0, 890.0, 1000.0, 860.0, 1000.0,
            840.0, 900.0, 950.0,
        ]),
    NutrientIdentity::new("Vitamin D2", "mcg", 0).section(Vitamins).rda([
        10.0, 10.0, 15.0, 15.0, 15.0, 15.0, 15.0, 15.0, 15.0, 15.0, 15.0, 15.0, 15.0, 15.0, 15.0,
    ]),
    NutrientIdentity::new("Vitamin E", "mg (TE)", 0).section(Vitamins).rda(uniform(7.5)),
    NutrientIdentity::new("Vitamin K", "mcg", 0).section(Vitamins).rda(uniform(55.0)),
    NutrientIdentity::new("Vitamin C", "mg", 0).section(Vitamins).rda([
        20.0, 30.0, 30.0, 35.0, 45.0, 55.0, 50.0, 70.0, 65.0, 85.0, 70.0, 80.0, 65.0, 80.0, 115.0,
    ]),
    NutrientIdentity::new("Vitamin B1 - Thiamine", "mg", 0)
        .aka(&["Vitamin B1", "Thiamine"])
        .section(Vitamins)
        .rda([0.2, 0.4, 0.7, 0.9, 1.1, 1.5, 1.4, 1.9, 1.6, 2.2, 1.7, 1.4, 1.4, 2.0, 2.1]),
    NutrientIdentity::new("Vitamin B2 - Riboflavin", "mg", 0)
        .aka(&["Vitamin B2", "Riboflavin"])
        .section(Vitamins)
        .rda([0.4, 0.6, 1.1, 1.3, 1.6, 2.1, 1.9, 2.7, 2.2, 3.1, 2.3, 2.0, 1.9, 2.7, 3.0]),
    NutrientIdentity::new("Vitamin B3 - Niacin", "mg", 0)
        .aka(&["Vitamin B3", "Niacin"])
        .section(Vitamins)
        .rda([
            2.0, 5.0, 7.0, 9.0, 11.0, 15.0, 14.0, 19.0, 16.0, 22.0, 17.0, 14.0, 11.0, 13.0, 16.0,
        ]),
    NutrientIdentity::new("Vitamin B5 - Calcium Pantothenate", "mg", 0)
        .aka(&["Vitamin B5", "Calcium Pantothenate", "Pantothenic Acid"])
        .section(Vitamins)
        .rda([0.0, 0.0, 4.0, 4.0, 4.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 7.0]),
    NutrientIdentity::new("Vitamin B6 - Pyridoxine", "mg", 0)
        .aka(&["Vitamin B6", "Pyridoxine"])
        .section(Vitamins)
        .rda([0.1, 0.6, 0.9, 1.2, 1.5, 2.0, 1.9, 2.6, 2.2, 3.0, 2.3, 1.9, 1.9, 2.3, 2.16]),
    NutrientIdentity::new("Vitamin B7 - Biotin", "mcg", 0)
        .aka(&["Vitamin B7", "Biotin"])
        .section(Vitamins)
        .rda([
            0.0, 0.0, 20.0, 25.0, 25.0, 35.0, 35.0, 35.0, 35.0, 35.0, 35.0, 40.0, 40.0, 40.0, 45.0,
        ]),
    NutrientIdentity::new("Vitamin B9 - Folic acid", "mcg", 0)
        .aka(&["Vitamin B9", "Folic Acid", "Folate"])
        .section(Vitamins)
        .rda([
            14.7, 50.0, 70.6, 79.4, 100.0, 129.4, 132.4, 167.6, 144.1, 200.0, 158.8, 176.5, 129.4,
            335.3, 194.1,
        ]),
    NutrientIdentity::new("Vitamin B12 - Cobalamin", "mcg", 0)
        .aka(&["Vitamin B12", "Cobalamin"])
        .section(Vitamins)
        .rda([0.0, 0.0, 1.2, 2.2, 2.2, 2.2, 2.2, 2.2, 2.2, 2.2, 2.2, 2.2, 2.2, 2.45, 3.2]),
    NutrientIdentity::new("Calcium", "mg", 0).section(Minerals).rda([
        300.0, 300.0, 500.0, 550.0, 650.0, 850.0, 850.0, 1000.0, 1000.0, 1050.0, 1050.0, 1000.0,
        1000.0, 1000.0, 1200.0,
    ]),
    NutrientIdentity::new("Potassium", "mg", 0).section(Minerals).rda(uniform(3500.0)),
    NutrientIdentity::new("Magnesium", "mg", 0).section(Minerals).rda([
        30.0, 75.0, 90.0, 125.0, 175.0, 240.0, 250.0, 345.0, 340.0, 440.0, 380.0, 440.0, 370.0,
        440.0, 400.0,
    ]),
    NutrientIdentity::new("Zinc", "mg", 0).section(Minerals).rda([
        0.0, 2.5, 3.3, 4.5, 5.9, 8.5, 8.5, 14.3, 12.8, 17.6, 14.2, 17.0, 13.2, 14.5, 14.1,
    ]),
    NutrientIdentity::new("Chromium", "mcg", 0).section(Minerals).rda(uniform(50.0)),
    NutrientIdentity::new("Molybdenum", "mcg", 0).section(Minerals).rda(uniform(45.0)),
    NutrientIdentity::new("Iron", "mg", 0).section(Minerals).rda([
        0.0, 3.0, 8.0, 11.0, 15.0, 16.0, 28.0, 22.0, 30.0, 26.0, 32.0, 19.0, 29.0, 27.0, 23.0,
    ]),
    NutrientIdentity::new("Sodium", "mg", 0).section(Minerals).rda(uniform(2000.0)),
    NutrientIdentity::new("Phosphorus", "mg", 0).section(Minerals).rda(uniform(1000.0)),
    NutrientIdentity::new("Manganese", "mg", 0).section(Minerals).rda(uniform(4.0)),
    NutrientIdentity::new("Iodine", "mcg", 0).section(Minerals).rda([
        100.0, 130.0, 90.0, 90.0, 90.0, 100.0, 100.0, 140.0, 140.0, 140.0, 140.0, 140.0, 140.0,
        220.0, 280.0,
    ]),
    NutrientIdentity::new("Selenium", "mcg", 0).section(Minerals).rda(uniform(40.0)),
    NutrientIdentity::new("Choline", "mg", 0).section(Minerals),
    NutrientIdentity::new("Copper", "mg", 0).section(Minerals).rda(uniform(1700.0)),
    NutrientIdentity::new("Chloride", "mg", 0).section(Minerals).rda([
        0.0, 0.0, 1500.0, 1900.0, 1900.0, 1800.0, 1800.0, 1800.0, 1800.0, 1800.0, 1800.0,
        1800.0, 1800.0, 2300.0, 2300.0,
    ]),
];

/// Resolve a nutrient name (display name or alias, any case) to its identity
pub fn lookup(name: &str) -> Option<&'static NutrientIdentity> {
    NUTRIENT_CATALOG.iter().find(|n| n.matches(name))
}

/// `name` equals `token` or starts with it followed by a space, `(` or `,`.
/// Both sides must already be lowercase.
fn matches_token(name: &str, token: &str) -> bool {
    match name.strip_prefix(token) {
        Some("") => true,
        Some(rest) => rest.starts_with([' ', '(', ',']),
        None => false,
    }
}

/// Display-order rank of a nutrient name, tolerant of unit suffixes such as
/// "Protein (g)". Tokens are tried in catalog order, so "Calcium Pantothenate"
/// ranks as vitamin B5 rather than as calcium.
///
/// The rank is `(catalog index, token position)`: the display name comes
/// first, then each alias in listed order, so "Vitamin B1" sorts before
/// "Thiamine".
pub fn priority_index(name: &str) -> Option<(usize, usize)> {
    let lower = name.trim().to_lowercase();
    NUTRIENT_CATALOG.iter().enumerate().find_map(|(index, identity)| {
        identity
            .names()
            .position(|token| matches_token(&lower, &token.to_lowercase()))
            .map(|position| (index, position))
    })
}

/// Order nutrient names for display: catalog-ranked names first, then the
/// rest alphabetically (case-insensitive).
pub fn sorted_nutrient_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut ranked: Vec<((usize, usize), String)> = Vec::new();
    let mut remaining: Vec<String> = Vec::new();

    for name in names {
        let name = name.into();
        match priority_index(&name) {
            Some(idx) => ranked.push((idx, name)),
            None => remaining.push(name),
        }
    }

    // Stable: names sharing a rank keep their incoming order
    ranked.sort_by_key(|(idx, _)| *idx);
    sort_alphabetically(&mut remaining);

    ranked.into_iter().map(|(_, n)| n).chain(remaining).collect()
}

/// Case-insensitive alphabetical sort, ties broken by exact string
pub fn sort_alphabetically(names: &mut [String]) {
    names.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
}
