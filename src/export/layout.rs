//! Nutrition information sheet layout
//!
//! The row/column grid shared by the workbook and CSV writers: title,
//! serve size, header, canonical nutrient rows with section headers, and
//! an "Others" section for nutrients outside the catalog.

use std::collections::HashSet;

use serde::Serialize;

use crate::nutrition::{
    catalog::sort_alphabetically, rda_percentage, Composition, Demographic, NutrientIdentity,
    ServeUnit, NUTRIENT_CATALOG,
};

pub const TITLE: &str = "NUTRITIONAL INFORMATION";
pub const OTHERS_SECTION: &str = "Others";

const BASE_HEADERS: [&str; 3] = [
    "Approximate Composition Per 100 g or 100 ml",
    "% RDA (Per 100 g)",
    "% RDA (Per Serve)",
];
const BASE_WIDTHS: [f64; 3] = [50.0, 18.0, 18.0];
const CATEGORY_WIDTHS: [f64; 3] = [20.0, 22.0, 24.0];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }
}

/// How a row is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStyle {
    Title,
    Bold,
    Header,
    Section,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutRow {
    pub style: RowStyle,
    pub cells: Vec<CellValue>,
}

impl LayoutRow {
    fn single(style: RowStyle, text: impl Into<String>) -> Self {
        Self { style, cells: vec![CellValue::text(text)] }
    }

    /// First cell as text, used for row labels
    pub fn label(&self) -> Option<&str> {
        match self.cells.first() {
            Some(CellValue::Text(s)) => Some(s),
            _ => None,
        }
    }
}

/// Round to 2 decimal places for display; non-finite values become 0
pub fn round2(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        0.0
    }
}

/// Total for a catalog entry: exact name/alias first, then ignoring case
fn find_total(composition: &Composition, identity: &NutrientIdentity) -> f64 {
    let exact = identity
        .names()
        .find_map(|n| composition.rows.iter().find(|r| r.nutrient == n));
    let row = exact.or_else(|| {
        identity.names().find_map(|n| {
            composition
                .rows
                .iter()
                .find(|r| r.nutrient.eq_ignore_ascii_case(n))
        })
    });
    row.map(|r| r.total).unwrap_or(0.0)
}

/// Complete sheet grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportLayout {
    pub categories: Vec<Demographic>,
    pub rows: Vec<LayoutRow>,
}

impl ExportLayout {
    pub fn build(
        composition: &Composition,
        categories: &[Demographic],
        serve_size: f64,
        unit: ServeUnit,
    ) -> Self {
        let mut rows = vec![
            LayoutRow::single(RowStyle::Title, TITLE),
            LayoutRow::single(
                RowStyle::Bold,
                format!("Serve Size: {} {}", serve_size, unit.as_str()),
            ),
            Self::header_row(categories),
        ];

        let mut last_section = None;
        for identity in NUTRIENT_CATALOG {
            if let Some(section) = identity.section {
                if last_section != Some(section) {
                    rows.push(LayoutRow::single(RowStyle::Section, section.label()));
                    last_section = Some(section);
                }
            }

            let per_100g = find_total(composition, identity);
            let mut cells = Self::base_cells(identity.indented_name(), per_100g, serve_size);
            for category in categories {
                let pct = rda_percentage(identity.name, *category, per_100g, serve_size);
                cells.push(CellValue::Number(pct.rda_value));
                cells.push(CellValue::Number(round2(pct.per_100g_pct)));
                cells.push(CellValue::Number(round2(pct.per_serve_pct)));
            }
            rows.push(LayoutRow { style: RowStyle::Plain, cells });
        }

        let others = other_nutrients(composition);
        if !others.is_empty() {
            rows.push(LayoutRow::single(RowStyle::Section, OTHERS_SECTION));
            for name in others {
                let per_100g = composition.total(&name).unwrap_or(0.0);
                let mut cells = Self::base_cells(name, per_100g, serve_size);
                cells.extend((0..categories.len() * 3).map(|_| CellValue::Number(0.0)));
                rows.push(LayoutRow { style: RowStyle::Plain, cells });
            }
        }

        Self { categories: categories.to_vec(), rows }
    }

    fn header_row(categories: &[Demographic]) -> LayoutRow {
        let mut cells: Vec<CellValue> = BASE_HEADERS.iter().map(|h| CellValue::text(*h)).collect();
        for category in categories {
            let label = category.label();
            cells.push(CellValue::text(format!("RDA ({})", label)));
            cells.push(CellValue::text(format!("%RDA {} (per 100g)", label)));
            cells.push(CellValue::text(format!("%RDA {} (per serve)", label)));
        }
        LayoutRow { style: RowStyle::Header, cells }
    }

    fn base_cells(label: String, per_100g: f64, serve_size: f64) -> Vec<CellValue> {
        vec![
            CellValue::Text(label),
            CellValue::Number(round2(per_100g)),
            CellValue::Number(round2(per_100g * serve_size / 100.0)),
        ]
    }

    pub fn column_count(&self) -> usize {
        BASE_HEADERS.len() + self.categories.len() * 3
    }

    pub fn column_widths(&self) -> Vec<f64> {
        let mut widths = BASE_WIDTHS.to_vec();
        for _ in &self.categories {
            widths.extend_from_slice(&CATEGORY_WIDTHS);
        }
        widths
    }

    /// Row whose label (ignoring indentation) equals `label`
    pub fn row(&self, label: &str) -> Option<&LayoutRow> {
        self.rows
            .iter()
            .find(|r| r.label().map(str::trim_start) == Some(label))
    }
}

/// Nutrients with data whose name is neither a catalog name nor an alias,
/// sorted alphabetically
pub fn other_nutrients(composition: &Composition) -> Vec<String> {
    let covered: HashSet<String> = NUTRIENT_CATALOG
        .iter()
        .flat_map(|n| n.names())
        .map(str::to_lowercase)
        .collect();

    let mut others: Vec<String> = composition
        .rows
        .iter()
        .map(|r| r.nutrient.clone())
        .filter(|n| !covered.contains(&n.to_lowercase()))
        .collect();
    sort_alphabetically(&mut others);
    others
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::CompositionRow;

    fn composition(totals: &[(&str, f64)]) -> Composition {
        Composition {
            rows: totals
                .iter()
                .map(|(n, t)| CompositionRow {
                    nutrient: n.to_string(),
                    total: *t,
                    energy_kcal: 0.0,
                    energy_percentage: 0.0,
                })
                .collect(),
            total_energy: 0.0,
            total_percentage: 100.0,
        }
    }

    #[test]
    fn test_no_categories_gives_three_columns() {
        let layout = ExportLayout::build(&composition(&[("Protein", 16.0)]), &[], 55.0, ServeUnit::Grams);
        assert_eq!(layout.column_count(), 3);
        assert_eq!(layout.column_widths(), vec![50.0, 18.0, 18.0]);
        assert_eq!(layout.rows[2].cells.len(), 3);
        assert!(layout.rows.iter().all(|r| r.cells.len() <= 3));
    }

    #[test]
    fn test_title_serve_size_and_header() {
        let cats = [Demographic::MaleSedentary];
        let layout = ExportLayout::build(&composition(&[]), &cats, 30.0, ServeUnit::Milliliters);
        assert_eq!(layout.rows[0].label(), Some(TITLE));
        assert_eq!(layout.rows[1].label(), Some("Serve Size: 30 ml"));
        assert_eq!(layout.rows[2].style, RowStyle::Header);
        assert_eq!(
            layout.rows[2].cells[3..],
            [
                CellValue::text("RDA (Male [Sedentary])"),
                CellValue::text("%RDA Male [Sedentary] (per 100g)"),
                CellValue::text("%RDA Male [Sedentary] (per serve)"),
            ]
        );
        assert_eq!(layout.column_widths(), vec![50.0, 18.0, 18.0, 20.0, 22.0, 24.0]);
    }

    #[test]
    fn test_canonical_rows_use_aliases_and_round() {
        let cats = [Demographic::MaleSedentary];
        let data = composition(&[("Total Carbohydrates", 45.6789), ("thiamine", 0.7)]);
        let layout = ExportLayout::build(&data, &cats, 55.0, ServeUnit::Grams);

        let carbs = layout.row("Carbohydrate").unwrap();
        assert_eq!(carbs.cells[1], CellValue::Number(45.68));
        assert_eq!(carbs.cells[2], CellValue::Number(25.12));
        // no RDA for carbohydrate
        assert_eq!(carbs.cells[3..], [CellValue::Number(0.0), CellValue::Number(0.0), CellValue::Number(0.0)]);

        let b1 = layout.row("Vitamin B1 - Thiamine").unwrap();
        assert_eq!(b1.cells[3], CellValue::Number(1.4));
        assert_eq!(b1.cells[4], CellValue::Number(50.0));
        assert_eq!(b1.cells[5], CellValue::Number(27.5));
    }

    #[test]
    fn test_missing_canonical_nutrients_export_zero() {
        let layout = ExportLayout::build(&composition(&[]), &[], 55.0, ServeUnit::Grams);
        let iron = layout.row("Iron").unwrap();
        assert_eq!(iron.cells[1], CellValue::Number(0.0));
        assert_eq!(iron.cells[2], CellValue::Number(0.0));
    }

    #[test]
    fn test_indentation_and_sections() {
        let layout = ExportLayout::build(&composition(&[]), &[], 55.0, ServeUnit::Grams);
        let labels: Vec<&str> = layout.rows.iter().filter_map(|r| r.label()).collect();
        assert!(labels.contains(&"        Added sugars"));
        assert!(labels.contains(&"    Saturated Fat"));

        let sections: Vec<&str> = layout
            .rows
            .iter()
            .filter(|r| r.style == RowStyle::Section)
            .filter_map(|r| r.label())
            .collect();
        assert_eq!(sections, vec!["Vitamins", "Minerals"]);

        let vitamins = labels.iter().position(|l| *l == "Vitamins").unwrap();
        assert_eq!(labels[vitamins + 1], "Vitamin A (palmitate)");
    }

    #[test]
    fn test_others_section_sorted_and_zero_rda() {
        let cats = [Demographic::FemalePregnant];
        let data = composition(&[("Zeaxanthin", 1.0), ("Protein", 10.0), ("beta glucan", 2.556)]);
        let layout = ExportLayout::build(&data, &cats, 55.0, ServeUnit::Grams);

        let others_at = layout.rows.iter().position(|r| r.label() == Some(OTHERS_SECTION)).unwrap();
        let tail: Vec<&str> = layout.rows[others_at + 1..].iter().filter_map(|r| r.label()).collect();
        assert_eq!(tail, vec!["beta glucan", "Zeaxanthin"]);

        let beta = &layout.rows[others_at + 1];
        assert_eq!(beta.cells[1], CellValue::Number(2.56));
        assert_eq!(beta.cells.len(), 6);
        assert!(beta.cells[3..].iter().all(|c| *c == CellValue::Number(0.0)));
    }

    #[test]
    fn test_no_others_header_when_all_covered() {
        let data = composition(&[("Protein", 10.0), ("Dietary Fibre", 3.0)]);
        let layout = ExportLayout::build(&data, &[], 55.0, ServeUnit::Grams);
        assert!(layout.rows.iter().all(|r| r.label() != Some(OTHERS_SECTION)));
        assert_eq!(layout.row("Dietary Fiber").unwrap().cells[1], CellValue::Number(3.0));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(f64::NAN), 0.0);
        assert_eq!(round2(-2.344), -2.34);
    }
}
