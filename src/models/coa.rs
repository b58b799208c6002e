//! COA (Certificate of Analysis) model
//!
//! Supplier-reported nutrient values for a raw ingredient, as returned by the API.

use serde::{Deserialize, Serialize};

use super::{NutrientCell, NutrientEntry, NutrientTable};

/// One nutrient row of a COA
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoaNutrient {
    /// Standardized name
    #[serde(default)]
    pub nutrient_name: Option<String>,
    /// Name as printed on the source document
    #[serde(default)]
    pub nutrient_name_raw: Option<String>,
    #[serde(default)]
    pub actual_value: Option<f64>,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub average_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl CoaNutrient {
    /// Key used in the ingredient table: standardized name, else the raw name
    pub fn key(&self) -> Option<&str> {
        [self.nutrient_name.as_deref(), self.nutrient_name_raw.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    pub fn cell(&self) -> NutrientCell {
        NutrientCell {
            actual: self.actual_value,
            min: self.min_value,
            max: self.max_value,
            average: self.average_value,
        }
    }
}

/// Full COA record (`GET /coa/{id}`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoaRecord {
    pub id: String,
    pub ingredient_name: String,
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub nutritional_data: Vec<CoaNutrient>,
}

impl CoaRecord {
    /// Build the ingredient nutrient table, keeping all four value kinds.
    /// Rows without any usable name are skipped; later duplicates win.
    pub fn nutrient_table(&self) -> NutrientTable {
        let mut table = NutrientTable::new();
        for row in &self.nutritional_data {
            if let Some(key) = row.key() {
                table.insert(key.to_string(), NutrientEntry::Cell(row.cell()));
            }
        }
        table
    }
}

/// COA list entry (`GET /coa`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoaSummary {
    pub id: String,
    pub ingredient_name: String,
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub nutrients_count: Option<i64>,
}

/// Paginated COA list response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoaList {
    #[serde(default)]
    pub coas: Vec<CoaSummary>,
    #[serde(default)]
    pub total: i64,
}

/// Case-insensitive substring filter on ingredient name
pub fn filter_by_ingredient_name<'a>(coas: &'a [CoaSummary], term: &str) -> Vec<&'a CoaSummary> {
    let term = term.trim().to_lowercase();
    coas.iter()
        .filter(|c| c.ingredient_name.to_lowercase().contains(&term))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whey() -> CoaRecord {
        serde_json::from_str(
            r#"{
                "id": "abc123",
                "ingredient_name": "Whey Protein Concentrate",
                "supplier_name": "ABC Supplier",
                "nutritional_data": [
                    {"nutrient_name": "Protein", "nutrient_name_raw": "Crude Protein",
                     "actual_value": 80.5, "min_value": 78.0, "max_value": 82.0, "unit": "g"},
                    {"nutrient_name": "", "nutrient_name_raw": "Lactose", "average_value": 4.0},
                    {"nutrient_name_raw": "  "}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_nutrient_table_uses_standard_then_raw_name() {
        let table = whey().nutrient_table();
        assert_eq!(table.len(), 2);

        let protein = table["Protein"];
        assert_eq!(protein.raw_value(crate::models::ValueKind::Max), Some(82.0));
        assert_eq!(protein.raw_value(crate::models::ValueKind::Average), None);

        assert_eq!(
            table["Lactose"].raw_value(crate::models::ValueKind::Average),
            Some(4.0)
        );
    }

    #[test]
    fn test_filter_by_ingredient_name() {
        let coas = vec![
            CoaSummary { id: "1".into(), ingredient_name: "Whey Protein".into(), ..Default::default() },
            CoaSummary { id: "2".into(), ingredient_name: "Cocoa Powder".into(), ..Default::default() },
        ];
        let hits = filter_by_ingredient_name(&coas, "WHEY");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "1");
        assert_eq!(filter_by_ingredient_name(&coas, "").len(), 2);
    }
}
