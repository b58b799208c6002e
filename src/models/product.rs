//! Compared product model
//!
//! Normalizes a product record from the API into the flat shape used by the
//! comparison export. Product records are loosely typed (numbers or strings,
//! comma-separated strings or arrays), so parsing works on `serde_json::Value`.

use serde::Serialize;
use serde_json::Value;

/// Nutrition row of a labelled product, values as printed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductNutrient {
    pub per_100g: Option<String>,
    pub per_serve: Option<String>,
    pub rda: Option<String>,
}

/// A product prepared for side-by-side comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparedProduct {
    pub id: String,
    /// First product image as a data URL, if any
    pub first_image: Option<String>,
    pub product_name: String,
    pub brand: String,
    pub sub_brand: String,
    pub variant: String,
    pub pack_size: String,
    pub serve_size: String,
    pub mrp: String,
    pub packing_format: String,
    pub manufactured: String,
    pub expiry: String,
    pub shelf_life: String,
    pub category: String,
    pub veg_nonveg: String,
    pub claims: Vec<String>,
    pub tags: Vec<String>,
    /// Nutrient rows in label order
    pub nutrition: Vec<(String, ProductNutrient)>,
    pub ingredients: Vec<String>,
    pub allergens: Vec<String>,
    pub storage_condition: String,
    pub instructions_to_use: String,
    pub marketed_by: String,
    pub manufactured_by: String,
    pub packed_by: String,
    pub fssai: String,
    pub barcode: String,
    pub other_notes: String,
}

fn text(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn opt_text(v: Option<&Value>) -> Option<String> {
    let s = text(v);
    if s.is_empty() { None } else { Some(s) }
}

/// Accepts either an array of strings or a comma-separated string
fn list(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|i| text(Some(i)))
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn first_non_empty(p: &Value, keys: &[&str]) -> String {
    keys.iter()
        .map(|k| text(p.get(*k)))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn parse_nutrition(p: &Value) -> Vec<(String, ProductNutrient)> {
    let Some(Value::Array(rows)) = p.get("nutrition_table") else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for row in rows {
        let name = first_non_empty(row, &["nutrient_name", "nutrient"]);
        if name.is_empty() {
            continue;
        }

        // Column keys vary per label ("per 100g", "Per Serve (30g)", "%RDA")
        let find_col = |needle: &str| -> Option<String> {
            let values = row.get("values")?.as_object()?;
            values
                .iter()
                .find(|(k, _)| k.to_lowercase().contains(needle))
                .and_then(|(_, v)| opt_text(Some(v)))
        };

        let nutrient = ProductNutrient {
            per_100g: find_col("100").or_else(|| opt_text(row.get("per100g"))),
            per_serve: find_col("serve").or_else(|| opt_text(row.get("perServe"))),
            rda: find_col("rda").or_else(|| opt_text(row.get("rda"))),
        };
        match out.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = nutrient,
            None => out.push((name, nutrient)),
        }
    }
    out
}

impl ComparedProduct {
    /// Normalize a `GET /products/{id}` response
    pub fn from_api(p: &Value) -> Self {
        let mut marketed_by = String::new();
        let mut manufactured_by = String::new();
        let mut packed_by = String::new();
        let mut fssai = String::new();

        if let Some(Value::Array(details)) = p.get("manufacturer_details") {
            for m in details {
                let kind = text(m.get("type")).to_lowercase();
                let info = [text(m.get("name")), text(m.get("address"))]
                    .into_iter()
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ");
                if kind.contains("market") {
                    marketed_by = info;
                } else if kind.contains("manufactur") {
                    manufactured_by = info;
                } else if kind.contains("pack") {
                    packed_by = info;
                }
                let license = text(m.get("fssai"));
                if fssai.is_empty() && !license.is_empty() && license != "not specified" {
                    fssai = license;
                }
            }
        }
        if fssai.is_empty() {
            fssai = list(p.get("fssai_licenses")).into_iter().next().unwrap_or_default();
        }

        let first_image = match p.get("images") {
            Some(Value::Array(images)) => images.first().and_then(|i| opt_text(Some(i))),
            _ => None,
        };

        let mrp = match opt_text(p.get("mrp")) {
            Some(v) => format!("₹{}", v),
            None => String::new(),
        };

        let other_notes = match p.get("customer_care") {
            Some(care @ Value::Object(_)) => ["phone", "email", "website"]
                .iter()
                .map(|k| text(care.get(*k)))
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            _ => String::new(),
        };

        Self {
            id: first_non_empty(p, &["id", "_id"]),
            first_image,
            product_name: text(p.get("product_name")),
            brand: text(p.get("parent_brand")),
            sub_brand: text(p.get("sub_brand")),
            variant: text(p.get("variant")),
            pack_size: first_non_empty(p, &["net_weight", "pack_size"]),
            serve_size: text(p.get("serving_size")),
            mrp,
            packing_format: text(p.get("packing_format")),
            manufactured: text(p.get("manufacturing_date")),
            expiry: text(p.get("expiry_date")),
            shelf_life: text(p.get("shelf_life")),
            category: text(p.get("category")),
            veg_nonveg: text(p.get("veg_nonveg")),
            claims: list(p.get("claims")),
            tags: list(p.get("tags")),
            nutrition: parse_nutrition(p),
            ingredients: list(p.get("ingredients")),
            allergens: list(p.get("allergen_info")),
            storage_condition: text(p.get("storage_instructions")),
            instructions_to_use: text(p.get("instructions_to_use")),
            marketed_by,
            manufactured_by,
            packed_by,
            fssai,
            barcode: text(p.get("barcode")),
            other_notes,
        }
    }

    pub fn nutrient(&self, name: &str) -> Option<&ProductNutrient> {
        self.nutrition.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}
