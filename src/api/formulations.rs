//! Formulation persistence
//!
//! Wire types for `/formulations/*` and the conversion between the wire's
//! string-keyed maps (`"<id>-<nutrient>"`) and the typed cell maps.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use super::client::{ApiClient, ApiResult};
use crate::models::{
    CellKey, CellSelections, CustomValues, Formulation, Ingredient, IngredientId, NutrientEntry,
    NutrientTable, ValueKind,
};
use crate::nutrition::ServeUnit;

// ============================================================================
// Wire types
// ============================================================================

/// Ingredient as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredIngredient {
    #[serde(default)]
    pub coa_id: Option<String>,
    #[serde(default)]
    pub coa_name: String,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default, deserialize_with = "table_skipping_nulls")]
    pub nutritional_data: NutrientTable,
}

/// Null and unparseable entries are dropped instead of failing the whole load
fn table_skipping_nulls<'de, D>(deserializer: D) -> Result<NutrientTable, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, serde_json::Value> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| {
            serde_json::from_value::<NutrientEntry>(value)
                .ok()
                .map(|entry| (name, entry))
        })
        .collect())
}

/// Body of `POST /formulations/save`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulationPayload {
    pub name: String,
    pub ingredients: Vec<StoredIngredient>,
    pub nutrient_selections: BTreeMap<String, ValueKind>,
    pub custom_values: BTreeMap<String, f64>,
    pub serve_size: f64,
    pub serve_size_unit: ServeUnit,
    pub created_by: String,
}

impl FormulationPayload {
    /// Ingredients are renumbered 1..=n first, so the keys written here
    /// match the ids assigned again on load.
    pub fn from_formulation(formulation: &Formulation, name: &str, created_by: &str) -> Self {
        let f = formulation.renumbered();

        let ingredients = f
            .ingredients
            .iter()
            .map(|ing| StoredIngredient {
                coa_id: ing.coa_id.clone(),
                coa_name: ing.coa_name.clone(),
                percentage: ing.percentage,
                nutritional_data: ing.nutritional_data.clone(),
            })
            .collect();

        Self {
            name: name.to_string(),
            ingredients,
            nutrient_selections: f.selections.iter().map(|(k, v)| (k.to_wire(), *v)).collect(),
            custom_values: f.custom_values.iter().map(|(k, v)| (k.to_wire(), *v)).collect(),
            serve_size: f.serve_size,
            serve_size_unit: f.serve_size_unit,
            created_by: created_by.to_string(),
        }
    }
}

/// `POST /formulations/save` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

/// `DELETE /formulations/{id}` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Entry of `GET /formulations/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulationSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ingredients_count: usize,
    #[serde(default)]
    pub serve_size: Option<f64>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormulationList {
    #[serde(default)]
    pub formulations: Vec<FormulationSummary>,
    #[serde(default)]
    pub total: i64,
}

/// `GET /formulations/{id}` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredFormulation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<StoredIngredient>,
    #[serde(default)]
    pub nutrient_selections: HashMap<String, String>,
    #[serde(default)]
    pub custom_values: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub serve_size: Option<f64>,
    /// Not persisted by every backend version; grams when absent
    #[serde(default)]
    pub serve_size_unit: Option<ServeUnit>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl StoredFormulation {
    /// Rebuild the session model. Ingredient ids are assigned 1..=n in stored
    /// order; selection and custom-value keys for unknown ingredients or
    /// unknown value kinds are dropped.
    pub fn into_formulation(self, default_serve_size: f64) -> Formulation {
        let count = self.ingredients.len() as IngredientId;
        let known = |key: &CellKey| (1..=count).contains(&key.ingredient_id);

        let ingredients: Vec<Ingredient> = self
            .ingredients
            .into_iter()
            .enumerate()
            .map(|(index, stored)| Ingredient {
                id: index as IngredientId + 1,
                coa_id: stored.coa_id.filter(|id| !id.is_empty()),
                coa_name: stored.coa_name,
                percentage: stored.percentage,
                nutritional_data: stored.nutritional_data,
            })
            .collect();

        let mut selections = CellSelections::new();
        for (raw_key, raw_kind) in self.nutrient_selections {
            match (CellKey::parse_wire(&raw_key), ValueKind::from_str(&raw_kind)) {
                (Ok(key), Some(kind)) if known(&key) => {
                    selections.insert(key, kind);
                }
                _ => warn!("Dropping nutrient selection {} = {}", raw_key, raw_kind),
            }
        }

        let mut custom_values = CustomValues::new();
        for (raw_key, raw_value) in self.custom_values {
            let value = match &raw_value {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            match (CellKey::parse_wire(&raw_key), value) {
                (Ok(key), Some(value)) if known(&key) => {
                    custom_values.insert(key, value);
                }
                _ => warn!("Dropping custom value {} = {}", raw_key, raw_value),
            }
        }

        Formulation {
            id: Some(self.id),
            name: self.name,
            ingredients,
            selections,
            custom_values,
            serve_size: self.serve_size.filter(|s| *s > 0.0).unwrap_or(default_serve_size),
            serve_size_unit: self.serve_size_unit.unwrap_or_default(),
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// Persistence for saved formulations
#[async_trait]
pub trait FormulationStore: Send + Sync {
    async fn save(&self, payload: &FormulationPayload) -> ApiResult<SaveResponse>;
    async fn load(&self, id: &str) -> ApiResult<StoredFormulation>;
    async fn list(&self, skip: usize, limit: usize) -> ApiResult<FormulationList>;
    async fn delete(&self, id: &str) -> ApiResult<DeleteResponse>;
}

#[async_trait]
impl FormulationStore for ApiClient {
    async fn save(&self, payload: &FormulationPayload) -> ApiResult<SaveResponse> {
        info!(
            "Saving formulation '{}' ({} ingredients)",
            payload.name,
            payload.ingredients.len()
        );
        self.post_json("/formulations/save", payload).await
    }

    async fn load(&self, id: &str) -> ApiResult<StoredFormulation> {
        info!("Loading formulation {}", id);
        self.get_json(&format!("/formulations/{}", id), &[]).await
    }

    async fn list(&self, skip: usize, limit: usize) -> ApiResult<FormulationList> {
        let query = [("skip", skip.to_string()), ("limit", limit.to_string())];
        self.get_json("/formulations/list", &query).await
    }

    async fn delete(&self, id: &str) -> ApiResult<DeleteResponse> {
        info!("Deleting formulation {}", id);
        self.delete_json(&format!("/formulations/{}", id)).await
    }
}

/// In-memory store used by tests
#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use super::*;
    use crate::api::ApiError;

    #[derive(Default)]
    pub struct MemoryFormulationStore {
        records: Mutex<Vec<StoredFormulation>>,
        next_id: Mutex<u64>,
        pub fail_with: Mutex<Option<String>>,
    }

    impl MemoryFormulationStore {
        fn check_failure(&self) -> ApiResult<()> {
            match self.fail_with.lock().unwrap().clone() {
                Some(message) => Err(ApiError::Status { status: 500, message }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl FormulationStore for MemoryFormulationStore {
        async fn save(&self, payload: &FormulationPayload) -> ApiResult<SaveResponse> {
            self.check_failure()?;
            let id = {
                let mut next = self.next_id.lock().unwrap();
                *next += 1;
                format!("f{}", *next)
            };
            // Round-trip through JSON so tests see exactly what the wire carries;
            // the payload has no id, the backend assigns it
            let mut value = serde_json::to_value(payload)?;
            value["id"] = serde_json::Value::String(id.clone());
            let mut record: StoredFormulation = serde_json::from_value(value)?;
            record.created_at = Some("2024-01-01T00:00:00".into());
            self.records.lock().unwrap().push(record);
            Ok(SaveResponse {
                success: true,
                message: Some(format!("Formulation '{}' saved successfully", payload.name)),
                id: Some(id),
            })
        }

        async fn load(&self, id: &str) -> ApiResult<StoredFormulation> {
            self.check_failure()?;
            self.records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound("Formulation not found".into()))
        }

        async fn list(&self, skip: usize, limit: usize) -> ApiResult<FormulationList> {
            self.check_failure()?;
            let records = self.records.lock().unwrap();
            let formulations = records
                .iter()
                .skip(skip)
                .take(limit)
                .map(|r| FormulationSummary {
                    id: r.id.clone(),
                    name: r.name.clone(),
                    ingredients_count: r.ingredients.len(),
                    serve_size: r.serve_size,
                    created_by: r.created_by.clone(),
                    created_at: r.created_at.clone(),
                    updated_at: r.updated_at.clone(),
                })
                .collect();
            Ok(FormulationList { formulations, total: records.len() as i64 })
        }

        async fn delete(&self, id: &str) -> ApiResult<DeleteResponse> {
            self.check_failure()?;
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| r.id != id);
            if records.len() == before {
                return Err(ApiError::NotFound("Formulation not found".into()));
            }
            Ok(DeleteResponse { success: true, message: None })
        }
    }
}
