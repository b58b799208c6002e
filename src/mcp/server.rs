//! NutriEyeQ MCP Server Implementation
//!
//! Implements the MCP server with all formulation tools. The server owns a
//! single authoring session; every editing tool returns the updated state.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::api::ApiClient;
use crate::config::Config;
use crate::models::IngredientId;
use crate::tools::coas;
use crate::tools::export::{self, SheetFormat};
use crate::tools::formulation::{self, FormulationView, Workbench};
use crate::tools::formulations;
use crate::tools::status::StatusTracker;

/// NutriEyeQ MCP Service
#[derive(Clone)]
pub struct NutrieyeqService {
    status_tracker: Arc<StatusTracker>,
    workbench: Arc<Mutex<Workbench>>,
    client: ApiClient,
    config: Arc<Config>,
    tool_router: ToolRouter<NutrieyeqService>,
}

impl NutrieyeqService {
    pub fn new(config: Config) -> Self {
        let client = ApiClient::new(config.api_url.clone(), config.session());
        Self {
            status_tracker: Arc::new(StatusTracker::new(client.base_url())),
            workbench: Arc::new(Mutex::new(Workbench::new(config.default_serve_size))),
            client,
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Ingredient Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngredientParams {
    /// Ingredient ID returned by add_ingredient
    pub ingredient_id: IngredientId,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetPercentageParams {
    pub ingredient_id: IngredientId,
    /// Share of the formula in percent (not limited to 100)
    pub percentage: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SelectCoaParams {
    pub ingredient_id: IngredientId,
    /// COA ID from list_coas
    pub coa_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetValueKindParams {
    pub ingredient_id: IngredientId,
    /// Nutrient name as it appears on the COA
    pub nutrient: String,
    /// actual, min, max, average or custom
    pub kind: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetCustomValueParams {
    pub ingredient_id: IngredientId,
    pub nutrient: String,
    /// Value per 100 g
    pub value: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetServeSizeParams {
    pub size: f64,
    /// g or ml (default: keep current unit)
    pub unit: Option<String>,
}

// ============================================================================
// COA / Report Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListCoasParams {
    /// Filter by ingredient name (case-insensitive)
    pub search: Option<String>,
    /// Filter by COA status
    pub status: Option<String>,
    /// Maximum COAs to return (default from configuration, normally 500)
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CategoriesParams {
    /// RDA categories, e.g. "Male [Sedentary]", "Children [1-3 Yrs.]"
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CompareProductsParams {
    /// 2 to 8 product IDs
    pub product_ids: Vec<String>,
}

// ============================================================================
// Saved Formulation Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SaveFormulationParams {
    pub name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFormulationsParams {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_formulation_limit")]
    pub limit: usize,
}

fn default_formulation_limit() -> usize { 100 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FormulationIdParams {
    /// Saved formulation ID
    pub id: String,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl NutrieyeqService {
    // --- Status ---

    #[tool(description = "Get the current status of the NutriEyeQ service including build info, API connection and process information")]
    async fn nutrieyeq_status(&self) -> Result<CallToolResult, McpError> {
        let session = self.client.session().await;
        let status = self
            .status_tracker
            .get_status(session.is_authenticated(), session.user_email);
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get step-by-step instructions for building a formulation. Call this when starting a new formulation session or when unsure how to use the tools.")]
    fn formulation_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::FORMULATION_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(FORMULATION_INSTRUCTIONS)]))
    }

    // --- COAs ---

    #[tool(description = "List COAs (Certificates of Analysis) available as ingredient sources, optionally filtered by ingredient name")]
    async fn list_coas(&self, Parameters(p): Parameters<ListCoasParams>) -> Result<CallToolResult, McpError> {
        let limit = p.limit.unwrap_or(self.config.coa_list_limit);
        let result = coas::list_coas(&self.client, p.search, p.status, limit)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Ingredients ---

    #[tool(description = "Add an empty ingredient row to the current formulation. Returns its ID.")]
    async fn add_ingredient(&self) -> Result<CallToolResult, McpError> {
        let result = formulation::add_ingredient(&mut *self.workbench.lock().await);
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Remove an ingredient and its value selections from the current formulation")]
    async fn remove_ingredient(&self, Parameters(p): Parameters<IngredientParams>) -> Result<CallToolResult, McpError> {
        let result = formulation::remove_ingredient(&mut *self.workbench.lock().await, p.ingredient_id)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Set an ingredient's percentage of the formula. Totals other than 100 produce a warning, not an error.")]
    async fn set_ingredient_percentage(&self, Parameters(p): Parameters<SetPercentageParams>) -> Result<CallToolResult, McpError> {
        let result = formulation::set_ingredient_percentage(&mut *self.workbench.lock().await, p.ingredient_id, p.percentage)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Attach a COA to an ingredient, loading its nutrient values")]
    async fn select_coa(&self, Parameters(p): Parameters<SelectCoaParams>) -> Result<CallToolResult, McpError> {
        let result = formulation::select_coa(&self.workbench, &self.client, p.ingredient_id, &p.coa_id)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Choose which COA value (actual, min, max, average, custom) an ingredient contributes for one nutrient")]
    async fn set_value_kind(&self, Parameters(p): Parameters<SetValueKindParams>) -> Result<CallToolResult, McpError> {
        let result = formulation::set_value_kind(&mut *self.workbench.lock().await, p.ingredient_id, &p.nutrient, &p.kind)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Enter a custom per-100g value for an ingredient's nutrient. Used when the value kind is custom.")]
    async fn set_custom_value(&self, Parameters(p): Parameters<SetCustomValueParams>) -> Result<CallToolResult, McpError> {
        let result = formulation::set_custom_value(&mut *self.workbench.lock().await, p.ingredient_id, &p.nutrient, p.value)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Set the serve size (and optionally unit g or ml) used for per-serve and %RDA per serve values")]
    async fn set_serve_size(&self, Parameters(p): Parameters<SetServeSizeParams>) -> Result<CallToolResult, McpError> {
        let result = formulation::set_serve_size(&mut *self.workbench.lock().await, p.size, p.unit.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Calculation ---

    #[tool(description = "Get the current formulation with its ingredients, nutrient totals per 100 g and energy breakdown")]
    async fn get_composition(&self) -> Result<CallToolResult, McpError> {
        let result = FormulationView::of(&*self.workbench.lock().await);
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get %RDA per 100 g and per serve for every nutrient in the formulation, for the given RDA categories")]
    async fn get_rda_percentages(&self, Parameters(p): Parameters<CategoriesParams>) -> Result<CallToolResult, McpError> {
        let result = formulation::get_rda_percentages(&*self.workbench.lock().await, &p.categories)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Clear the current formulation and start over")]
    async fn reset_formulation(&self) -> Result<CallToolResult, McpError> {
        let result = formulation::reset_formulation(&mut *self.workbench.lock().await);
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Exports ---

    #[tool(description = "Export the formulation's nutritional information sheet as an Excel workbook, with %RDA columns for the given categories")]
    async fn export_formulation_xlsx(&self, Parameters(p): Parameters<CategoriesParams>) -> Result<CallToolResult, McpError> {
        let result = export::export_formulation(&*self.workbench.lock().await, &p.categories, SheetFormat::Xlsx, &self.config.export_dir)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Export the formulation's nutritional information sheet as CSV, with %RDA columns for the given categories")]
    async fn export_formulation_csv(&self, Parameters(p): Parameters<CategoriesParams>) -> Result<CallToolResult, McpError> {
        let result = export::export_formulation(&*self.workbench.lock().await, &p.categories, SheetFormat::Csv, &self.config.export_dir)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Export a side-by-side comparison workbook (product info with images, and nutrition) for 2 to 8 products")]
    async fn export_product_comparison(&self, Parameters(p): Parameters<CompareProductsParams>) -> Result<CallToolResult, McpError> {
        let result = export::export_product_comparison(&self.client, &p.product_ids, &self.config.export_dir)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Saved Formulations ---

    #[tool(description = "Save the current formulation under a name. Requires a name and at least one ingredient.")]
    async fn save_formulation(&self, Parameters(p): Parameters<SaveFormulationParams>) -> Result<CallToolResult, McpError> {
        let created_by = self
            .client
            .session()
            .await
            .user_email
            .unwrap_or_else(|| self.config.user_email.clone());
        let result = formulations::save_formulation(&self.workbench, &self.client, &p.name, &created_by)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List saved formulations with pagination")]
    async fn list_formulations(&self, Parameters(p): Parameters<ListFormulationsParams>) -> Result<CallToolResult, McpError> {
        let result = formulations::list_formulations(&self.client, p.skip, p.limit)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Open a saved formulation, replacing the current one (unsaved changes are discarded)")]
    async fn open_formulation(&self, Parameters(p): Parameters<FormulationIdParams>) -> Result<CallToolResult, McpError> {
        let result = formulations::open_formulation(&self.workbench, &self.client, &p.id, self.config.default_serve_size)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a saved formulation")]
    async fn delete_formulation(&self, Parameters(p): Parameters<FormulationIdParams>) -> Result<CallToolResult, McpError> {
        let result = formulations::delete_formulation(&self.workbench, &self.client, &p.id)
            .await
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

#[tool_handler]
impl ServerHandler for NutrieyeqService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "nutrieyeq".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("NutriEyeQ Formulation Calculator".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "NutriEyeQ Formulation Calculator - blend COA-backed ingredients and compute nutrient totals, energy and %RDA. \
                 IMPORTANT: Call formulation_instructions before starting. \
                 COAs: list_coas. \
                 Editing: add_ingredient, remove_ingredient, select_coa, set_ingredient_percentage, \
                 set_value_kind, set_custom_value, set_serve_size, reset_formulation. \
                 Results: get_composition, get_rda_percentages. \
                 Exports: export_formulation_xlsx, export_formulation_csv, export_product_comparison. \
                 Saved: save_formulation, list_formulations, open_formulation, delete_formulation."
                    .into(),
            ),
        }
    }
}
