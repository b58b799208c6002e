//! NutriEyeQ REST API
//!
//! Session-aware HTTP client plus the COA, product and formulation endpoints.

pub mod client;
pub mod coa;
pub mod formulations;

pub use client::{ApiClient, ApiError, ApiResult, Session, TokenPair};
pub use coa::{CoaQuery, CoaSource};
pub use formulations::{
    DeleteResponse, FormulationList, FormulationPayload, FormulationStore, FormulationSummary,
    SaveResponse, StoredFormulation, StoredIngredient,
};
