//! NutriEyeQ Formulation Calculator Library
//!
//! Nutrient formulation from COA data: weighted aggregation, energy, %RDA,
//! spreadsheet export and an MCP server around an authoring session.

pub mod api;
pub mod build_info;
pub mod config;
pub mod export;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
