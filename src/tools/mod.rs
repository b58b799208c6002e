//! NutriEyeQ Tools module
//!
//! MCP tool implementations for the formulation calculator.

pub mod coas;
pub mod export;
pub mod formulation;
pub mod formulations;
pub mod status;
