//! NutriEyeQ Status Tool
//!
//! Provides runtime status information and usage instructions.

use serde::Serialize;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Formulation workflow instructions for AI assistants
pub const FORMULATION_INSTRUCTIONS: &str = r#"
# NutriEyeQ Formulation Instructions

This guide explains how to build a nutritional formulation with the NutriEyeQ tools.

## Overview

A formulation is a blend of raw ingredients. Each ingredient is backed by a
**COA** (Certificate of Analysis) holding supplier-reported nutrient values per
100 g, and contributes to the blend by its **percentage**.

The server holds one formulation in memory. Every editing tool returns the full
current state, including the calculated composition.

---

## Step-by-Step Workflow

1. **Find COAs:** `list_coas(search: "whey")`
2. **Add a row:** `add_ingredient()` returns the new ingredient `id`
3. **Attach a COA:** `select_coa(ingredient_id: 1, coa_id: "...")`
4. **Set its share:** `set_ingredient_percentage(ingredient_id: 1, percentage: 60)`
5. Repeat 2-4 for every ingredient
6. **Check the result:** `get_composition()`
7. **Save it:** `save_formulation(name: "Protein Bar v2")`

Percentages should add up to 100. A total that differs is reported as a
`warning` but never blocks calculation or saving.

---

## Choosing Which COA Value To Use

COAs may report up to four values for a nutrient: `actual`, `min`, `max`,
`average`. By default the `actual` value is used. If it is missing, the
calculator falls back to `average`, then to 0.

- Pick another kind: `set_value_kind(ingredient_id: 1, nutrient: "Protein", kind: "max")`
- Enter your own value: `set_custom_value(ingredient_id: 1, nutrient: "Protein", value: 78.5)`
  then `set_value_kind(..., kind: "custom")`

A cell set to `custom` with no value entered counts as 0.

---

## Composition and Energy

`get_composition` returns, per nutrient:
- `total` - weighted amount per 100 g of the blend
- `energy_kcal` - energy from that nutrient (Protein and Carbohydrates 4 kcal/g,
  Total Fat 9 kcal/g, Dietary Fiber 2 kcal/g)
- `energy_percentage` - its share of the total energy

---

## RDA Percentages

`get_rda_percentages(categories: ["Male [Sedentary]", "Children [1-3 Yrs.]"])`

For each nutrient and category: the RDA value, % of RDA per 100 g and % of RDA
per serve. Nutrients without an RDA for a category report 0.

Valid categories:
- Infant [0-6 Mo.], Infant [7-12 Mo.]
- Children [1-3 Yrs.], Children [4-6 Yrs.], Children [7-9 Yrs.]
- 10-12 Yrs. [Boys], 10-12 Yrs. [Girls], 13-15 Yrs. [Boys], 13-15 Yrs. [Girls]
- 16-18 Yrs. [Boys], 16-18 Yrs. [Girls]
- Male [Sedentary], Female [Sedentary], Female [Pregnant], Female [Lactating]

Serve size defaults to 55 g. Change it with `set_serve_size(size: 30, unit: "g")`.

---

## Exports

| Task | Tool |
|------|------|
| Nutrition sheet (Excel) | `export_formulation_xlsx(categories: [...])` |
| Nutrition sheet (CSV) | `export_formulation_csv(categories: [...])` |
| Side-by-side product comparison | `export_product_comparison(product_ids: [...])` |

Files are written to the export directory and the tools return the path.
Product comparison needs between 2 and 8 products.

---

## Saved Formulations

| Task | Tool |
|------|------|
| Save current | `save_formulation(name)` |
| List saved | `list_formulations()` |
| Load one (replaces current) | `open_formulation(id)` |
| Delete one | `delete_formulation(id)` |
| Start over | `reset_formulation()` |

Opening a formulation discards unsaved changes to the current one.
"#;

/// Runtime status of the NutriEyeQ service
#[derive(Debug, Clone, Serialize)]
pub struct NutrieyeqStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Backend information
    pub api_url: String,
    pub authenticated: bool,
    pub user_email: Option<String>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    api_url: String,
}

impl StatusTracker {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            start_time: Instant::now(),
            api_url: api_url.into(),
        }
    }

    /// Get the current status
    pub fn get_status(&self, authenticated: bool, user_email: Option<String>) -> NutrieyeqStatus {
        let build_info = BuildInfo::current();

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        NutrieyeqStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            api_url: self.api_url.clone(),
            authenticated,
            user_email,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
