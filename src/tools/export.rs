//! Export tools
//!
//! Render the current formulation or a set of products and write the file
//! into the export directory.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::formulation::Workbench;
use crate::api::CoaSource;
use crate::export::{self, comparison, ExportError, ExportLayout};
use crate::nutrition::Demographic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx,
    Csv,
}

impl SheetFormat {
    fn extension(&self) -> &'static str {
        match self {
            SheetFormat::Xlsx => "xlsx",
            SheetFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub path: String,
    pub file_name: String,
    pub size_bytes: usize,
    pub rows: usize,
    pub categories: Vec<Demographic>,
}

#[derive(Debug, Serialize)]
pub struct ComparisonExportResponse {
    pub path: String,
    pub file_name: String,
    pub size_bytes: usize,
    pub products: Vec<String>,
}

/// Build the sheet layout for the current formulation
pub fn formulation_layout(bench: &Workbench, categories: &[String]) -> Result<ExportLayout, String> {
    let f = bench.formulation();
    if f.ingredients.is_empty() {
        return Err("Please add ingredients before exporting".to_string());
    }
    let categories = Demographic::parse_list(categories)?;
    Ok(ExportLayout::build(
        &bench.composition(),
        &categories,
        f.serve_size,
        f.serve_size_unit,
    ))
}

fn render(layout: &ExportLayout, format: SheetFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        SheetFormat::Xlsx => export::to_xlsx(layout),
        SheetFormat::Csv => export::to_csv(layout),
    }
}

/// Export the formulation's nutrition sheet
pub fn export_formulation(
    bench: &Workbench,
    categories: &[String],
    format: SheetFormat,
    dir: &Path,
) -> Result<ExportResponse, String> {
    let layout = formulation_layout(bench, categories)?;
    let bytes = render(&layout, format).map_err(|e| format!("Failed to build export: {}", e))?;

    let file_name = export::formulation_file_name(export::today(), format.extension());
    let path = export::write_file(dir, &file_name, &bytes)
        .map_err(|e| format!("Failed to write {}: {}", file_name, e))?;

    Ok(ExportResponse {
        path: path.display().to_string(),
        file_name,
        size_bytes: bytes.len(),
        rows: layout.rows.len(),
        categories: layout.categories,
    })
}

/// Fetch each product and export them side by side
pub async fn export_product_comparison<S: CoaSource + ?Sized>(
    source: &S,
    product_ids: &[String],
    dir: &Path,
) -> Result<ComparisonExportResponse, String> {
    if product_ids.len() < comparison::MIN_PRODUCTS {
        return Err("Please select at least 2 products to export.".to_string());
    }

    let mut products = Vec::with_capacity(product_ids.len());
    for id in product_ids {
        let product = source
            .get_product(id)
            .await
            .map_err(|e| format!("Failed to load product {}: {}", id, e))?;
        products.push(product);
    }

    let bytes = export::to_comparison_xlsx(&products).map_err(|e| e.to_string())?;
    let file_name = export::comparison_file_name(export::today());
    let path = export::write_file(dir, &file_name, &bytes)
        .map_err(|e| format!("Failed to write {}: {}", file_name, e))?;
    info!("Compared {} products", products.len());

    Ok(ComparisonExportResponse {
        path: path.display().to_string(),
        file_name,
        size_bytes: bytes.len(),
        products: products.into_iter().map(|p| p.product_name).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::coa::memory::MemoryCoaSource;
    use crate::models::{CoaNutrient, CoaRecord};

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("nutrieyeq-{}-{}", tag, std::process::id()))
    }

    fn bench_with_protein() -> Workbench {
        let mut bench = Workbench::default();
        let id = bench.add_ingredient();
        let ticket = bench.begin_coa_fetch(id, "c1").unwrap();
        bench.apply_coa(
            &ticket,
            &CoaRecord {
                id: "c1".into(),
                ingredient_name: "Whey".into(),
                nutritional_data: vec![CoaNutrient {
                    nutrient_name: Some("Protein".into()),
                    actual_value: Some(80.0),
                    ..Default::default()
                }],
                ..Default::default()
            },
        );
        bench.set_percentage(id, 100.0).unwrap();
        bench
    }

    #[test]
    fn test_export_requires_ingredients() {
        let err = formulation_layout(&Workbench::default(), &[]).unwrap_err();
        assert_eq!(err, "Please add ingredients before exporting");
    }

    #[test]
    fn test_export_rejects_unknown_category() {
        let err = formulation_layout(&bench_with_protein(), &["Teenagers".to_string()]).unwrap_err();
        assert!(err.contains("Unknown RDA category"));
    }

    #[test]
    fn test_export_csv_writes_file() {
        let dir = temp_dir("csv");
        let resp = export_formulation(
            &bench_with_protein(),
            &["Male [Sedentary]".to_string()],
            SheetFormat::Csv,
            &dir,
        )
        .unwrap();
        assert!(resp.file_name.starts_with("Formulation_"));
        assert!(resp.file_name.ends_with(".csv"));

        let text = std::fs::read_to_string(&resp.path).unwrap();
        assert!(text.lines().any(|l| l.starts_with("Protein,80,44,")));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_export_xlsx_writes_file() {
        let dir = temp_dir("xlsx");
        let resp = export_formulation(&bench_with_protein(), &[], SheetFormat::Xlsx, &dir).unwrap();
        let bytes = std::fs::read(&resp.path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        assert!(resp.categories.is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_comparison_needs_two_products() {
        let source = MemoryCoaSource::default();
        let err = export_product_comparison(&source, &["p1".to_string()], &temp_dir("cmp0"))
            .await
            .unwrap_err();
        assert!(err.contains("at least 2"));
    }

    #[tokio::test]
    async fn test_comparison_export_writes_workbook() {
        let mut source = MemoryCoaSource::default();
        for (id, name) in [("p1", "Bar A"), ("p2", "Bar B")] {
            source.products.insert(
                id.to_string(),
                serde_json::json!({"id": id, "product_name": name}),
            );
        }
        let dir = temp_dir("cmp");
        let resp = export_product_comparison(&source, &["p1".to_string(), "p2".to_string()], &dir)
            .await
            .unwrap();
        assert_eq!(resp.products, vec!["Bar A", "Bar B"]);
        assert!(resp.file_name.starts_with("Product_Comparison_"));
        std::fs::remove_dir_all(&dir).unwrap();

        let err = export_product_comparison(&source, &["p1".to_string(), "missing".to_string()], &dir)
            .await
            .unwrap_err();
        assert!(err.contains("Failed to load product missing"));
    }
}
