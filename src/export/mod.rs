//! Spreadsheet exports
//!
//! Formulation nutrition sheet (xlsx and CSV) and the product comparison
//! workbook.

pub mod comparison;
pub mod csv;
pub mod layout;
pub mod workbook;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

pub use self::comparison::to_comparison_xlsx;
pub use self::csv::to_csv;
pub use self::layout::{CellValue, ExportLayout, LayoutRow, RowStyle};
pub use self::workbook::to_xlsx;

/// Export error types
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    NothingToExport(String),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

pub fn formulation_file_name(date: NaiveDate, extension: &str) -> String {
    format!("Formulation_{}.{}", date.format("%Y-%m-%d"), extension)
}

pub fn comparison_file_name(date: NaiveDate) -> String {
    format!("Product_Comparison_{}.xlsx", date.format("%Y-%m-%d"))
}

/// Today's date in UTC, used for export file names
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

/// Write export bytes into `dir`, creating it if needed
pub fn write_file(dir: &Path, file_name: &str, bytes: &[u8]) -> ExportResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes)?;
    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(formulation_file_name(date, "xlsx"), "Formulation_2024-03-07.xlsx");
        assert_eq!(formulation_file_name(date, "csv"), "Formulation_2024-03-07.csv");
        assert_eq!(comparison_file_name(date), "Product_Comparison_2024-03-07.xlsx");
    }

    #[test]
    fn test_write_file_creates_directory() {
        let dir = std::env::temp_dir().join(format!("nutrieyeq-export-{}", std::process::id()));
        let path = write_file(&dir.join("nested"), "out.csv", b"a,b\n").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
