//! CSV rendering of the formulation layout

use super::layout::{CellValue, ExportLayout};
use super::ExportResult;

/// Write every layout row as a CSV record. Rows shorter than the header are
/// padded with empty fields so every record has the same width.
pub fn to_csv(layout: &ExportLayout) -> ExportResult<Vec<u8>> {
    let width = layout.column_count();
    let mut writer = ::csv::WriterBuilder::new()
        .flexible(false)
        .from_writer(Vec::new());

    for row in &layout.rows {
        let mut record: Vec<String> = row
            .cells
            .iter()
            .map(|cell| match cell {
                CellValue::Text(s) => s.clone(),
                CellValue::Number(n) => n.to_string(),
            })
            .collect();
        record.resize(width.max(record.len()), String::new());
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| super::ExportError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::{Composition, CompositionRow, Demographic, ServeUnit};

    #[test]
    fn test_csv_rows_have_uniform_width() {
        let composition = Composition {
            rows: vec![CompositionRow {
                nutrient: "Protein".into(),
                total: 16.0,
                energy_kcal: 64.0,
                energy_percentage: 100.0,
            }],
            total_energy: 64.0,
            total_percentage: 100.0,
        };
        let layout = ExportLayout::build(&composition, &[Demographic::MaleSedentary], 50.0, ServeUnit::Grams);
        let text = String::from_utf8(to_csv(&layout).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "NUTRITIONAL INFORMATION,,,,,");
        assert_eq!(lines[1], "Serve Size: 50 g,,,,,");
        assert!(lines[2].starts_with("Approximate Composition Per 100 g or 100 ml,"));
        assert!(lines.contains(&"Protein,16,8,54,29.63,14.81"));
    }
}
