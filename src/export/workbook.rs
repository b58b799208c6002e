//! Formulation workbook writer

use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, Worksheet};

use super::layout::{CellValue, ExportLayout, RowStyle};
use super::ExportResult;

pub const SHEET_NAME: &str = "Formulation";
const HEADER_FILL: u32 = 0xF0F0F0;

struct Styles {
    title: Format,
    bold: Format,
    header: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Format::new().set_bold().set_font_size(14),
            bold: Format::new().set_bold(),
            header: Format::new()
                .set_bold()
                .set_pattern(FormatPattern::Solid)
                .set_background_color(Color::RGB(HEADER_FILL)),
        }
    }

    fn for_row(&self, style: RowStyle) -> Option<&Format> {
        match style {
            RowStyle::Title => Some(&self.title),
            RowStyle::Bold | RowStyle::Section => Some(&self.bold),
            RowStyle::Header => Some(&self.header),
            RowStyle::Plain => None,
        }
    }
}

fn write_layout(worksheet: &mut Worksheet, layout: &ExportLayout) -> ExportResult<()> {
    let styles = Styles::new();

    for (row_idx, row) in layout.rows.iter().enumerate() {
        let r = row_idx as u32;
        let format = styles.for_row(row.style);
        for (col_idx, cell) in row.cells.iter().enumerate() {
            let c = col_idx as u16;
            match (cell, format) {
                (CellValue::Text(s), Some(f)) => {
                    worksheet.write_string_with_format(r, c, s, f)?;
                }
                (CellValue::Text(s), None) => {
                    worksheet.write_string(r, c, s)?;
                }
                (CellValue::Number(n), Some(f)) => {
                    worksheet.write_number_with_format(r, c, *n, f)?;
                }
                (CellValue::Number(n), None) => {
                    worksheet.write_number(r, c, *n)?;
                }
            }
        }
    }

    for (col_idx, width) in layout.column_widths().into_iter().enumerate() {
        worksheet.set_column_width(col_idx as u16, width)?;
    }
    Ok(())
}

/// Render the layout into xlsx bytes
pub fn to_xlsx(layout: &ExportLayout) -> ExportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;
    write_layout(worksheet, layout)?;

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::{Composition, Demographic, ServeUnit};

    #[test]
    fn test_to_xlsx_produces_zip() {
        let layout = ExportLayout::build(
            &Composition::default(),
            &[Demographic::Children1To3, Demographic::FemaleLactating],
            55.0,
            ServeUnit::Grams,
        );
        let bytes = to_xlsx(&layout).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }
}
