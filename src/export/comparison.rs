//! Product comparison workbook
//!
//! Two sheets: "Product Info" (image, basic, composition and company
//! fields side by side) and "Nutrition" (one row per nutrient). Product
//! images are embedded best-effort: anything that fails to decode is
//! logged and its cell left blank.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatPattern, Image, Workbook, Worksheet};
use tracing::warn;

use super::{ExportError, ExportResult};
use crate::models::ComparedProduct;

pub const MIN_PRODUCTS: usize = 2;
pub const MAX_PRODUCTS: usize = 8;

const NOT_SPECIFIED: &str = "Not specified";
const IMAGE_ROW_HEIGHT: f64 = 120.0;
const THUMB_WIDTH: u32 = 140;
const THUMB_HEIGHT: u32 = 110;

/// Fields of the "Product Info" sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    ProductName,
    Brand,
    SubBrand,
    Variant,
    PackSize,
    ServeSize,
    Mrp,
    PackingFormat,
    Manufactured,
    Expiry,
    ShelfLife,
    Category,
    VegNonVeg,
    Claims,
    Tags,
    Ingredients,
    Allergens,
    StorageCondition,
    InstructionsToUse,
    MarketedBy,
    ManufacturedBy,
    PackedBy,
    Fssai,
    Barcode,
    OtherNotes,
}

/// (section started by this row, label, field)
const INFO_FIELDS: &[(Option<&str>, &str, Field)] = &[
    (Some("Basic Information"), "Product Name", Field::ProductName),
    (None, "Brand", Field::Brand),
    (None, "Sub Brand", Field::SubBrand),
    (None, "Variant", Field::Variant),
    (None, "Net Weight / Pack Size", Field::PackSize),
    (None, "Serve Size", Field::ServeSize),
    (None, "MRP", Field::Mrp),
    (None, "Packing Format", Field::PackingFormat),
    (None, "Manufacturing Date", Field::Manufactured),
    (None, "Expiry Date", Field::Expiry),
    (None, "Shelf Life", Field::ShelfLife),
    (None, "Category", Field::Category),
    (None, "Veg/Non-Veg", Field::VegNonVeg),
    (None, "Claims on Pack", Field::Claims),
    (None, "Tags", Field::Tags),
    (Some("Composition"), "Ingredients", Field::Ingredients),
    (None, "Allergens", Field::Allergens),
    (None, "Shelf Life", Field::ShelfLife),
    (None, "Storage Condition", Field::StorageCondition),
    (None, "Instructions to Use", Field::InstructionsToUse),
    (Some("Company Information"), "Marketed By", Field::MarketedBy),
    (None, "Manufactured By", Field::ManufacturedBy),
    (None, "Packed By", Field::PackedBy),
    (None, "FSSAI License No.", Field::Fssai),
    (None, "Barcode", Field::Barcode),
    (None, "Other Notes", Field::OtherNotes),
];

fn or_not_specified(s: &str) -> String {
    if s.trim().is_empty() { NOT_SPECIFIED.to_string() } else { s.to_string() }
}

fn joined(items: &[String]) -> String {
    if items.is_empty() { NOT_SPECIFIED.to_string() } else { items.join(", ") }
}

fn field_value(product: &ComparedProduct, field: Field) -> String {
    let p = product;
    match field {
        Field::ProductName => or_not_specified(&p.product_name),
        Field::Brand => or_not_specified(&p.brand),
        Field::SubBrand => or_not_specified(&p.sub_brand),
        Field::Variant => or_not_specified(&p.variant),
        Field::PackSize => or_not_specified(&p.pack_size),
        Field::ServeSize => or_not_specified(&p.serve_size),
        Field::Mrp => or_not_specified(&p.mrp),
        Field::PackingFormat => or_not_specified(&p.packing_format),
        Field::Manufactured => or_not_specified(&p.manufactured),
        Field::Expiry => or_not_specified(&p.expiry),
        Field::ShelfLife => or_not_specified(&p.shelf_life),
        Field::Category => or_not_specified(&p.category),
        Field::VegNonVeg => or_not_specified(&p.veg_nonveg),
        Field::Claims => joined(&p.claims),
        Field::Tags => joined(&p.tags),
        Field::Ingredients => joined(&p.ingredients),
        Field::Allergens => joined(&p.allergens),
        Field::StorageCondition => or_not_specified(&p.storage_condition),
        Field::InstructionsToUse => or_not_specified(&p.instructions_to_use),
        Field::MarketedBy => or_not_specified(&p.marketed_by),
        Field::ManufacturedBy => or_not_specified(&p.manufactured_by),
        Field::PackedBy => or_not_specified(&p.packed_by),
        Field::Fssai => or_not_specified(&p.fssai),
        Field::Barcode => or_not_specified(&p.barcode),
        Field::OtherNotes => or_not_specified(&p.other_notes),
    }
}

/// Nutrition cell text: `"<per100g> / <perServe> / <rda>"`
fn nutrition_cell(product: &ComparedProduct, nutrient: &str) -> String {
    match product.nutrient(nutrient) {
        Some(n) => {
            let part = |v: &Option<String>| v.clone().filter(|s| !s.is_empty()).unwrap_or_else(|| "-".into());
            format!("{} / {} / {}", part(&n.per_100g), part(&n.per_serve), part(&n.rda))
        }
        None => NOT_SPECIFIED.to_string(),
    }
}

/// Nutrient names across products, first-seen order
fn nutrient_names(products: &[ComparedProduct]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (name, _) in products.iter().flat_map(|p| p.nutrition.iter()) {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

/// Split a `data:image/<png|jpeg|jpg|gif>;base64,<payload>` URL
fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:image/")?;
    let (ext, payload) = rest.split_once(";base64,")?;
    if !matches!(ext, "png" | "jpeg" | "jpg" | "gif") || payload.is_empty() {
        return None;
    }
    Some((ext, payload))
}

/// Decode a data URL and shrink it to the thumbnail box, re-encoded as PNG
pub fn thumbnail_from_data_url(url: &str) -> Result<Vec<u8>, String> {
    let (_, payload) = parse_data_url(url).ok_or("not a supported image data URL")?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("invalid base64: {}", e))?;
    let img = image::load_from_memory(&bytes).map_err(|e| format!("undecodable image: {}", e))?;
    let thumb = img.thumbnail(THUMB_WIDTH, THUMB_HEIGHT);

    let mut out = Cursor::new(Vec::new());
    thumb
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| format!("PNG encoding failed: {}", e))?;
    Ok(out.into_inner())
}

struct Styles {
    header: Format,
    section: Format,
    label: Format,
    value: Format,
    no_image: Format,
    sub_header: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            header: Format::new()
                .set_bold()
                .set_font_size(11)
                .set_pattern(FormatPattern::Solid)
                .set_background_color(Color::RGB(0xE8EDF5))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
            section: Format::new()
                .set_bold()
                .set_font_color(Color::RGB(0x6B7280))
                .set_pattern(FormatPattern::Solid)
                .set_background_color(Color::RGB(0xF3F4F6)),
            label: Format::new()
                .set_bold()
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
            value: Format::new()
                .set_align(FormatAlign::VerticalCenter)
                .set_text_wrap(),
            no_image: Format::new()
                .set_italic()
                .set_font_color(Color::RGB(0x9CA3AF))
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
            sub_header: Format::new()
                .set_italic()
                .set_font_size(10)
                .set_font_color(Color::RGB(0x6B7280))
                .set_align(FormatAlign::Center),
        }
    }
}

fn set_widths(ws: &mut Worksheet, product_count: usize) -> ExportResult<()> {
    ws.set_column_width(0, 28)?;
    for i in 0..product_count {
        ws.set_column_width(i as u16 + 1, 32)?;
    }
    Ok(())
}

fn write_header(ws: &mut Worksheet, first: &str, products: &[ComparedProduct], styles: &Styles) -> ExportResult<()> {
    ws.write_string_with_format(0, 0, first, &styles.header)?;
    for (i, p) in products.iter().enumerate() {
        ws.write_string_with_format(0, i as u16 + 1, &p.product_name, &styles.header)?;
    }
    Ok(())
}

fn write_section(ws: &mut Worksheet, row: u32, title: &str, columns: usize, styles: &Styles) -> ExportResult<()> {
    ws.write_string_with_format(row, 0, format!("--- {} ---", title), &styles.section)?;
    for col in 1..=columns {
        ws.write_blank(row, col as u16, &styles.section)?;
    }
    Ok(())
}

fn write_image_row(ws: &mut Worksheet, row: u32, products: &[ComparedProduct], styles: &Styles) -> ExportResult<()> {
    ws.set_row_height(row, IMAGE_ROW_HEIGHT)?;
    ws.write_string_with_format(row, 0, "Product Image", &styles.label)?;

    for (i, product) in products.iter().enumerate() {
        let col = i as u16 + 1;
        let Some(url) = product.first_image.as_deref() else {
            ws.write_string_with_format(row, col, "No Image", &styles.no_image)?;
            continue;
        };

        let embedded = thumbnail_from_data_url(url).and_then(|png| {
            let image = Image::new_from_buffer(&png).map_err(|e| e.to_string())?;
            ws.embed_image(row, col, &image).map_err(|e| e.to_string())?;
            Ok(())
        });
        if let Err(e) = embedded {
            warn!("Could not embed image for {}: {}", product.product_name, e);
        }
    }
    Ok(())
}

fn write_info_sheet(ws: &mut Worksheet, products: &[ComparedProduct], styles: &Styles) -> ExportResult<()> {
    ws.set_name("Product Info")?;
    set_widths(ws, products.len())?;
    write_header(ws, "Field", products, styles)?;

    let mut row: u32 = 1;
    write_section(ws, row, "Product Image", products.len(), styles)?;
    row += 1;
    write_image_row(ws, row, products, styles)?;
    row += 1;

    for (section, label, field) in INFO_FIELDS {
        if let Some(section) = section {
            write_section(ws, row, section, products.len(), styles)?;
            row += 1;
        }
        ws.write_string_with_format(row, 0, *label, &styles.label)?;
        for (i, p) in products.iter().enumerate() {
            ws.write_string_with_format(row, i as u16 + 1, field_value(p, *field), &styles.value)?;
        }
        row += 1;
    }
    Ok(())
}

fn write_nutrition_sheet(ws: &mut Worksheet, products: &[ComparedProduct], styles: &Styles) -> ExportResult<()> {
    ws.set_name("Nutrition")?;
    set_widths(ws, products.len())?;
    write_header(ws, "Nutrient", products, styles)?;

    for i in 0..products.len() {
        ws.write_string_with_format(1, i as u16 + 1, "Per 100g / Per Serve / %RDA", &styles.sub_header)?;
    }

    for (offset, nutrient) in nutrient_names(products).iter().enumerate() {
        let row = offset as u32 + 2;
        ws.write_string_with_format(row, 0, nutrient, &styles.label)?;
        for (i, p) in products.iter().enumerate() {
            ws.write_string_with_format(row, i as u16 + 1, nutrition_cell(p, nutrient), &styles.value)?;
        }
    }
    Ok(())
}

/// Build the comparison workbook for 2 to 8 products
pub fn to_comparison_xlsx(products: &[ComparedProduct]) -> ExportResult<Vec<u8>> {
    if products.len() < MIN_PRODUCTS {
        return Err(ExportError::NothingToExport(
            "Please select at least 2 products to export.".into(),
        ));
    }
    if products.len() > MAX_PRODUCTS {
        return Err(ExportError::NothingToExport(format!(
            "At most {} products can be compared.",
            MAX_PRODUCTS
        )));
    }

    let styles = Styles::new();
    let mut workbook = Workbook::new();
    write_info_sheet(workbook.add_worksheet(), products, &styles)?;
    write_nutrition_sheet(workbook.add_worksheet(), products, &styles)?;
    Ok(workbook.save_to_buffer()?)
}
