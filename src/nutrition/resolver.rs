//! Nutrient value resolution
//!
//! Picks the single number used for one (ingredient, nutrient) cell.
//! Missing data never fails; it degrades to 0.

use crate::models::{
    CellKey, CellSelections, CustomValues, IngredientId, NutrientEntry, NutrientTable, ValueKind,
};

/// Resolve the value of a cell.
///
/// - Scalar entries always resolve to their number, whatever the selection.
/// - `Custom` resolves to the entered override, or 0 if none was entered.
/// - Other kinds fall back `kind -> actual -> average -> 0`.
pub fn resolve_value(
    ingredient_id: IngredientId,
    nutrient: &str,
    table: &NutrientTable,
    selections: &CellSelections,
    custom_values: &CustomValues,
) -> f64 {
    let cell = match table.get(nutrient) {
        Some(NutrientEntry::Cell(cell)) => cell,
        Some(NutrientEntry::Scalar(value)) => return *value,
        None => return 0.0,
    };

    let key = CellKey::new(ingredient_id, nutrient);
    let kind = selections.get(&key).copied().unwrap_or_default();

    if kind == ValueKind::Custom {
        return custom_values.get(&key).copied().unwrap_or(0.0);
    }

    cell.get(kind)
        .or(cell.actual)
        .or(cell.average)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NutrientCell;

    fn table() -> NutrientTable {
        let mut t = NutrientTable::new();
        t.insert(
            "Protein".into(),
            NutrientCell { actual: Some(20.0), min: Some(18.0), max: Some(22.0), average: Some(19.5) }
                .into(),
        );
        t.insert(
            "Fat".into(),
            NutrientCell { actual: None, min: Some(4.0), max: None, average: Some(5.0) }.into(),
        );
        t.insert("Sugar".into(), NutrientEntry::Scalar(7.0));
        t
    }

    #[test]
    fn test_default_selection_is_actual() {
        let v = resolve_value(1, "Protein", &table(), &CellSelections::new(), &CustomValues::new());
        assert_eq!(v, 20.0);
    }

    #[test]
    fn test_selected_kind_and_fallback_chain() {
        let mut sel = CellSelections::new();
        sel.insert(CellKey::new(1, "Protein"), ValueKind::Max);
        sel.insert(CellKey::new(1, "Fat"), ValueKind::Max);
        let custom = CustomValues::new();

        assert_eq!(resolve_value(1, "Protein", &table(), &sel, &custom), 22.0);
        // max missing, actual missing -> average
        assert_eq!(resolve_value(1, "Fat", &table(), &sel, &custom), 5.0);
        // selection belongs to another ingredient
        assert_eq!(resolve_value(2, "Protein", &table(), &sel, &custom), 20.0);
    }

    #[test]
    fn test_custom_without_value_is_zero() {
        let mut sel = CellSelections::new();
        sel.insert(CellKey::new(1, "Protein"), ValueKind::Custom);
        let mut custom = CustomValues::new();

        assert_eq!(resolve_value(1, "Protein", &table(), &sel, &custom), 0.0);

        custom.insert(CellKey::new(1, "Protein"), 33.3);
        assert_eq!(resolve_value(1, "Protein", &table(), &sel, &custom), 33.3);
    }

    #[test]
    fn test_scalar_ignores_selection() {
        let mut sel = CellSelections::new();
        sel.insert(CellKey::new(1, "Sugar"), ValueKind::Min);
        assert_eq!(resolve_value(1, "Sugar", &table(), &sel, &CustomValues::new()), 7.0);
    }

    #[test]
    fn test_missing_nutrient_and_empty_cell() {
        let mut t = table();
        t.insert("Iron".into(), NutrientCell::default().into());
        let (sel, custom) = (CellSelections::new(), CustomValues::new());
        assert_eq!(resolve_value(1, "Zinc", &t, &sel, &custom), 0.0);
        assert_eq!(resolve_value(1, "Iron", &t, &sel, &custom), 0.0);
    }
}
