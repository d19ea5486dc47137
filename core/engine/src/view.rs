//! FILENAME: core/engine/src/view.rs
//! PURPOSE: Render-time interpretation of cells.
//! CONTEXT: Rows store raw values. What a renderer needs per cell (shown or
//! hidden, editable or not, display text, validity, option list) depends on
//! the field type, the formulas, the visibility condition and the session
//! role. ViewContext bundles those so the same rules serve both rendering
//! and the edit gate in the store.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::EditError;
use crate::evaluator::{EvalResult, ExpressionCache};
use crate::field_types::{EditContext, FieldBehavior, FieldKind, FieldTypeRegistry};
use crate::header::HeaderLayout;
use crate::pagination::PageInfo;
use crate::schema::{Column, LookupOption, Row};
use crate::value::{format_fixed, is_blank};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellView {
    pub field_id: String,
    pub field_type: String,
    pub kind: FieldKind,
    pub visible: bool,
    pub editable: bool,
    /// Stored value, or the computed value for formula cells.
    pub value: Value,
    pub display: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<LookupOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub index: usize,
    pub selected: bool,
    pub cells: Vec<CellView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub page: PageInfo,
    pub header: HeaderLayout,
    pub rows: Vec<RowView>,
}

/// Everything needed to interpret a cell besides the row itself.
pub struct ViewContext<'a> {
    pub registry: &'a FieldTypeRegistry,
    pub expressions: &'a ExpressionCache,
    pub lookup_options: &'a HashMap<String, Vec<LookupOption>>,
    pub user_role: Option<&'a str>,
}

impl<'a> ViewContext<'a> {
    pub fn edit_context<'c>(&self, column: &'c Column) -> EditContext<'c>
    where
        'a: 'c,
    {
        EditContext::new(column).with_lookup_options(
            self.lookup_options
                .get(&column.field_id)
                .map(Vec::as_slice),
        )
    }

    pub fn behavior(&self, column: &Column) -> &'a dyn FieldBehavior {
        self.registry.resolve(&column.field_type)
    }

    /// The row with formula results filled in, in column order, so a later
    /// formula or a visibility condition can read an earlier formula.
    pub fn derive_row(&self, columns: &[Column], row: &Row) -> Row {
        let mut derived = row.clone();
        for col in columns {
            if self.behavior(col).kind() == FieldKind::Derived {
                let result = self.expressions.formula_value(col, &derived);
                derived.insert(col.field_id.clone(), result.to_json());
            }
        }
        derived
    }

    /// Why an edit of `column` in a row would be refused, if it would.
    /// `derived` is the row as returned by `derive_row`.
    pub fn edit_gate(&self, column: &Column, derived: &Row) -> Result<(), EditError> {
        if column.read_only || self.behavior(column).default_read_only() {
            return Err(EditError::ReadOnly(column.field_id.clone()));
        }
        if !column.permits_role(self.user_role) {
            return Err(EditError::ReadOnly(column.field_id.clone()));
        }
        if !self.expressions.is_visible(column, derived) {
            return Err(EditError::Hidden(column.field_id.clone()));
        }
        Ok(())
    }

    pub fn cell(&self, column: &Column, derived: &Row) -> CellView {
        let behavior = self.behavior(column);
        let ctx = self.edit_context(column);
        let kind = behavior.kind();

        let value = derived.get(&column.field_id).cloned().unwrap_or(Value::Null);
        let display = match kind {
            FieldKind::Derived => derived_display(column, &value),
            _ => behavior.display(&ctx, &value),
        };
        let valid = behavior.is_valid(&ctx, &value) && !(column.required && is_blank(&value));

        CellView {
            field_id: column.field_id.clone(),
            field_type: column.field_type.clone(),
            kind,
            visible: self.expressions.is_visible(column, derived),
            editable: self.edit_gate(column, derived).is_ok(),
            value,
            display,
            valid,
            options: behavior.options(&ctx).to_vec(),
            unit: column.unit.clone(),
        }
    }

    pub fn row(&self, columns: &[Column], index: usize, row: &Row, selected: bool) -> RowView {
        let derived = self.derive_row(columns, row);
        RowView {
            index,
            selected,
            cells: columns.iter().map(|c| self.cell(c, &derived)).collect(),
        }
    }
}

/// Formula results honor `precision` when numeric.
fn derived_display(column: &Column, value: &Value) -> String {
    let result = match value {
        Value::Number(n) => n.as_f64().map_or(EvalResult::Empty, EvalResult::Number),
        Value::String(s) => EvalResult::Text(s.clone()),
        Value::Bool(b) => EvalResult::Boolean(*b),
        _ => EvalResult::Empty,
    };
    match (&result, column.precision) {
        (EvalResult::Number(n), Some(decimals)) => format_fixed(*n, decimals),
        _ => result.as_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValidationRule;
    use serde_json::json;

    struct Fixture {
        registry: FieldTypeRegistry,
        expressions: ExpressionCache,
        options: HashMap<String, Vec<LookupOption>>,
        columns: Vec<Column>,
    }

    impl Fixture {
        fn new(columns: Vec<Column>) -> Self {
            Fixture {
                registry: FieldTypeRegistry::default(),
                expressions: ExpressionCache::for_columns(&columns),
                options: HashMap::new(),
                columns,
            }
        }

        fn ctx(&self, role: Option<&'static str>) -> ViewContext<'_> {
            ViewContext {
                registry: &self.registry,
                expressions: &self.expressions,
                lookup_options: &self.options,
                user_role: role,
            }
        }
    }

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap_or_default()
    }

    fn formula(id: &str, source: &str) -> Column {
        let mut col = Column::new(id, id, "formula");
        col.formula = Some(source.to_string());
        col
    }

    #[test]
    fn test_formula_cell_shows_result() {
        let fx = Fixture::new(vec![
            Column::new("a", "A", "number"),
            Column::new("b", "B", "number"),
            formula("total", "a + b"),
        ]);
        let view = fx.ctx(None).row(&fx.columns, 0, &row(json!({"a": 2, "b": 3})), false);

        assert_eq!(view.cells[2].value, json!(5));
        assert_eq!(view.cells[2].display, "5");
        assert!(!view.cells[2].editable);
    }

    #[test]
    fn test_formulas_chain_in_column_order() {
        let fx = Fixture::new(vec![
            Column::new("qty", "Qty", "number"),
            formula("double", "qty * 2"),
            formula("quad", "double * 2"),
        ]);
        let view = fx.ctx(None).row(&fx.columns, 0, &row(json!({"qty": 3})), false);
        assert_eq!(view.cells[2].value, json!(12));
    }

    #[test]
    fn test_broken_formula_is_empty() {
        let fx = Fixture::new(vec![formula("bad", "a +")]);
        let view = fx.ctx(None).row(&fx.columns, 0, &row(json!({"a": 1})), false);
        assert_eq!(view.cells[0].value, Value::Null);
        assert_eq!(view.cells[0].display, "");
    }

    #[test]
    fn test_hidden_cell_is_not_editable() {
        let mut notes = Column::new("notes", "Notes", "text");
        notes.visibility_condition = Some("status == 'active'".to_string());
        let fx = Fixture::new(vec![Column::new("status", "Status", "text"), notes]);
        let ctx = fx.ctx(None);

        let derived = ctx.derive_row(&fx.columns, &row(json!({"status": "inactive"})));
        let cell = ctx.cell(&fx.columns[1], &derived);
        assert!(!cell.visible);
        assert!(!cell.editable);
        assert_eq!(ctx.edit_gate(&fx.columns[1], &derived), Err(EditError::Hidden("notes".to_string())));
    }

    #[test]
    fn test_role_gate() {
        let mut sign = Column::new("qa_sign", "QA", "signature");
        sign.signed_by_role = vec!["qa".to_string()];
        let fx = Fixture::new(vec![sign]);
        let r = Row::new();

        assert!(fx.ctx(Some("qa")).cell(&fx.columns[0], &r).editable);
        assert!(!fx.ctx(Some("operator")).cell(&fx.columns[0], &r).editable);
        assert!(!fx.ctx(None).cell(&fx.columns[0], &r).editable);
    }

    #[test]
    fn test_number_cell_validity_and_unit() {
        let mut temp = Column::new("temp", "Temp", "number");
        temp.validation = Some(ValidationRule {
            min: Some(0.0),
            max: Some(90.0),
        });
        temp.unit = Some("°C".to_string());
        temp.precision = Some(1);
        let fx = Fixture::new(vec![temp]);

        let cell = fx.ctx(None).cell(&fx.columns[0], &row(json!({"temp": 95})));
        assert!(!cell.valid);
        assert_eq!(cell.display, "95.0");
        assert_eq!(cell.unit.as_deref(), Some("°C"));
    }

    #[test]
    fn test_required_blank_is_invalid() {
        let mut lot = Column::new("lot", "Lot", "text");
        lot.required = true;
        let fx = Fixture::new(vec![lot]);

        assert!(!fx.ctx(None).cell(&fx.columns[0], &Row::new()).valid);
        assert!(fx.ctx(None).cell(&fx.columns[0], &row(json!({"lot": "L-1"}))).valid);
    }

    #[test]
    fn test_lookup_cell_carries_supplied_options() {
        let mut fx = Fixture::new(vec![Column::new("line", "Line", "lookup")]);
        fx.options
            .insert("line".to_string(), vec![LookupOption::new("Line 1", "L1")]);

        let cell = fx.ctx(None).cell(&fx.columns[0], &row(json!({"line": "L1"})));
        assert_eq!(cell.options.len(), 1);
        assert_eq!(cell.display, "Line 1");
    }

    #[test]
    fn test_unknown_type_is_read_only() {
        let fx = Fixture::new(vec![Column::new("x", "X", "hologram")]);
        let cell = fx.ctx(None).cell(&fx.columns[0], &row(json!({"x": "kept"})));
        assert_eq!(cell.kind, FieldKind::Opaque);
        assert!(!cell.editable);
        assert_eq!(cell.display, "kept");
    }
}
