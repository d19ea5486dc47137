//! FILENAME: core/engine/src/structure.rs
//! PURPOSE: Structural Editor - row/column add, remove, merge and split.
//! CONTEXT: Every operation is a pure function from one GridState to the
//! next. Operations that cannot run (too few rows or columns, a blocked row
//! policy, an unknown target) return the input unchanged with an empty
//! Change, so callers can tell a no-op from a commit.
//!
//! TARGET POLICY for merge/split:
//! - Merge uses the two selected rows/columns when exactly two are selected,
//!   otherwise the last two by position.
//! - Split uses the sole selected row/column, otherwise the last one.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::pagination::{clamp_page, page_of};
use crate::schema::{default_row, Column, PaginationConfig, RowControls, RowMode, Row};
use crate::state::GridState;
use crate::value::display_text;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static pattern"));

/// Row limits and pagination settings that shape structural edits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructurePolicy {
    pub row_controls: RowControls,
    pub pagination: PaginationConfig,
}

impl StructurePolicy {
    fn can_grow(&self, row_count: usize) -> bool {
        self.row_controls.mode != RowMode::Fixed
            && self.row_controls.max_rows.map_or(true, |max| row_count < max)
    }

    fn can_shrink(&self, row_count: usize) -> bool {
        self.row_controls.mode != RowMode::Fixed
            && self.row_controls.min_rows.map_or(true, |min| row_count > min)
    }
}

/// What an operation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Change {
    pub rows: bool,
    pub columns: bool,
    /// Row indices now point at different records.
    pub renumbered: bool,
}

impl Change {
    pub const NONE: Change = Change {
        rows: false,
        columns: false,
        renumbered: false,
    };

    pub fn is_none(&self) -> bool {
        *self == Change::NONE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: GridState,
    pub change: Change,
}

impl Transition {
    fn unchanged(state: &GridState, why: &str) -> Self {
        log::debug!("structural edit skipped: {}", why);
        Transition {
            state: state.clone(),
            change: Change::NONE,
        }
    }

    fn committed(state: GridState, change: Change) -> Self {
        Transition { state, change }
    }
}

// ============================================================================
// ROWS
// ============================================================================

/// Appends a record holding only declared defaults. With pagination on, the
/// page cursor moves to the page holding the new row.
pub fn add_row(state: &GridState, policy: &StructurePolicy) -> Transition {
    if !policy.can_grow(state.rows.len()) {
        return Transition::unchanged(state, "row limit or fixed mode blocks add");
    }

    let mut next = state.clone();
    next.rows.push(default_row(&next.columns));
    if policy.pagination.enabled {
        next.page = page_of(&policy.pagination, next.rows.len() - 1);
    }

    Transition::committed(
        next,
        Change {
            rows: true,
            ..Change::NONE
        },
    )
}

/// Deletes one row. Selected indices above it shift down.
pub fn remove_row(state: &GridState, policy: &StructurePolicy, index: usize) -> Transition {
    if index >= state.rows.len() {
        return Transition::unchanged(state, "row index out of range");
    }
    if !policy.can_shrink(state.rows.len()) {
        return Transition::unchanged(state, "row limit or fixed mode blocks remove");
    }

    let mut next = state.clone();
    next.rows.remove(index);
    next.selected_rows = state
        .selected_rows
        .iter()
        .filter(|&&i| i != index)
        .map(|&i| if i > index { i - 1 } else { i })
        .collect();
    next.page = clamp_page(&policy.pagination, next.rows.len(), next.page);

    Transition::committed(
        next,
        Change {
            rows: true,
            renumbered: true,
            ..Change::NONE
        },
    )
}

/// Shallow-merges two rows; the higher index wins on shared keys and the
/// result sits at the lower index.
pub fn merge_rows(state: &GridState, policy: &StructurePolicy) -> Transition {
    let len = state.rows.len();
    if len < 2 {
        return Transition::unchanged(state, "merge needs two rows");
    }
    if !policy.can_shrink(len) {
        return Transition::unchanged(state, "row limit or fixed mode blocks merge");
    }

    let (lo, hi) = match pick_pair(&state.selected_rows.iter().copied().collect::<Vec<_>>(), len) {
        Some(pair) => pair,
        None => (len - 2, len - 1),
    };

    let mut next = state.clone();
    let upper = next.rows.remove(hi);
    let merged = &mut next.rows[lo];
    for (key, value) in upper {
        merged.insert(key, value);
    }
    next.selected_rows.clear();
    next.selected_cols.clear();
    next.page = clamp_page(&policy.pagination, next.rows.len(), next.page);

    Transition::committed(
        next,
        Change {
            rows: true,
            renumbered: true,
            ..Change::NONE
        },
    )
}

/// Duplicates a row directly below itself.
pub fn split_row(state: &GridState, policy: &StructurePolicy) -> Transition {
    let len = state.rows.len();
    if len == 0 {
        return Transition::unchanged(state, "split needs a row");
    }
    if !policy.can_grow(len) {
        return Transition::unchanged(state, "row limit or fixed mode blocks split");
    }

    let index = match single(&state.selected_rows.iter().copied().collect::<Vec<_>>()) {
        Some(i) if i < len => i,
        _ => len - 1,
    };

    let mut next = state.clone();
    let copy = next.rows[index].clone();
    next.rows.insert(index + 1, copy);
    next.selected_rows.clear();
    next.selected_cols.clear();

    Transition::committed(
        next,
        Change {
            rows: true,
            renumbered: true,
            ..Change::NONE
        },
    )
}

// ============================================================================
// COLUMNS
// ============================================================================

/// Field id for a user-supplied label: lower-cased, whitespace runs to `_`.
pub fn field_id_from_label(label: &str) -> String {
    WHITESPACE_RUN
        .replace_all(&label.trim().to_lowercase(), "_")
        .into_owned()
}

/// `base`, or `base_2`, `base_3`, ... whichever is free first.
pub fn unique_field_id(columns: &[Column], base: &str) -> String {
    let taken = |id: &str| columns.iter().any(|c| c.field_id == id);
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Appends a text column and back-fills an empty value in every row.
/// A blank label becomes `Column <n+1>`.
pub fn add_column(state: &GridState, label: &str) -> Transition {
    let label = match label.trim() {
        "" => format!("Column {}", state.columns.len() + 1),
        trimmed => trimmed.to_string(),
    };
    let id = unique_field_id(&state.columns, &field_id_from_label(&label));

    let mut next = state.clone();
    for row in &mut next.rows {
        row.insert(id.clone(), Value::String(String::new()));
    }
    next.columns.push(Column::new(id, label, "text"));

    Transition::committed(
        next,
        Change {
            rows: true,
            columns: true,
            ..Change::NONE
        },
    )
}

/// Deletes a column and strips its values and selection.
pub fn remove_column(state: &GridState, field_id: &str) -> Transition {
    let Some(position) = state.column_index(field_id) else {
        return Transition::unchanged(state, "unknown column");
    };

    let mut next = state.clone();
    next.columns.remove(position);
    for row in &mut next.rows {
        row.remove(field_id);
    }
    next.selected_cols.remove(field_id);

    Transition::committed(
        next,
        Change {
            rows: true,
            columns: true,
            ..Change::NONE
        },
    )
}

/// Folds two columns into the lower one. Values join as `"<a> <b>"`
/// trimmed, the label becomes `"A/B"` and the second field is dropped from
/// every row.
pub fn merge_columns(state: &GridState) -> Transition {
    let len = state.columns.len();
    if len < 2 {
        return Transition::unchanged(state, "merge needs two columns");
    }

    let selected: Vec<usize> = state
        .selected_columns_in_order()
        .iter()
        .filter_map(|id| state.column_index(id))
        .collect();
    let (lo, hi) = pick_pair(&selected, len).unwrap_or((len - 2, len - 1));

    let mut next = state.clone();
    let second = next.columns.remove(hi);
    let first = &mut next.columns[lo];
    first.field_name = format!("{}/{}", first.field_name, second.field_name);
    let keep_id = first.field_id.clone();

    for row in &mut next.rows {
        let a = row.get(&keep_id).map(display_text).unwrap_or_default();
        let b = row.remove(&second.field_id).map(|v| display_text(&v)).unwrap_or_default();
        row.insert(keep_id.clone(), Value::String(format!("{} {}", a, b).trim().to_string()));
    }
    next.selected_rows.clear();
    next.selected_cols.clear();

    Transition::committed(
        next,
        Change {
            rows: true,
            columns: true,
            ..Change::NONE
        },
    )
}

/// Copies a column as `<id>_copy` / `<label> Copy` right after the source.
pub fn split_column(state: &GridState) -> Transition {
    let len = state.columns.len();
    if len == 0 {
        return Transition::unchanged(state, "split needs a column");
    }

    let selected: Vec<usize> = state
        .selected_columns_in_order()
        .iter()
        .filter_map(|id| state.column_index(id))
        .collect();
    let position = single(&selected).unwrap_or(len - 1);

    let source = &state.columns[position];
    let mut copy = source.clone();
    copy.field_id = unique_field_id(&state.columns, &format!("{}_copy", source.field_id));
    copy.field_name = format!("{} Copy", source.field_name);

    let mut next = state.clone();
    for row in &mut next.rows {
        if let Some(value) = row.get(&source.field_id).cloned() {
            row.insert(copy.field_id.clone(), value);
        }
    }
    next.columns.insert(position + 1, copy);
    next.selected_rows.clear();
    next.selected_cols.clear();

    Transition::committed(
        next,
        Change {
            rows: true,
            columns: true,
            ..Change::NONE
        },
    )
}

/// Replaces every row, keeping columns. Selection clears and the page clamps.
pub fn reseed(state: &GridState, policy: &StructurePolicy, rows: Vec<Row>) -> Transition {
    let mut next = state.clone();
    next.rows = rows;
    next.selected_rows.clear();
    next.page = clamp_page(&policy.pagination, next.rows.len(), next.page);

    Transition::committed(
        next,
        Change {
            rows: true,
            renumbered: true,
            ..Change::NONE
        },
    )
}

// ============================================================================
// TARGET SELECTION
// ============================================================================

/// The explicit pair when exactly two valid positions are given.
fn pick_pair(selected: &[usize], len: usize) -> Option<(usize, usize)> {
    match selected {
        [a, b] if *a < len && *b < len && a != b => Some((*a.min(b), *a.max(b))),
        _ => None,
    }
}

fn single(selected: &[usize]) -> Option<usize> {
    match selected {
        [only] => Some(*only),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap_or_default()
    }

    fn grid(rows: Vec<Value>) -> GridState {
        GridState::new(
            vec![Column::new("a", "A", "text"), Column::new("b", "B", "text")],
            rows.into_iter().map(row).collect(),
        )
    }

    fn paged(size: usize) -> StructurePolicy {
        StructurePolicy {
            pagination: PaginationConfig {
                enabled: true,
                rows_per_page: Some(size),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_add_row_uses_defaults_and_jumps_page() {
        let mut state = grid(vec![json!({}); 5]);
        state.columns[0].default_value = Some(json!("x"));

        let t = add_row(&state, &paged(5));
        assert_eq!(t.state.rows.len(), 6);
        assert_eq!(t.state.rows[5], row(json!({"a": "x"})));
        assert_eq!(t.state.page, 1);
        assert!(t.change.rows && !t.change.renumbered);
    }

    #[test]
    fn test_add_then_remove_restores_rows() {
        let state = grid(vec![json!({"a": "1"}), json!({"a": "2"})]);
        let policy = StructurePolicy::default();

        let added = add_row(&state, &policy).state;
        let removed = remove_row(&added, &policy, 2).state;
        assert_eq!(removed.rows, state.rows);
        assert_eq!(removed.page, 0);
    }

    #[test]
    fn test_remove_row_shifts_selection_and_clamps_page() {
        let mut state = grid(vec![json!({}); 12]);
        state.page = 2;
        state.selected_rows = [3, 7, 11].into_iter().collect();
        let policy = paged(5);

        let t = remove_row(&state, &policy, 7);
        assert_eq!(t.state.selected_rows, [3, 10].into_iter().collect());

        let mut s = t.state;
        for _ in 0..2 {
            s = remove_row(&s, &policy, s.rows.len() - 1).state;
        }
        assert_eq!(s.rows.len(), 9);
        assert_eq!(s.page, 1);
    }

    #[test]
    fn test_remove_row_out_of_range_is_noop() {
        let state = grid(vec![json!({})]);
        let t = remove_row(&state, &StructurePolicy::default(), 4);
        assert!(t.change.is_none());
        assert_eq!(t.state, state);
    }

    #[test]
    fn test_row_policy_blocks() {
        let state = grid(vec![json!({}), json!({})]);
        let fixed = StructurePolicy {
            row_controls: RowControls {
                mode: RowMode::Fixed,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(add_row(&state, &fixed).change.is_none());
        assert!(remove_row(&state, &fixed, 0).change.is_none());

        let bounded = StructurePolicy {
            row_controls: RowControls {
                min_rows: Some(2),
                max_rows: Some(2),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(add_row(&state, &bounded).change.is_none());
        assert!(remove_row(&state, &bounded, 0).change.is_none());
        assert!(merge_rows(&state, &bounded).change.is_none());
        assert!(split_row(&state, &bounded).change.is_none());
    }

    #[test]
    fn test_merge_last_two_rows() {
        let state = grid(vec![json!({"x": 0}), json!({"a": 1, "b": 2}), json!({"b": 3, "c": 4})]);
        let t = merge_rows(&state, &StructurePolicy::default());

        assert_eq!(t.state.rows.len(), 2);
        assert_eq!(t.state.rows[1], row(json!({"a": 1, "b": 3, "c": 4})));
        assert!(t.change.renumbered);
    }

    #[test]
    fn test_merge_selected_rows() {
        let mut state = grid(vec![json!({"a": 1, "b": 2}), json!({"m": 0}), json!({"b": 3, "c": 4})]);
        state.selected_rows = [2, 0].into_iter().collect();

        let t = merge_rows(&state, &StructurePolicy::default());
        assert_eq!(t.state.rows, vec![row(json!({"a": 1, "b": 3, "c": 4})), row(json!({"m": 0}))]);
        assert!(t.state.selected_rows.is_empty());
    }

    #[test]
    fn test_merge_with_three_selected_falls_back_to_last_two() {
        let mut state = grid(vec![json!({"i": 0}), json!({"i": 1}), json!({"i": 2})]);
        state.selected_rows = [0, 1, 2].into_iter().collect();

        let t = merge_rows(&state, &StructurePolicy::default());
        assert_eq!(t.state.rows, vec![row(json!({"i": 0})), row(json!({"i": 2}))]);
    }

    #[test]
    fn test_merge_single_row_is_noop() {
        let state = grid(vec![json!({"a": 1})]);
        assert!(merge_rows(&state, &StructurePolicy::default()).change.is_none());
    }

    #[test]
    fn test_split_row() {
        let mut state = grid(vec![json!({"i": 0}), json!({"i": 1}), json!({"i": 2})]);
        let t = split_row(&state, &StructurePolicy::default());
        assert_eq!(t.state.rows.len(), 4);
        assert_eq!(t.state.rows[3], row(json!({"i": 2})));

        state.selected_rows.insert(0);
        let t = split_row(&state, &StructurePolicy::default());
        assert_eq!(t.state.rows[1], row(json!({"i": 0})));
        assert_eq!(t.state.rows[2], row(json!({"i": 1})));
        assert!(t.state.selected_rows.is_empty());
    }

    #[test]
    fn test_split_row_on_empty_is_noop() {
        let state = grid(vec![]);
        assert!(split_row(&state, &StructurePolicy::default()).change.is_none());
    }

    #[test]
    fn test_add_column_generates_id_and_backfills() {
        let state = grid(vec![json!({"a": "1"}), json!({})]);
        let t = add_column(&state, "  Batch   Number ");

        let col = t.state.columns.last().unwrap();
        assert_eq!(col.field_id, "batch_number");
        assert_eq!(col.field_name, "Batch   Number");
        assert_eq!(col.field_type, "text");
        assert!(t.state.rows.iter().all(|r| r.get("batch_number") == Some(&json!(""))));
    }

    #[test]
    fn test_add_column_blank_label_and_collisions() {
        let state = grid(vec![]);
        let t = add_column(&state, "");
        assert_eq!(t.state.columns[2].field_id, "column_3");
        assert_eq!(t.state.columns[2].field_name, "Column 3");

        let t = add_column(&state, "A");
        assert_eq!(t.state.columns[2].field_id, "a_2");
        let t = add_column(&t.state, "a");
        assert_eq!(t.state.columns[3].field_id, "a_3");
    }

    #[test]
    fn test_remove_column_strips_everywhere() {
        let mut state = grid(vec![json!({"a": 1, "b": 2}), json!({"b": 3})]);
        state.selected_cols.insert("b".to_string());

        let t = remove_column(&state, "b");
        assert_eq!(t.state.columns.len(), 1);
        assert!(t.state.rows.iter().all(|r| !r.contains_key("b")));
        assert!(t.state.selected_cols.is_empty());

        assert!(remove_column(&state, "nope").change.is_none());
    }

    #[test]
    fn test_merge_columns() {
        let state = grid(vec![json!({"a": "x", "b": "y"}), json!({"b": 5}), json!({})]);
        let t = merge_columns(&state);

        assert_eq!(t.state.columns.len(), 1);
        assert_eq!(t.state.columns[0].field_id, "a");
        assert_eq!(t.state.columns[0].field_name, "A/B");
        assert_eq!(t.state.rows[0], row(json!({"a": "x y"})));
        assert_eq!(t.state.rows[1], row(json!({"a": "5"})));
        assert_eq!(t.state.rows[2], row(json!({"a": ""})));
    }

    #[test]
    fn test_merge_selected_columns_keeps_lower_position() {
        let mut state = grid(vec![json!({"a": "1", "b": "2", "c": "3"})]);
        state.columns.push(Column::new("c", "C", "number"));
        state.selected_cols = ["c", "a"].iter().map(|s| s.to_string()).collect();

        let t = merge_columns(&state);
        let ids: Vec<&str> = t.state.columns.iter().map(|c| c.field_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(t.state.columns[0].field_name, "A/C");
        assert_eq!(t.state.rows[0], row(json!({"a": "1 3", "b": "2"})));
    }

    #[test]
    fn test_merge_single_column_is_noop() {
        let mut state = grid(vec![]);
        state.columns.truncate(1);
        assert!(merge_columns(&state).change.is_none());
    }

    #[test]
    fn test_split_column() {
        let mut state = grid(vec![json!({"a": "1", "b": "2"})]);
        state.selected_cols.insert("a".to_string());

        let t = split_column(&state);
        let ids: Vec<&str> = t.state.columns.iter().map(|c| c.field_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a_copy", "b"]);
        assert_eq!(t.state.columns[1].field_name, "A Copy");
        assert_eq!(t.state.rows[0]["a_copy"], json!("1"));

        // Splitting the same source again avoids the taken id
        let mut again = t.state.clone();
        again.selected_cols.insert("a".to_string());
        let t2 = split_column(&again);
        assert_eq!(t2.state.columns[1].field_id, "a_copy_2");
    }

    #[test]
    fn test_split_last_column_by_default() {
        let state = grid(vec![json!({"b": true})]);
        let t = split_column(&state);
        assert_eq!(t.state.columns[2].field_id, "b_copy");
        assert_eq!(t.state.rows[0]["b_copy"], json!(true));
    }

    #[test]
    fn test_reseed_clamps_and_clears_selection() {
        let mut state = grid(vec![json!({}); 12]);
        state.page = 2;
        state.selected_rows.insert(11);

        let t = reseed(&state, &paged(5), vec![Row::new(); 3]);
        assert_eq!(t.state.page, 0);
        assert!(t.state.selected_rows.is_empty());
        assert!(t.change.renumbered);
    }
}
