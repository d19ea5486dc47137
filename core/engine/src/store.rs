//! FILENAME: core/engine/src/store.rs
//! PURPOSE: Grid State Store - the single owner of grid state.
//! CONTEXT: Every read and every mutation of the grid goes through GridStore.
//! It holds the schema, the field type registry, compiled expressions, the
//! session role and lookup options, the current GridState, the enrichment
//! sequencer, undo history and change listeners. Mutations are synchronous;
//! lookups are returned to the caller as requests and come back through
//! `apply_enrichment`.

use serde_json::Value;
use std::collections::HashMap;

use crate::enrichment::{parse_lookup_response, plan_requests, EnrichmentRequest, EnrichmentSequencer, EnrichmentTicket};
use crate::error::EditError;
use crate::evaluator::ExpressionCache;
use crate::field_types::FieldTypeRegistry;
use crate::header::{build_header_layout, HeaderLayout};
use crate::history::History;
use crate::pagination::{clamp_page, page_info, visible_range, PageInfo};
use crate::schema::{Column, LookupOption, Row, Schema};
use crate::state::GridState;
use crate::structure::{self, StructurePolicy, Transition};
use crate::view::{CellView, PageView, RowView, ViewContext};

/// Receives the full row collection after every change to it.
pub type ChangeListener = Box<dyn Fn(&[Row]) + Send + Sync>;

pub struct GridStore {
    schema: Schema,
    registry: FieldTypeRegistry,
    expressions: ExpressionCache,
    header: HeaderLayout,
    lookup_options: HashMap<String, Vec<LookupOption>>,
    user_role: Option<String>,
    external_data: Vec<Row>,
    state: GridState,
    sequencer: EnrichmentSequencer,
    history: History,
    listeners: Vec<ChangeListener>,
}

impl GridStore {
    pub fn new(schema: Schema) -> Self {
        Self::with_registry(schema, FieldTypeRegistry::with_builtin_types())
    }

    /// A store using a custom set of field types.
    pub fn with_registry(schema: Schema, registry: FieldTypeRegistry) -> Self {
        let mut store = GridStore {
            schema: Schema::default(),
            registry,
            expressions: ExpressionCache::default(),
            header: HeaderLayout::default(),
            lookup_options: HashMap::new(),
            user_role: None,
            external_data: Vec::new(),
            state: GridState::default(),
            sequencer: EnrichmentSequencer::new(),
            history: History::new(),
            listeners: Vec::new(),
        };
        store.install_schema(schema);
        store
    }

    // ========================================================================
    // SESSION INPUTS
    // ========================================================================

    /// Replaces the schema: columns reset and rows re-seed.
    pub fn load_schema(&mut self, schema: Schema) {
        self.install_schema(schema);
        self.notify();
    }

    fn install_schema(&mut self, schema: Schema) {
        let rows = schema.seed_rows(&self.external_data);
        log::info!(
            "loading schema: {} columns, {} rows",
            schema.columns.len(),
            rows.len()
        );

        self.state = GridState::new(schema.columns.clone(), rows);
        self.schema = schema;
        self.history.clear();
        self.sequencer.invalidate_all();
        self.refresh_columns();
    }

    /// Replaces the rows with host-supplied data. Empty data re-seeds from
    /// the schema's preload rows or defaults.
    pub fn set_external_data(&mut self, rows: Vec<Row>) {
        self.external_data = rows;
        let seeded = self.schema.seed_rows(&self.external_data);
        let t = structure::reseed(&self.state, &self.policy(), seeded);
        self.state = t.state;
        self.history.clear();
        self.sequencer.invalidate_all();
        self.notify();
    }

    pub fn set_lookup_options(&mut self, options: HashMap<String, Vec<LookupOption>>) {
        self.lookup_options = options;
    }

    pub fn set_user_role(&mut self, role: Option<String>) {
        self.user_role = role.filter(|r| !r.is_empty());
    }

    pub fn subscribe(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    // ========================================================================
    // CELL EDITS & ENRICHMENT
    // ========================================================================

    /// Applies one user edit. On success returns the lookups the edit
    /// triggered, for the host to run.
    pub fn update_cell(&mut self, row: usize, field_id: &str, raw: Value) -> Result<Vec<EnrichmentRequest>, EditError> {
        let result = self.try_update_cell(row, field_id, raw);
        if let Err(e) = &result {
            log::debug!("edit of row {} field '{}' rejected: {}", row, field_id, e);
        }
        result
    }

    fn try_update_cell(&mut self, row: usize, field_id: &str, raw: Value) -> Result<Vec<EnrichmentRequest>, EditError> {
        let record = self.state.rows.get(row).ok_or(EditError::RowOutOfRange(row))?;
        let column = self
            .state
            .column(field_id)
            .ok_or_else(|| EditError::UnknownField(field_id.to_string()))?;

        let ctx = self.view_context();
        let derived = ctx.derive_row(&self.state.columns, record);
        ctx.edit_gate(column, &derived)?;
        let value = ctx.behavior(column).coerce(&ctx.edit_context(column), &raw)?;

        if record.get(field_id) == Some(&value) {
            return Ok(Vec::new());
        }

        self.history.record(format!("Edit {}", field_id), self.state.clone());
        self.state.rows[row].insert(field_id.to_string(), value.clone());
        self.sequencer.supersede(row, field_id);

        let requests = plan_requests(&mut self.sequencer, &self.state.columns, row, field_id, &value);
        self.notify();
        Ok(requests)
    }

    /// Writes a lookup result if its ticket is still current and both the
    /// row and the target column still exist. Returns whether it applied.
    /// Applied results never trigger further lookups.
    pub fn apply_enrichment(&mut self, ticket: &EnrichmentTicket, value: Value) -> bool {
        if !self.sequencer.is_current(ticket) {
            log::debug!(
                "discarding stale lookup for row {} field '{}' (seq {})",
                ticket.row,
                ticket.field_id,
                ticket.sequence
            );
            return false;
        }
        if ticket.row >= self.state.rows.len() || !self.state.has_column(&ticket.field_id) {
            log::debug!("discarding lookup for missing row {} or field '{}'", ticket.row, ticket.field_id);
            self.sequencer.retire(ticket);
            return false;
        }

        self.sequencer.retire(ticket);
        self.state.rows[ticket.row].insert(ticket.field_id.clone(), value);
        self.notify();
        true
    }

    /// `apply_enrichment` for a raw response body.
    pub fn apply_lookup_response(&mut self, ticket: &EnrichmentTicket, body: &Value) -> bool {
        match parse_lookup_response(body) {
            Some(value) => self.apply_enrichment(ticket, value),
            None => {
                log::debug!("lookup response for '{}' has no usable value; ignored", ticket.field_id);
                self.sequencer.retire(ticket);
                false
            }
        }
    }

    /// Drops a ticket whose request failed.
    pub fn abandon_enrichment(&mut self, ticket: &EnrichmentTicket) {
        self.sequencer.retire(ticket);
    }

    pub fn pending_enrichments(&self) -> usize {
        self.sequencer.pending()
    }

    // ========================================================================
    // STRUCTURAL EDITS
    // ========================================================================

    pub fn add_row(&mut self) -> bool {
        let t = structure::add_row(&self.state, &self.policy());
        self.commit("Add row", t)
    }

    pub fn remove_row(&mut self, index: usize) -> bool {
        let t = structure::remove_row(&self.state, &self.policy(), index);
        self.commit("Remove row", t)
    }

    pub fn add_column(&mut self, label: &str) -> bool {
        let t = structure::add_column(&self.state, label);
        self.commit("Add column", t)
    }

    pub fn remove_column(&mut self, field_id: &str) -> bool {
        let t = structure::remove_column(&self.state, field_id);
        self.commit("Remove column", t)
    }

    pub fn merge_rows(&mut self) -> bool {
        let t = structure::merge_rows(&self.state, &self.policy());
        self.commit("Merge rows", t)
    }

    pub fn split_row(&mut self) -> bool {
        let t = structure::split_row(&self.state, &self.policy());
        self.commit("Split row", t)
    }

    pub fn merge_columns(&mut self) -> bool {
        let t = structure::merge_columns(&self.state);
        self.commit("Merge columns", t)
    }

    pub fn split_column(&mut self) -> bool {
        let t = structure::split_column(&self.state);
        self.commit("Split column", t)
    }

    fn commit(&mut self, description: &str, transition: Transition) -> bool {
        let Transition { state, change } = transition;
        if change.is_none() {
            return false;
        }

        let before = std::mem::replace(&mut self.state, state);
        self.history.record(description, before);

        if change.renumbered {
            self.sequencer.invalidate_all();
        }
        if change.columns {
            let state = &self.state;
            self.sequencer.retain_fields(|id| state.has_column(id));
            self.refresh_columns();
        }
        if change.rows {
            self.notify();
        }
        true
    }

    // ========================================================================
    // SELECTION & PAGING
    // ========================================================================

    pub fn toggle_row_selection(&mut self, index: usize) -> bool {
        self.state.toggle_row_selection(index)
    }

    pub fn toggle_column_selection(&mut self, field_id: &str) -> bool {
        self.state.toggle_column_selection(field_id)
    }

    pub fn clear_selection(&mut self) {
        self.state.clear_selection();
    }

    /// Moves to `page`, clamped to the available pages.
    pub fn set_page(&mut self, page: usize) -> usize {
        self.state.page = clamp_page(&self.schema.pagination, self.state.rows.len(), page);
        self.state.page
    }

    pub fn next_page(&mut self) -> usize {
        self.set_page(self.state.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> usize {
        self.set_page(self.state.page.saturating_sub(1))
    }

    // ========================================================================
    // HISTORY
    // ========================================================================

    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.state.clone()) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.state.clone()) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn restore(&mut self, state: GridState) {
        let columns_changed = state.columns != self.state.columns;
        self.state = state;
        self.sequencer.invalidate_all();
        if columns_changed {
            self.refresh_columns();
        }
        self.notify();
    }

    // ========================================================================
    // READ-ONLY VIEWS
    // ========================================================================

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub fn rows(&self) -> &[Row] {
        &self.state.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.state.columns
    }

    pub fn user_role(&self) -> Option<&str> {
        self.user_role.as_deref()
    }

    pub fn header_layout(&self) -> &HeaderLayout {
        &self.header
    }

    pub fn page_info(&self) -> PageInfo {
        page_info(&self.schema.pagination, self.state.rows.len(), self.state.page)
    }

    pub fn visible_rows(&self) -> &[Row] {
        let range = visible_range(&self.schema.pagination, self.state.rows.len(), self.state.page);
        &self.state.rows[range]
    }

    pub fn cell_view(&self, row: usize, field_id: &str) -> Option<CellView> {
        let record = self.state.rows.get(row)?;
        let column = self.state.column(field_id)?;
        let ctx = self.view_context();
        let derived = ctx.derive_row(&self.state.columns, record);
        Some(ctx.cell(column, &derived))
    }

    pub fn row_view(&self, index: usize) -> Option<RowView> {
        let record = self.state.rows.get(index)?;
        let selected = self.state.selected_rows.contains(&index);
        Some(self.view_context().row(&self.state.columns, index, record, selected))
    }

    /// Header, pager and the interpreted cells of the current page.
    pub fn page_view(&self) -> PageView {
        let info = self.page_info();
        let ctx = self.view_context();
        let rows = (info.start..info.end)
            .map(|i| {
                let selected = self.state.selected_rows.contains(&i);
                ctx.row(&self.state.columns, i, &self.state.rows[i], selected)
            })
            .collect();

        PageView {
            page: info,
            header: self.header.clone(),
            rows,
        }
    }

    /// Rows with formula results written in, for export.
    pub fn materialized_rows(&self) -> Vec<Row> {
        let ctx = self.view_context();
        self.state
            .rows
            .iter()
            .map(|r| ctx.derive_row(&self.state.columns, r))
            .collect()
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn policy(&self) -> StructurePolicy {
        StructurePolicy {
            row_controls: self.schema.row_controls.clone(),
            pagination: self.schema.pagination,
        }
    }

    fn view_context(&self) -> ViewContext<'_> {
        ViewContext {
            registry: &self.registry,
            expressions: &self.expressions,
            lookup_options: &self.lookup_options,
            user_role: self.user_role.as_deref(),
        }
    }

    fn refresh_columns(&mut self) {
        self.expressions.refresh(&self.state.columns);
        self.header = build_header_layout(self.schema.header_structure.as_deref(), &self.state.columns);
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener(&self.state.rows);
        }
    }
}
