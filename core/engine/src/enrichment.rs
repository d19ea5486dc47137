//! FILENAME: core/engine/src/enrichment.rs
//! PURPOSE: Enrichment Dispatcher - plans lookups and decides which late
//! responses may still be applied.
//! CONTEXT: An accepted edit to a field that some column names as its
//! `bind_field` produces one request per such column. The engine never does
//! I/O: the host runs the requests and hands each response back with the
//! ticket it was issued.
//!
//! STALE RESPONSES:
//! Requests can complete out of order. Every ticket carries a sequence number
//! and the epoch it was issued in. Only the most recent sequence for a
//! (row, target field) pair is current; a direct edit of the target field
//! supersedes any outstanding request for it, and operations that renumber
//! rows start a new epoch so no older ticket matches anything.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::Column;
use crate::value::{display_text, format_number};

/// Identifies one outstanding lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnrichmentTicket {
    pub row: usize,
    /// Column that receives the response.
    pub field_id: String,
    pub sequence: u64,
    pub epoch: u64,
}

/// A lookup for the host to perform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRequest {
    pub ticket: EnrichmentTicket,
    pub endpoint: String,
    /// Field whose edit triggered the lookup.
    pub source_field: String,
    /// Text sent as the single `value` query parameter.
    pub query_value: String,
}

#[derive(Debug, Default)]
pub struct EnrichmentSequencer {
    epoch: u64,
    next_sequence: u64,
    latest: HashMap<(usize, String), u64>,
}

impl EnrichmentSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self, row: usize, field_id: &str) -> u64 {
        self.next_sequence += 1;
        self.latest.insert((row, field_id.to_string()), self.next_sequence);
        self.next_sequence
    }

    /// Issues a ticket that supersedes every earlier one for the same cell.
    pub fn issue(&mut self, row: usize, field_id: &str) -> EnrichmentTicket {
        let sequence = self.bump(row, field_id);
        EnrichmentTicket {
            row,
            field_id: field_id.to_string(),
            sequence,
            epoch: self.epoch,
        }
    }

    /// A direct edit of the target cell makes any pending response stale.
    pub fn supersede(&mut self, row: usize, field_id: &str) {
        if self.latest.contains_key(&(row, field_id.to_string())) {
            self.bump(row, field_id);
        }
    }

    pub fn is_current(&self, ticket: &EnrichmentTicket) -> bool {
        ticket.epoch == self.epoch
            && self
                .latest
                .get(&(ticket.row, ticket.field_id.clone()))
                .map_or(false, |&seq| seq == ticket.sequence)
    }

    /// Marks a ticket as consumed so the same response cannot apply twice.
    pub fn retire(&mut self, ticket: &EnrichmentTicket) {
        if self.is_current(ticket) {
            self.latest.remove(&(ticket.row, ticket.field_id.clone()));
        }
    }

    /// Rows were renumbered; nothing outstanding may apply anymore.
    pub fn invalidate_all(&mut self) {
        if !self.latest.is_empty() {
            log::debug!("dropping {} outstanding enrichment tickets", self.latest.len());
        }
        self.epoch += 1;
        self.latest.clear();
    }

    /// Drops tickets whose target column no longer exists, so a column later
    /// re-added under the same id cannot receive them.
    pub fn retain_fields(&mut self, keep: impl Fn(&str) -> bool) {
        self.latest.retain(|(_, field_id), _| keep(field_id));
    }

    /// Number of cells with a lookup still in flight.
    pub fn pending(&self) -> usize {
        self.latest.len()
    }
}

/// One request per column bound to `source_field`, in column order.
pub fn plan_requests(
    sequencer: &mut EnrichmentSequencer,
    columns: &[Column],
    row: usize,
    source_field: &str,
    value: &Value,
) -> Vec<EnrichmentRequest> {
    columns
        .iter()
        .filter(|col| col.is_enriched_from(source_field))
        .filter_map(|col| {
            let endpoint = col.endpoint.as_deref()?.trim().to_string();
            Some(EnrichmentRequest {
                ticket: sequencer.issue(row, &col.field_id),
                endpoint,
                source_field: source_field.to_string(),
                query_value: query_value(value),
            })
        })
        .collect()
}

/// String form of an edited value for the query parameter. Follows the
/// usual script conventions: `null`, `true`, `2`, `2.5`.
pub fn query_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        other => display_text(other),
    }
}

/// Extracts the value to store from a lookup response body: either
/// `{"value": <scalar>}` or a bare scalar. Anything else yields nothing.
pub fn parse_lookup_response(body: &Value) -> Option<Value> {
    let candidate = match body {
        Value::Object(obj) => obj.get("value")?,
        other => other,
    };
    match candidate {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Some(candidate.clone()),
        _ => None,
    }
}
