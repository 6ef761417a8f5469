//! Foreign keys linking element columns to the bus and sequence tables.

use serde::{Deserialize, Serialize};
use tabula_types::{DiagnosticKind, Diagnostics, Row, Value};

use crate::resolve::busses::ResolvedBusses;
use crate::schema::FacadeSchema;

/// Resource name of the bus table.
pub const BUS_RESOURCE: &str = "bus";

/// Target of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Referenced resource.
    pub resource: String,
    /// Referenced field, if not the resource's primary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

/// `{fields, reference: {resource, fields}}` as written to the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Referencing column of the element table.
    pub fields: String,
    /// Referenced resource.
    pub reference: Reference,
}

impl ForeignKey {
    /// Key from a bus role column to the bus table's `name`.
    pub fn bus(field: impl Into<String>) -> Self {
        Self {
            fields: field.into(),
            reference: Reference {
                resource: BUS_RESOURCE.to_string(),
                fields: Some("name".to_string()),
            },
        }
    }

    /// Key from a sequence column to the process' sequence table.
    pub fn sequence(field: impl Into<String>, process: &str) -> Self {
        Self {
            fields: field.into(),
            reference: Reference {
                resource: sequence_resource(process),
                fields: None,
            },
        }
    }
}

/// Resource name of a process' sequence table.
#[must_use]
pub fn sequence_resource(process: &str) -> String {
    format!("{process}_sequence")
}

/// Foreign keys of one process' element rows.
///
/// Every resolved bus role references the bus table. A sequence field whose
/// text values all name existing sequence columns references the process'
/// sequence table; if only some do, the key is still emitted together with a
/// warning; if none do, no key is emitted.
pub fn derive(
    schema: &FacadeSchema,
    busses: &ResolvedBusses,
    rows: &[Row],
    sequence_columns: &[String],
    process: &str,
    diags: &mut Diagnostics,
) -> Vec<ForeignKey> {
    let mut keys: Vec<ForeignKey> = busses.keys().map(ForeignKey::bus).collect();

    for field in schema.sequence_fields() {
        let present: Vec<&Value> = rows
            .iter()
            .filter_map(|r| r.get(field))
            .filter(|v| !v.is_missing())
            .collect();
        if !present.iter().any(|v| v.as_str().is_some()) {
            continue;
        }
        let matching = present
            .iter()
            .filter(|v| {
                v.as_str()
                    .is_some_and(|s| sequence_columns.iter().any(|c| c == s))
            })
            .count();
        if matching == 0 {
            continue;
        }
        if matching < present.len() {
            diags.push(
                DiagnosticKind::PartialSequenceMatch,
                format!(
                    "'{field}' references sequence columns in {matching} of {} rows",
                    present.len()
                ),
            );
        }
        keys.push(ForeignKey::sequence(field, process));
    }

    let mut unique: Vec<ForeignKey> = Vec::with_capacity(keys.len());
    for k in keys {
        if !unique.contains(&k) {
            unique.push(k);
        }
    }
    unique
}
