//! The `datapackage.json` manifest.

use serde::{Deserialize, Serialize};
use tabula_core::{ForeignKey, sequence_resource};
use tabula_types::{Row, Value};

use crate::package::DataPackage;
use crate::write::{
    BUS_RESOURCE_FILE, ELEMENTS_DIR, PERIODS_DIR, SEQUENCES_DIR, TIMEINDEX, TSAM_DIR,
};

const PACKAGE_PROFILE: &str = "tabular-data-package";
const RESOURCE_PROFILE: &str = "tabular-data-resource";

/// One column of a resource schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Column name.
    pub name: String,
    /// Inferred column type.
    #[serde(rename = "type")]
    pub kind: String,
}

impl Field {
    fn new(name: impl Into<String>, kind: &str) -> Self {
        Self {
            name: name.into(),
            kind: kind.to_string(),
        }
    }
}

/// Table schema of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Columns in file order.
    pub fields: Vec<Field>,
    /// Primary key column.
    #[serde(rename = "primaryKey", default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// Links to other resources.
    #[serde(rename = "foreignKeys", default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

/// One file of the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource name, unique within the package.
    pub name: String,
    /// Path relative to the package root.
    pub path: String,
    /// Frictionless resource profile.
    pub profile: String,
    /// Table schema.
    pub schema: TableSchema,
}

/// Package descriptor listing every resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Package name.
    pub name: String,
    /// Frictionless package profile.
    pub profile: String,
    /// Resources in write order.
    pub resources: Vec<Resource>,
}

impl Manifest {
    /// Describe every table of `package`.
    ///
    /// Element tables use `name` as primary key and carry their foreign
    /// keys; the bus table uses `name` as primary key; sequence, period and
    /// parameter tables have no key.
    #[must_use]
    pub fn from_package(package: &DataPackage) -> Self {
        let mut resources = Vec::new();
        for (facade, table) in &package.elements {
            let fields = table
                .column_names()
                .into_iter()
                .map(|c| {
                    let kind = infer_type(table.rows.iter().filter_map(|r| r.get(&c)));
                    Field::new(c, kind)
                })
                .collect();
            resources.push(resource(
                facade,
                format!("{ELEMENTS_DIR}/{facade}.csv"),
                TableSchema {
                    fields,
                    primary_key: Some("name".to_string()),
                    foreign_keys: table.foreign_keys.clone(),
                },
            ));
        }

        if !package.busses.is_empty() {
            resources.push(resource(
                "bus",
                format!("{ELEMENTS_DIR}/{BUS_RESOURCE_FILE}"),
                TableSchema {
                    fields: vec![
                        Field::new("name", "string"),
                        Field::new("type", "string"),
                        Field::new("balanced", "boolean"),
                    ],
                    primary_key: Some("name".to_string()),
                    foreign_keys: Vec::new(),
                },
            ));
        }

        for (process, table) in &package.sequences {
            let name = sequence_resource(process);
            let fields = std::iter::once(Field::new(TIMEINDEX, "datetime"))
                .chain(table.column_names().into_iter().map(|c| Field::new(c, "number")))
                .collect();
            resources.push(resource(
                &name,
                format!("{SEQUENCES_DIR}/{name}.csv"),
                keyless(fields),
            ));
        }

        if !package.periods.is_empty() {
            resources.push(resource(
                "periods",
                format!("{PERIODS_DIR}/periods.csv"),
                keyless(vec![
                    Field::new(TIMEINDEX, "datetime"),
                    Field::new("periods", "integer"),
                    Field::new("timeincrement", "number"),
                ]),
            ));
        }

        if !package.tsa_parameters.is_empty() {
            let rows: Vec<Row> = package.tsa_parameters.iter().map(|p| p.to_row()).collect();
            let fields = rows
                .first()
                .map(|first| {
                    first
                        .keys()
                        .map(|k| Field::new(k.clone(), infer_type(rows.iter().filter_map(|r| r.get(k)))))
                        .collect()
                })
                .unwrap_or_default();
            resources.push(resource(
                "tsa_parameters",
                format!("{TSAM_DIR}/tsa_parameters.csv"),
                keyless(fields),
            ));
        }

        Self {
            name: package.name.clone(),
            profile: PACKAGE_PROFILE.to_string(),
            resources,
        }
    }

    /// Resource by name.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }
}

fn resource(name: &str, path: String, schema: TableSchema) -> Resource {
    Resource {
        name: name.to_string(),
        path,
        profile: RESOURCE_PROFILE.to_string(),
        schema,
    }
}

const fn keyless(fields: Vec<Field>) -> TableSchema {
    TableSchema {
        fields,
        primary_key: None,
        foreign_keys: Vec::new(),
    }
}

/// Column type from its non-missing cells.
///
/// Integers mixed with floats are `number`; any other mix, or a column
/// without values, is `string`.
fn infer_type<'a>(cells: impl Iterator<Item = &'a Value>) -> &'static str {
    let mut kind: Option<&'static str> = None;
    for cell in cells.filter(|c| !c.is_missing()) {
        let label = cell.type_label();
        kind = Some(match kind {
            None => label,
            Some(k) if k == label => k,
            Some("integer" | "number") if matches!(label, "integer" | "number") => "number",
            Some(_) => return "string",
        });
    }
    kind.unwrap_or("string")
}
