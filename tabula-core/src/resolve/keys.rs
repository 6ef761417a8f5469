use tabula_types::{DiagnosticKind, Diagnostics, MappingContext, ParameterMap, Row, Value};

use crate::schema::FieldKind;

/// Outcome of a field lookup. Absence is explicit and never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Value found in the record.
    Scalar(Value),
    /// Name of the timeseries column the field refers to.
    SequenceRef(String),
    /// Built-in default for a field missing from the record.
    Default(Value),
    /// Nothing found.
    Absent,
}

impl Lookup {
    /// The looked-up value, `None` when absent.
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Scalar(v) | Self::Default(v) => Some(v),
            Self::SequenceRef(column) => Some(Value::Str(column)),
            Self::Absent => None,
        }
    }

    /// True when nothing was found.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

fn builtin_default(logical: &str) -> Option<Value> {
    match logical {
        "marginal_cost" => Some(Value::Float(0.0)),
        "expandable" => Some(Value::Bool(false)),
        _ => None,
    }
}

/// Maps logical field names onto source columns for one process.
#[derive(Debug, Clone, Copy)]
pub struct KeyResolver<'a> {
    parameter_map: &'a ParameterMap,
    ctx: MappingContext<'a>,
    sequence_columns: &'a [String],
}

impl<'a> KeyResolver<'a> {
    /// Resolver over `parameter_map` for the scopes in `ctx`, aware of the
    /// process' timeseries columns.
    #[must_use]
    pub const fn new(
        parameter_map: &'a ParameterMap,
        ctx: MappingContext<'a>,
        sequence_columns: &'a [String],
    ) -> Self {
        Self {
            parameter_map,
            ctx,
            sequence_columns,
        }
    }

    /// The mapping context used for scope lookups.
    #[must_use]
    pub const fn context(&self) -> MappingContext<'a> {
        self.ctx
    }

    fn physical<'k>(&self, logical: &'k str) -> &'k str
    where
        'a: 'k,
    {
        self.parameter_map
            .lookup(logical, &self.ctx)
            .map_or(logical, |(target, _)| target)
    }

    /// Physical column name of `logical`.
    ///
    /// Unmapped keys resolve to themselves and record a debug diagnostic.
    pub fn resolve<'k>(&self, logical: &'k str, diags: &mut Diagnostics) -> &'k str
    where
        'a: 'k,
    {
        if let Some((target, _)) = self.parameter_map.lookup(logical, &self.ctx) {
            return target;
        }
        diags.push(
            DiagnosticKind::UnmappedKey,
            format!("'{logical}' is not mapped; using it verbatim"),
        );
        logical
    }

    /// Look up `logical` in `row`.
    ///
    /// Order: a non-missing record value, then (for sequence-like fields)
    /// the `<physical>_<region>` timeseries column, then (for profiles
    /// only) the single available column, then the built-in defaults.
    pub fn get(
        &self,
        row: &Row,
        logical: &str,
        kind: FieldKind,
        diags: &mut Diagnostics,
    ) -> Lookup {
        let physical = self.resolve(logical, diags);
        if let Some(v) = row.get(physical).filter(|v| !v.is_missing()) {
            return Lookup::Scalar(v.clone());
        }
        if kind.is_sequence_like() {
            if let Some(column) = self.sequence_column(row, physical, kind, diags) {
                return Lookup::SequenceRef(column);
            }
        }
        builtin_default(logical).map_or(Lookup::Absent, Lookup::Default)
    }

    fn sequence_column(
        &self,
        row: &Row,
        physical: &str,
        kind: FieldKind,
        diags: &mut Diagnostics,
    ) -> Option<String> {
        let region = row.get(self.physical("region")).and_then(Value::key_part);
        if let Some(region) = region {
            let candidate = format!("{physical}_{region}");
            if self.sequence_columns.iter().any(|c| *c == candidate) {
                return Some(candidate);
            }
        }
        if let ([only], true) = (self.sequence_columns, kind.accepts_single_column()) {
            diags.push(
                DiagnosticKind::SequenceFallback,
                format!("'{physical}' has no matching timeseries column; using the only column '{only}'"),
            );
            return Some(only.clone());
        }
        None
    }
}
