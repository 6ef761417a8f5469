//! Builds canonical component records from source rows.

use std::collections::{HashMap, HashSet};

use tabula_types::{AdapterError, CalculationMode, DiagnosticKind, Diagnostics, Row, Value};

use crate::calculations::{capacity_cost, decommission, floor_lifetime};
use crate::resolve::busses::ResolvedBusses;
use crate::resolve::keys::KeyResolver;
use crate::schema::{FacadeSchema, FieldKind};

/// Separator used when joining identity parts into a component name.
pub const NAME_SEPARATOR: &str = "_";

/// Hands out unique component names, appending `_<n>` on collision.
#[derive(Debug, Clone, Default)]
pub struct NameCounter {
    taken: HashSet<String>,
    next: HashMap<String, usize>,
}

impl NameCounter {
    /// Empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `base`, or the first free `base_<n>` if it is taken.
    pub fn claim(&mut self, base: &str, diags: &mut Diagnostics) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let n = self.next.entry(base.to_string()).or_insert(1);
        loop {
            let candidate = format!("{base}{NAME_SEPARATOR}{n}");
            *n += 1;
            if self.taken.insert(candidate.clone()) {
                diags.push(
                    DiagnosticKind::NameCollision,
                    format!("name '{base}' already used; renamed to '{candidate}'"),
                );
                return candidate;
            }
        }
    }

    /// True if `name` was already handed out.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }
}

/// Builds field maps of one facade type for one process.
#[derive(Debug, Clone)]
pub struct ComponentBuilder<'a> {
    schema: &'static FacadeSchema,
    keys: KeyResolver<'a>,
    busses: ResolvedBusses,
    mode: CalculationMode,
}

impl<'a> ComponentBuilder<'a> {
    /// Builder for `schema` using the given key resolver and the busses
    /// already resolved for the process.
    #[must_use]
    pub const fn new(
        schema: &'static FacadeSchema,
        keys: KeyResolver<'a>,
        busses: ResolvedBusses,
        mode: CalculationMode,
    ) -> Self {
        Self {
            schema,
            keys,
            busses,
            mode,
        }
    }

    /// Schema this builder produces.
    #[must_use]
    pub const fn schema(&self) -> &'static FacadeSchema {
        self.schema
    }

    /// Busses resolved for the process.
    #[must_use]
    pub const fn busses(&self) -> &ResolvedBusses {
        &self.busses
    }

    /// Build one component field map from a source row.
    ///
    /// Schema fields are resolved through the key resolver and left out when
    /// absent; bus roles come from the resolved busses. Then the name is
    /// derived and claimed, `capacity_cost` is derived if not given,
    /// decommissioning is applied and `lifetime` is floored.
    ///
    /// # Errors
    /// In strict mode, returns `AdapterError::Calculation` when a derived
    /// field cannot be computed.
    pub fn build(
        &self,
        row: &Row,
        names: &mut NameCounter,
        diags: &mut Diagnostics,
    ) -> Result<Row, AdapterError> {
        let mut out = Row::with_capacity(self.schema.fields.len());
        out.insert("name".to_string(), Value::Null);
        out.insert("type".to_string(), Value::from(self.schema.facade));
        for spec in self.schema.fields {
            match (spec.name, spec.kind) {
                ("name" | "type", _) => {}
                (role, FieldKind::Bus) => {
                    if let Some(bus) = self.busses.get(role) {
                        out.insert(role.to_string(), Value::from(bus.as_str()));
                    }
                }
                (name, kind) => {
                    if let Some(v) = self.keys.get(row, name, kind, diags).into_value() {
                        out.insert(name.to_string(), v);
                    }
                }
            }
        }

        let base = self.base_name(row, &out, diags);
        out.insert("name".to_string(), Value::Str(names.claim(&base, diags)));

        if self.schema.field("capacity_cost").is_some() && !out.contains_key("capacity_cost") {
            if let Some(v) = self.derive_capacity_cost(row, diags)? {
                out.insert("capacity_cost".to_string(), v);
            }
        }

        match decommission(&out) {
            Ok(decommissioned) => out = decommissioned,
            Err(e) => self.null_or_raise(&mut out, "max", e, diags)?,
        }

        if let Some(lifetime) = out.get("lifetime").cloned() {
            match floor_lifetime(&lifetime) {
                Ok((floored, varied)) => {
                    if varied {
                        diags.push(
                            DiagnosticKind::LifetimeVariance,
                            format!("lifetime {lifetime} varies across periods; keeping {floored}"),
                        );
                    }
                    out.insert("lifetime".to_string(), floored);
                }
                Err(e) => self.null_or_raise(&mut out, "lifetime", e, diags)?,
            }
        }
        Ok(out)
    }

    fn base_name(&self, row: &Row, out: &Row, diags: &mut Diagnostics) -> String {
        let existing = self.keys.get(row, "name", FieldKind::Str, diags).into_value();
        if let Some(name) = existing.as_ref().and_then(Value::key_part) {
            return name;
        }
        let parts: Vec<String> = ["region", "carrier", "tech"]
            .iter()
            .filter_map(|k| out.get(*k).and_then(Value::key_part))
            .collect();
        if parts.is_empty() {
            self.schema.facade.to_string()
        } else {
            parts.join(NAME_SEPARATOR)
        }
    }

    fn derive_capacity_cost(
        &self,
        row: &Row,
        diags: &mut Diagnostics,
    ) -> Result<Option<Value>, AdapterError> {
        let mut get = |key: &str| self.keys.get(row, key, FieldKind::Float, diags).into_value();
        let (Some(overnight), Some(lifetime), Some(wacc)) =
            (get("overnight_cost"), get("lifetime"), get("wacc"))
        else {
            return Ok(None);
        };
        let fixed = get("fixed_cost");
        match capacity_cost(&overnight, fixed.as_ref(), &lifetime, &wacc) {
            Ok(v) => Ok(Some(v)),
            Err(e) => match self.mode {
                CalculationMode::Lenient => {
                    diags.push(
                        DiagnosticKind::CalculationNulled,
                        format!("capacity_cost set to null: {e}"),
                    );
                    Ok(Some(Value::Null))
                }
                _ => Err(e),
            },
        }
    }

    fn null_or_raise(
        &self,
        out: &mut Row,
        field: &str,
        error: AdapterError,
        diags: &mut Diagnostics,
    ) -> Result<(), AdapterError> {
        match self.mode {
            CalculationMode::Lenient => {
                diags.push(
                    DiagnosticKind::CalculationNulled,
                    format!("{field} set to null: {error}"),
                );
                out.insert(field.to_string(), Value::Null);
                Ok(())
            }
            _ => Err(error),
        }
    }
}
