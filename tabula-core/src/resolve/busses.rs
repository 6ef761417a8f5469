use indexmap::IndexMap;
use tabula_types::{
    AdapterError, BusGroup, BusMap, DiagnosticKind, Diagnostics, MappingContext, Structure,
};

use super::similarity::ratio;
use crate::schema::FacadeSchema;

/// Lowest similarity accepted by the fuzzy fallback.
pub const SIMILARITY_FLOOR: f64 = 0.2;

/// Resolved `{bus_role -> physical_bus}` for one process, in schema order.
pub type ResolvedBusses = IndexMap<String, String>;

/// Resolves the bus roles of a schema against a process structure.
#[derive(Debug, Clone, Copy)]
pub struct BusResolver<'a> {
    bus_map: &'a BusMap,
    ctx: MappingContext<'a>,
}

impl<'a> BusResolver<'a> {
    /// Resolver using `bus_map` overrides for the scopes in `ctx`.
    #[must_use]
    pub const fn new(bus_map: &'a BusMap, ctx: MappingContext<'a>) -> Self {
        Self { bus_map, ctx }
    }

    /// Resolve every bus role of `schema`.
    ///
    /// Per role: a bus map override wins; otherwise the role-specific
    /// cardinality rule (`bus`, `from_bus`/`fuel_bus`, `to_bus`); otherwise
    /// the most similar bus name of the selected structure group.
    ///
    /// # Errors
    /// Returns `AdapterError::Mapping` if a default role is ambiguous or a
    /// role has no sufficiently similar candidate.
    pub fn resolve(
        &self,
        schema: &FacadeSchema,
        structure: &Structure,
        diags: &mut Diagnostics,
    ) -> Result<ResolvedBusses, AdapterError> {
        let process = self.ctx.process.unwrap_or(schema.facade);
        let empty = BusGroup::default();
        let group = match structure.primary() {
            Some(sel) => {
                if sel.ambiguous {
                    diags.push(
                        DiagnosticKind::AmbiguousBusStructure,
                        format!(
                            "several bus groups and none named 'default'; using '{}'",
                            sel.name
                        ),
                    );
                }
                sel.group
            }
            None => &empty,
        };

        let mut out = ResolvedBusses::new();
        for role in schema.bus_roles() {
            let bus = self.resolve_role(process, role, group)?;
            out.insert(role.to_string(), bus);
        }
        Ok(out)
    }

    fn resolve_role(
        &self,
        process: &str,
        role: &str,
        group: &BusGroup,
    ) -> Result<String, AdapterError> {
        if let Some((bus, _)) = self.bus_map.lookup(role, &self.ctx) {
            return Ok(bus.to_string());
        }
        let pool = match role {
            "bus" => Some(group.candidates()),
            "from_bus" | "fuel_bus" => Some(group.distinct_inputs()),
            "to_bus" => Some(group.distinct_outputs()),
            _ => None,
        };
        if let Some(pool) = pool {
            return match pool.as_slice() {
                [only] => Ok((*only).to_string()),
                [] => Err(AdapterError::mapping(
                    process,
                    format!("no candidate bus for '{role}'"),
                )),
                many => Err(AdapterError::mapping(
                    process,
                    format!("'{role}' is ambiguous between {many:?}; add a bus map entry"),
                )),
            };
        }
        best_match(role, &group.candidates()).ok_or_else(|| {
            AdapterError::mapping(
                process,
                format!(
                    "no bus similar to '{role}' among {:?}",
                    group.candidates()
                ),
            )
        })
    }
}

/// Most similar candidate to `role` above [`SIMILARITY_FLOOR`]; ties keep
/// the earliest candidate.
#[must_use]
pub fn best_match(role: &str, candidates: &[&str]) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for &c in candidates {
        let score = ratio(role, c);
        if score < SIMILARITY_FLOOR {
            continue;
        }
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((c, score));
        }
    }
    best.map(|(c, _)| c.to_string())
}
