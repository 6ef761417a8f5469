//! Scoped key mappings for parameters and busses.
//!
//! Both the parameter map (`{scope -> {logical_field -> source_field}}`) and
//! the bus map (`{type -> {bus_role -> physical_bus}}`) are plain nested
//! key-value configuration. Lookups walk the scopes that apply to a
//! [`MappingContext`] from most to least specific:
//!
//! - `Process`: the process name, e.g. `modex_tech_wind_turbine_onshore`
//! - `Adapter`: the adapter name, e.g. `VolatileAdapter`
//! - `Facade`: the downstream component type, e.g. `volatile`
//! - `Default`: the literal `DEFAULT` scope
//!
//! The first scope holding the key wins. A miss leaves the logical key as
//! its own physical key (identity).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name of the catch-all scope.
pub const DEFAULT_SCOPE: &str = "DEFAULT";

/// Scope that produced a mapping hit. Precedence is
/// Process > Adapter > Facade > Default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKey {
    /// Mapping bound to a process name.
    Process(String),
    /// Mapping bound to an adapter name.
    Adapter(String),
    /// Mapping bound to a facade type.
    Facade(String),
    /// Catch-all mapping.
    Default,
}

/// Identifies which scopes apply to a lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingContext<'a> {
    /// Process name, if known.
    pub process: Option<&'a str>,
    /// Adapter name, if known.
    pub adapter: Option<&'a str>,
    /// Facade type, if known.
    pub facade: Option<&'a str>,
}

impl<'a> MappingContext<'a> {
    /// Build a context from optional process, adapter and facade names.
    #[must_use]
    pub const fn new(
        process: Option<&'a str>,
        adapter: Option<&'a str>,
        facade: Option<&'a str>,
    ) -> Self {
        Self {
            process,
            adapter,
            facade,
        }
    }

    /// Candidate scopes in precedence order.
    fn scopes(&self) -> impl Iterator<Item = (&'a str, ScopeKey)> {
        [
            self.process.map(|p| (p, ScopeKey::Process(p.to_string()))),
            self.adapter.map(|a| (a, ScopeKey::Adapter(a.to_string()))),
            self.facade.map(|f| (f, ScopeKey::Facade(f.to_string()))),
            Some((DEFAULT_SCOPE, ScopeKey::Default)),
        ]
        .into_iter()
        .flatten()
    }
}

/// Nested `{scope -> {key -> target}}` map with scope precedence lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopedMap {
    scopes: IndexMap<String, IndexMap<String, String>>,
}

/// Parameter map: `{scope -> {logical_field -> source_field}}`.
pub type ParameterMap = ScopedMap;

/// Bus map: `{type -> {bus_role -> physical_bus_name}}`.
pub type BusMap = ScopedMap;

impl ScopedMap {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key -> target` within `scope`, replacing an existing entry.
    pub fn set(&mut self, scope: &str, key: &str, target: &str) {
        self.scopes
            .entry(scope.to_string())
            .or_default()
            .insert(key.to_string(), target.to_string());
    }

    /// Builder-style variant of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, scope: &str, key: &str, target: &str) -> Self {
        self.set(scope, key, target);
        self
    }

    /// Entries configured for a single scope.
    #[must_use]
    pub fn scope(&self, scope: &str) -> Option<&IndexMap<String, String>> {
        self.scopes.get(scope)
    }

    /// Scope names in declaration order.
    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.keys().map(String::as_str)
    }

    /// True if no scope holds any entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.values().all(IndexMap::is_empty)
    }

    /// Resolve `key` against the scopes of `ctx`, most specific first.
    ///
    /// Returns the mapped target and the scope that provided it, or `None`
    /// when no applicable scope maps the key.
    #[must_use]
    pub fn lookup(&self, key: &str, ctx: &MappingContext<'_>) -> Option<(&str, ScopeKey)> {
        for (name, scope) in ctx.scopes() {
            if let Some(target) = self.scopes.get(name).and_then(|m| m.get(key)) {
                return Some((target.as_str(), scope));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> ParameterMap {
        ParameterMap::new()
            .with(DEFAULT_SCOPE, "capacity", "installed_capacity")
            .with("volatile", "capacity", "facade_capacity")
            .with("VolatileAdapter", "capacity", "adapter_capacity")
            .with("wind", "capacity", "process_capacity")
    }

    #[test]
    fn most_specific_scope_wins() {
        let m = map();
        let ctx = MappingContext::new(Some("wind"), Some("VolatileAdapter"), Some("volatile"));
        let (target, scope) = m.lookup("capacity", &ctx).unwrap();
        assert_eq!(target, "process_capacity");
        assert_eq!(scope, ScopeKey::Process("wind".into()));

        let ctx = MappingContext::new(Some("pv"), Some("VolatileAdapter"), Some("volatile"));
        assert_eq!(m.lookup("capacity", &ctx).unwrap().0, "adapter_capacity");

        let ctx = MappingContext::new(Some("pv"), Some("OtherAdapter"), Some("volatile"));
        assert_eq!(m.lookup("capacity", &ctx).unwrap().0, "facade_capacity");

        let ctx = MappingContext::new(Some("pv"), None, None);
        let (target, scope) = m.lookup("capacity", &ctx).unwrap();
        assert_eq!(target, "installed_capacity");
        assert_eq!(scope, ScopeKey::Default);
    }

    #[test]
    fn miss_returns_none() {
        let m = map();
        assert!(m.lookup("efficiency", &MappingContext::default()).is_none());
    }
}
