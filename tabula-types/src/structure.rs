//! Declared input/output busses of a process.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name of the bus group used when a structure declares several.
const DEFAULT_GROUP: &str = "default";

/// Ordered input and output bus names of one bus group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusGroup {
    /// Busses the process draws from.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Busses the process feeds into.
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl BusGroup {
    /// Build a group from input and output bus names.
    pub fn new<I, O, S, T>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator<Item = S>,
        O: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }

    /// Distinct input bus names, first occurrence order.
    #[must_use]
    pub fn distinct_inputs(&self) -> Vec<&str> {
        distinct(self.inputs.iter())
    }

    /// Distinct output bus names, first occurrence order.
    #[must_use]
    pub fn distinct_outputs(&self) -> Vec<&str> {
        distinct(self.outputs.iter())
    }

    /// Distinct bus names across inputs then outputs.
    #[must_use]
    pub fn candidates(&self) -> Vec<&str> {
        distinct(self.inputs.iter().chain(self.outputs.iter()))
    }
}

fn distinct<'a>(names: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for n in names {
        if !out.contains(&n.as_str()) {
            out.push(n.as_str());
        }
    }
    out
}

/// Named bus groups of a process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Structure {
    groups: IndexMap<String, BusGroup>,
}

/// The bus group chosen for resolution.
#[derive(Debug, Clone, Copy)]
pub struct GroupSelection<'a> {
    /// Group name.
    pub name: &'a str,
    /// The selected group.
    pub group: &'a BusGroup,
    /// True when several groups exist and none is named `default`.
    pub ambiguous: bool,
}

impl Structure {
    /// Empty structure.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Structure with a single `default` group.
    pub fn single<I, O, S, T>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator<Item = S>,
        O: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self::new().with_group(DEFAULT_GROUP, BusGroup::new(inputs, outputs))
    }

    /// Add or replace a named group.
    #[must_use]
    pub fn with_group(mut self, name: impl Into<String>, group: BusGroup) -> Self {
        self.groups.insert(name.into(), group);
        self
    }

    /// Look up a group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&BusGroup> {
        self.groups.get(name)
    }

    /// Iterate over groups in declaration order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &BusGroup)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True if no group is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Select the group used for bus resolution.
    ///
    /// The `default` group wins; a lone group is used as-is; otherwise the
    /// first declared group is selected and flagged as ambiguous.
    #[must_use]
    pub fn primary(&self) -> Option<GroupSelection<'_>> {
        if let Some((name, group)) = self.groups.get_key_value(DEFAULT_GROUP) {
            return Some(GroupSelection {
                name,
                group,
                ambiguous: false,
            });
        }
        let (name, group) = self.groups.first()?;
        Some(GroupSelection {
            name,
            group,
            ambiguous: self.groups.len() > 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_group_wins() {
        let s = Structure::new()
            .with_group("emissions", BusGroup::new(["ch4"], ["co2"]))
            .with_group("default", BusGroup::new(["ch4"], ["electricity"]));
        let sel = s.primary().unwrap();
        assert_eq!(sel.name, "default");
        assert!(!sel.ambiguous);
    }

    #[test]
    fn several_groups_without_default_are_ambiguous() {
        let s = Structure::new()
            .with_group("a", BusGroup::new(["x"], ["y"]))
            .with_group("b", BusGroup::new(["z"], ["y"]));
        let sel = s.primary().unwrap();
        assert_eq!(sel.name, "a");
        assert!(sel.ambiguous);
    }

    #[test]
    fn candidates_are_distinct() {
        let g = BusGroup::new(["electricity"], ["electricity", "heat"]);
        assert_eq!(g.candidates(), vec!["electricity", "heat"]);
    }
}
