//! Multi-year aggregation of component rows into one record per identity.
//!
//! Rows sharing `(region, carrier, tech)` are merged: constant fields stay
//! scalar, varying fields become lists ordered by year, nested dicts keep
//! the first period's value. Missing entries are imputed by seeded
//! resampling from the field's own observed values.

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabula_types::{DiagnosticKind, Diagnostics, Row, Value};

use crate::builder::NAME_SEPARATOR;

/// Aggregates per-year rows into per-identity records.
#[derive(Debug, Clone)]
pub struct PeriodicAggregator {
    seed: u64,
    identity: Vec<String>,
    year: String,
}

impl PeriodicAggregator {
    /// Aggregator keyed on `region`, `carrier`, `tech` and ordered by `year`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            identity: vec!["region".into(), "carrier".into(), "tech".into()],
            year: "year".into(),
        }
    }

    /// Use different source columns for the identity key and the year.
    #[must_use]
    pub fn with_fields<S: Into<String>>(mut self, identity: [S; 3], year: impl Into<String>) -> Self {
        self.identity = identity.into_iter().map(Into::into).collect();
        self.year = year.into();
        self
    }

    /// Group `rows` by identity (first-seen order) and aggregate each group.
    pub fn aggregate_rows(&self, rows: &[Row], diags: &mut Diagnostics) -> Vec<Row> {
        let mut groups: IndexMap<Vec<String>, Vec<&Row>> = IndexMap::new();
        for row in rows {
            groups.entry(self.identity_of(row)).or_default().push(row);
        }
        groups
            .into_values()
            .map(|group| self.aggregate_refs(&group, diags))
            .collect()
    }

    /// Aggregate rows sharing one identity into a single record.
    pub fn aggregate(&self, group: &[Row], diags: &mut Diagnostics) -> Row {
        let refs: Vec<&Row> = group.iter().collect();
        self.aggregate_refs(&refs, diags)
    }

    fn identity_of(&self, row: &Row) -> Vec<String> {
        self.identity
            .iter()
            .map(|k| row.get(k).and_then(Value::key_part).unwrap_or_default())
            .collect()
    }

    fn name_of(&self, row: &Row) -> String {
        self.identity_of(row)
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(NAME_SEPARATOR)
    }

    fn year_of(&self, row: &Row) -> Option<f64> {
        row.get(&self.year).and_then(Value::as_f64)
    }

    /// Sort by year and merge rows sharing a year, keeping the first
    /// non-missing value of every column.
    fn by_year(&self, group: &[&Row], diags: &mut Diagnostics) -> Vec<Row> {
        let mut sorted: Vec<&Row> = group.to_vec();
        sorted.sort_by(|a, b| {
            let ya = self.year_of(a).unwrap_or(f64::INFINITY);
            let yb = self.year_of(b).unwrap_or(f64::INFINITY);
            ya.total_cmp(&yb)
        });

        let mut out: Vec<Row> = Vec::with_capacity(sorted.len());
        for row in sorted {
            let year = self.year_of(row);
            let repeated = year.is_some() && out.last().and_then(|p| self.year_of(p)) == year;
            if !repeated {
                out.push(row.clone());
                continue;
            }
            let Some(prev) = out.last_mut() else {
                continue;
            };
            for (k, v) in row {
                let slot = prev.entry(k.clone()).or_insert(Value::Null);
                if slot.is_missing() && !v.is_missing() {
                    *slot = v.clone();
                }
            }
            diags.push(
                DiagnosticKind::DuplicateYear,
                format!(
                    "several rows of {} for year {}; merged, first value kept",
                    self.name_of(row),
                    Value::from(year).to_cell()
                ),
            );
        }
        out
    }

    fn aggregate_refs(&self, group: &[&Row], diags: &mut Diagnostics) -> Row {
        let sorted = self.by_year(group, diags);
        let Some(first) = sorted.first() else {
            return Row::new();
        };
        if let [only] = sorted.as_slice() {
            let mut out = only.clone();
            out.shift_remove(&self.year);
            out.insert("name".to_string(), Value::Str(self.name_of(only)));
            return out;
        }

        let mut columns: Vec<&str> = Vec::new();
        for row in &sorted {
            for k in row.keys() {
                if *k != self.year && !columns.contains(&k.as_str()) {
                    columns.push(k.as_str());
                }
            }
        }

        let needs_imputation = columns.iter().any(|c| {
            let cells: Vec<&Value> = sorted.iter().map(|r| cell(r, c)).collect();
            let missing = cells.iter().filter(|v| v.is_missing()).count();
            missing > 0 && missing < cells.len() && cells.iter().all(|v| !v.is_list() && !v.is_map())
        });
        if needs_imputation {
            let invest: Vec<&str> = columns.iter().copied().filter(|c| c.contains("invest")).collect();
            if invest.len() > 1 {
                diags.push(
                    DiagnosticKind::MultipleInvestmentColumns,
                    format!("several investment columns {invest:?} while imputing {}", self.name_of(first)),
                );
            }
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out = Row::with_capacity(columns.len() + 1);
        out.insert("name".to_string(), Value::Str(self.name_of(first)));
        for column in columns {
            if column == "name" {
                continue;
            }
            let cells: Vec<&Value> = sorted.iter().map(|r| cell(r, column)).collect();
            let value = if self.identity.iter().any(|k| k == column) {
                first_present(&cells)
            } else {
                merge_cells(&cells, &mut rng)
            };
            out.insert(column.to_string(), value);
        }
        out
    }
}

static NULL: Value = Value::Null;

fn cell<'r>(row: &'r Row, column: &str) -> &'r Value {
    row.get(column).unwrap_or(&NULL)
}

fn first_present(cells: &[&Value]) -> Value {
    cells
        .iter()
        .find(|v| !v.is_missing())
        .map_or(Value::Null, |v| (*v).clone())
}

fn same(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn merge_cells(cells: &[&Value], rng: &mut StdRng) -> Value {
    if cells.iter().any(|v| v.is_map()) {
        return first_present(cells);
    }
    if cells.iter().any(|v| v.is_list()) {
        let mut union: Vec<Value> = Vec::new();
        for v in cells {
            let items: &[Value] = match v {
                Value::List(items) => items,
                other if other.is_missing() => &[],
                other => std::slice::from_ref(*other),
            };
            for item in items {
                if !union.iter().any(|u| same(u, item)) {
                    union.push(item.clone());
                }
            }
        }
        return Value::List(union);
    }

    let observed: Vec<&Value> = cells.iter().copied().filter(|v| !v.is_missing()).collect();
    if observed.is_empty() {
        return Value::Null;
    }
    let filled: Vec<Value> = cells
        .iter()
        .map(|v| {
            if v.is_missing() {
                observed[rng.random_range(0..observed.len())].clone()
            } else {
                (*v).clone()
            }
        })
        .collect();
    if filled.iter().all(|v| same(v, &filled[0])) {
        filled[0].clone()
    } else {
        Value::List(filled)
    }
}

/// Repeat scalars to the longest list length in columns that mix scalar and
/// list cells across rows. Missing cells are left as they are.
pub fn pad_mixed_columns(rows: &mut [Row]) {
    let mut longest: IndexMap<String, usize> = IndexMap::new();
    let mut has_scalar: IndexMap<String, bool> = IndexMap::new();
    for row in rows.iter() {
        for (k, v) in row {
            match v {
                Value::List(items) => {
                    let e = longest.entry(k.clone()).or_insert(0);
                    *e = (*e).max(items.len());
                }
                v if !v.is_missing() && !v.is_map() => {
                    has_scalar.insert(k.clone(), true);
                }
                _ => {}
            }
        }
    }
    for (column, len) in longest {
        if !has_scalar.contains_key(&column) {
            continue;
        }
        for row in rows.iter_mut() {
            if let Some(v) = row.get_mut(&column) {
                if !v.is_list() && !v.is_missing() && !v.is_map() {
                    *v = Value::List(vec![v.clone(); len]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wind(year: i64, capacity: f64) -> Row {
        let mut r = Row::new();
        r.insert("region".into(), Value::from("BB"));
        r.insert("carrier".into(), Value::from("wind"));
        r.insert("tech".into(), Value::from("onshore"));
        r.insert("year".into(), Value::Int(year));
        r.insert("capacity".into(), Value::Float(capacity));
        r.insert("lifetime".into(), Value::Int(25));
        r
    }

    #[test]
    fn varying_fields_become_lists_by_year() {
        let rows = vec![wind(2050, 50.0), wind(2016, 100.0), wind(2030, 100.0)];
        let mut d = Diagnostics::new();
        let out = PeriodicAggregator::new(42).aggregate_rows(&rows, &mut d);
        assert_eq!(out.len(), 1);
        let r = &out[0];
        assert_eq!(r["name"], Value::from("BB_wind_onshore"));
        assert_eq!(r["capacity"], Value::floats(&[100.0, 100.0, 50.0]));
        assert_eq!(r["lifetime"], Value::Int(25));
        assert!(!r.contains_key("year"));
    }

    #[test]
    fn missing_values_are_imputed_from_observed() {
        let mut a = wind(2016, 100.0);
        a.insert("capacity".into(), Value::Null);
        let rows = vec![a, wind(2030, 80.0), wind(2050, 60.0)];
        let mut d = Diagnostics::new();
        let r = PeriodicAggregator::new(7).aggregate(&rows, &mut d);
        let caps = r["capacity"].as_list().unwrap();
        assert_eq!(caps.len(), 3);
        assert!(caps[0] == Value::Float(80.0) || caps[0] == Value::Float(60.0));
    }

    #[test]
    fn dicts_take_first_period() {
        let mut a = wind(2030, 1.0);
        let mut b = wind(2016, 1.0);
        let mut m = IndexMap::new();
        m.insert("min".to_string(), Value::Float(0.1));
        b.insert("output_parameters".into(), Value::Map(m.clone()));
        let mut m2 = m.clone();
        m2.insert("min".to_string(), Value::Float(0.9));
        a.insert("output_parameters".into(), Value::Map(m2));
        let mut d = Diagnostics::new();
        let r = PeriodicAggregator::new(42).aggregate(&[a, b], &mut d);
        assert_eq!(r["output_parameters"], Value::Map(m));
    }

    #[test]
    fn padding_repeats_scalars() {
        let mut a = Row::new();
        a.insert("max".into(), Value::floats(&[1.0, 0.5]));
        let mut b = Row::new();
        b.insert("max".into(), Value::Float(0.8));
        let mut c = Row::new();
        c.insert("max".into(), Value::Null);
        let mut rows = vec![a, b, c];
        pad_mixed_columns(&mut rows);
        assert_eq!(rows[1]["max"], Value::floats(&[0.8, 0.8]));
        assert!(rows[2]["max"].is_missing());
    }
}
