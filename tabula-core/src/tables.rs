//! Output tables: wide sequences, periods, busses and element tables.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use tabula_types::{AdapterError, Row, Value};

use crate::foreign_keys::ForeignKey;

/// Wide timeseries: one timestamp index, one column per technology/region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceTable {
    index: Vec<NaiveDateTime>,
    columns: IndexMap<String, Vec<Option<f64>>>,
}

impl SequenceTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with a given index and no columns.
    #[must_use]
    pub fn with_index(index: Vec<NaiveDateTime>) -> Self {
        Self {
            index,
            columns: IndexMap::new(),
        }
    }

    /// Add or replace a column.
    ///
    /// # Errors
    /// Returns `AdapterError::Data` if the column length differs from the index.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), AdapterError> {
        let name = name.into();
        if values.len() != self.index.len() {
            return Err(AdapterError::Data(format!(
                "column '{name}' has {} values for an index of {}",
                values.len(),
                self.index.len()
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Builder-style [`insert_column`](Self::insert_column).
    ///
    /// # Errors
    /// See [`insert_column`](Self::insert_column).
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<Self, AdapterError> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Timestamps.
    #[must_use]
    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// Columns in insertion order.
    #[must_use]
    pub const fn columns(&self) -> &IndexMap<String, Vec<Option<f64>>> {
        &self.columns
    }

    /// One column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Rows `start..end` of every column.
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.index.len());
        let start = start.min(end);
        Self {
            index: self.index[start..end].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (k.clone(), v[start..end].to_vec()))
                .collect(),
        }
    }

    /// The given rows of every column, in the given order.
    #[must_use]
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let rows: Vec<usize> = rows.iter().copied().filter(|&r| r < self.index.len()).collect();
        Self {
            index: rows.iter().map(|&r| self.index[r]).collect(),
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (k.clone(), rows.iter().map(|&r| v[r]).collect()))
                .collect(),
        }
    }

    /// Copy of the table with every column name prefixed.
    #[must_use]
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self {
            index: self.index.clone(),
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (format!("{prefix}{k}"), v.clone()))
                .collect(),
        }
    }

    /// Columns whose name starts with `prefix`, with the prefix removed.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &str) -> Self {
        Self {
            index: self.index.clone(),
            columns: self
                .columns
                .iter()
                .filter_map(|(k, v)| k.strip_prefix(prefix).map(|s| (s.to_string(), v.clone())))
                .collect(),
        }
    }

    /// Outer-join tables on their timestamps.
    ///
    /// The index is the sorted union of all timestamps; columns keep
    /// first-seen order; for duplicate `(timestamp, column)` cells the first
    /// table wins. Cells without data are `None`.
    pub fn merge<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut cells: IndexMap<String, BTreeMap<NaiveDateTime, Option<f64>>> = IndexMap::new();
        let mut index: BTreeSet<NaiveDateTime> = BTreeSet::new();
        for table in tables {
            index.extend(table.index.iter().copied());
            for (name, values) in table.columns {
                let col = cells.entry(name).or_default();
                for (ts, v) in table.index.iter().zip(values) {
                    col.entry(*ts).or_insert(v);
                }
            }
        }
        let index: Vec<NaiveDateTime> = index.into_iter().collect();
        let columns = cells
            .into_iter()
            .map(|(name, col)| {
                let values = index.iter().map(|ts| col.get(ts).copied().flatten()).collect();
                (name, values)
            })
            .collect();
        Self { index, columns }
    }
}

/// One row of the period table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodRow {
    /// Timestamp.
    pub timeindex: NaiveDateTime,
    /// 0-based period id.
    pub period: usize,
    /// Weight of the timestep.
    pub timeincrement: f64,
}

/// Global index of periods over the modelled timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodTable {
    rows: Vec<PeriodRow>,
}

impl PeriodTable {
    /// Periods from timestamps: sorted, de-duplicated, one period per
    /// calendar year, numbered in order of appearance. Increments are 1.
    #[must_use]
    pub fn from_timeindex(timestamps: &[NaiveDateTime]) -> Self {
        let unique: BTreeSet<NaiveDateTime> = timestamps.iter().copied().collect();
        let mut years: Vec<i32> = Vec::new();
        let rows = unique
            .into_iter()
            .map(|ts| {
                let year = ts.year();
                let period = years.iter().position(|y| *y == year).unwrap_or_else(|| {
                    years.push(year);
                    years.len() - 1
                });
                PeriodRow {
                    timeindex: ts,
                    period,
                    timeincrement: 1.0,
                }
            })
            .collect();
        Self { rows }
    }

    /// One row per distinct year, stamped at January 1st.
    #[must_use]
    pub fn from_years<I: IntoIterator<Item = i32>>(years: I) -> Self {
        let stamps: Vec<NaiveDateTime> = years
            .into_iter()
            .filter_map(|y| NaiveDate::from_ymd_opt(y, 1, 1))
            .filter_map(|d| d.and_hms_opt(0, 0, 0))
            .collect();
        Self::from_timeindex(&stamps)
    }

    /// Table from explicit rows.
    #[must_use]
    pub const fn from_rows(rows: Vec<PeriodRow>) -> Self {
        Self { rows }
    }

    /// Rows in timestamp order.
    #[must_use]
    pub fn rows(&self) -> &[PeriodRow] {
        &self.rows
    }

    /// Distinct period ids in order.
    #[must_use]
    pub fn periods(&self) -> Vec<usize> {
        let mut out: Vec<usize> = Vec::new();
        for r in &self.rows {
            if !out.contains(&r.period) {
                out.push(r.period);
            }
        }
        out
    }

    /// Timestamps belonging to `period`.
    #[must_use]
    pub fn timeindex_of(&self, period: usize) -> Vec<NaiveDateTime> {
        self.rows
            .iter()
            .filter(|r| r.period == period)
            .map(|r| r.timeindex)
            .collect()
    }

    /// True if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Distinct bus names referenced by any element table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusTable {
    names: BTreeSet<String>,
}

impl BusTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bus; duplicates are ignored.
    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Bus names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of busses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if no bus is referenced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Rows `{name, type: "bus", balanced: true}`.
    #[must_use]
    pub fn rows(&self) -> Vec<Row> {
        self.names
            .iter()
            .map(|name| {
                let mut row = Row::new();
                row.insert("name".into(), Value::from(name.as_str()));
                row.insert("type".into(), Value::from("bus"));
                row.insert("balanced".into(), Value::Bool(true));
                row
            })
            .collect()
    }
}

impl<S: Into<String>> Extend<S> for BusTable {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}

/// Component records of one facade type with their foreign keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTable {
    /// Facade type; also the resource name.
    pub facade: String,
    /// Component records.
    pub rows: Vec<Row>,
    /// Foreign keys of the table, de-duplicated.
    pub foreign_keys: Vec<ForeignKey>,
}

impl ElementTable {
    /// Empty table of a facade type.
    pub fn new(facade: impl Into<String>) -> Self {
        Self {
            facade: facade.into(),
            rows: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Append rows and keys of another process of the same facade type.
    pub fn append(&mut self, rows: Vec<Row>, keys: Vec<ForeignKey>) {
        self.rows.extend(rows);
        for key in keys {
            if !self.foreign_keys.contains(&key) {
                self.foreign_keys.push(key);
            }
        }
    }

    /// Column names across all rows, first-seen order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for row in &self.rows {
            for k in row.keys() {
                if !out.contains(k) {
                    out.push(k.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, 1, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn merge_is_outer_join_with_first_wins() {
        let a = SequenceTable::with_index(vec![ts(2030, 0), ts(2030, 1)])
            .with_column("x", vec![Some(1.0), Some(2.0)])
            .unwrap();
        let b = SequenceTable::with_index(vec![ts(2030, 1), ts(2030, 2)])
            .with_column("x", vec![Some(9.0), Some(3.0)])
            .unwrap()
            .with_column("y", vec![Some(5.0), None])
            .unwrap();
        let m = SequenceTable::merge([a, b]);
        assert_eq!(m.index(), &[ts(2030, 0), ts(2030, 1), ts(2030, 2)]);
        assert_eq!(m.column("x").unwrap(), &[Some(1.0), Some(2.0), Some(3.0)]);
        assert_eq!(m.column("y").unwrap(), &[None, Some(5.0), None]);
    }

    #[test]
    fn periods_follow_years_in_order() {
        let p = PeriodTable::from_timeindex(&[ts(2050, 0), ts(2030, 1), ts(2030, 0), ts(2030, 0)]);
        let periods: Vec<usize> = p.rows().iter().map(|r| r.period).collect();
        assert_eq!(periods, vec![0, 0, 1]);
        assert_eq!(p.periods(), vec![0, 1]);
        assert_eq!(p.timeindex_of(1), vec![ts(2050, 0)]);
    }

    #[test]
    fn bus_table_is_sorted_and_unique() {
        let mut b = BusTable::new();
        b.extend(["heat", "electricity", "heat"]);
        assert_eq!(b.names().collect::<Vec<_>>(), vec!["electricity", "heat"]);
        assert_eq!(b.rows()[0]["balanced"], Value::Bool(true));
    }
}
