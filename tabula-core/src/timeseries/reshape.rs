//! Tall-to-wide reshaping of timeseries rows.
//!
//! A tall row describes one region's arrays over `[start, stop]` at a fixed
//! resolution. Reshaping explodes every array into per-step timestamps and
//! pivots regions into `<column>_<region>` columns.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use indexmap::IndexMap;
use tabula_types::{AdapterError, Row, Value};

use crate::tables::SequenceTable;

/// Column holding the region of a tall row.
pub const REGION: &str = "region";
/// Column holding the first timestamp of a tall row.
pub const TIMEINDEX_START: &str = "timeindex_start";
/// Column holding the last timestamp of a tall row.
pub const TIMEINDEX_STOP: &str = "timeindex_stop";
/// Column holding the resolution of a tall row.
pub const TIMEINDEX_RESOLUTION: &str = "timeindex_resolution";

const RESERVED: [&str; 4] = [REGION, TIMEINDEX_START, TIMEINDEX_STOP, TIMEINDEX_RESOLUTION];

/// Timestamp format used in written tables.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a timestamp with a `T` or space separator; a bare date is midnight.
///
/// # Errors
/// Returns `AdapterError::Data` if the text is not a timestamp.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, AdapterError> {
    let text = text.trim();
    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| AdapterError::Data(format!("invalid timestamp '{text}'")))
}

/// Parse a resolution given as ISO-8601 duration (`PT1H`, `P0DT01H00M00S`,
/// `P1D`) or as a pandas-style alias (`h`, `1h`, `15min`, `30T`, `D`, `s`).
///
/// # Errors
/// Returns `AdapterError::Data` for unknown units or non-positive durations.
pub fn parse_resolution(text: &str) -> Result<TimeDelta, AdapterError> {
    let text = text.trim();
    let invalid = || AdapterError::Data(format!("invalid resolution '{text}'"));
    let seconds = if let Some(iso) = text.strip_prefix('P') {
        parse_iso_seconds(iso).ok_or_else(invalid)?
    } else {
        let split = text
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (count, unit) = text.split_at(split);
        let count: i64 = if count.is_empty() {
            1
        } else {
            count.parse().map_err(|_| invalid())?
        };
        let unit_seconds = match unit {
            "s" | "S" | "sec" => 1,
            "min" | "T" => 60,
            "h" | "H" => 3600,
            "d" | "D" => 86_400,
            "W" | "w" => 604_800,
            _ => return Err(invalid()),
        };
        count.checked_mul(unit_seconds).ok_or_else(invalid)?
    };
    if seconds <= 0 {
        return Err(invalid());
    }
    TimeDelta::try_seconds(seconds).ok_or_else(invalid)
}

fn parse_iso_seconds(iso: &str) -> Option<i64> {
    let mut total: i64 = 0;
    let mut in_time = false;
    let mut number = String::new();
    for c in iso.chars() {
        match c {
            'T' => in_time = true,
            '0'..='9' => number.push(c),
            unit => {
                let n: i64 = number.parse().ok()?;
                number.clear();
                let factor = match (unit, in_time) {
                    ('W', false) => 604_800,
                    ('D', false) => 86_400,
                    ('H', true) => 3600,
                    ('M', true) => 60,
                    ('S', true) => 1,
                    _ => return None,
                };
                total = total.checked_add(n.checked_mul(factor)?)?;
            }
        }
    }
    number.is_empty().then_some(total)
}

fn text_of<'r>(row: &'r Row, column: &str) -> Result<&'r str, AdapterError> {
    row.get(column)
        .and_then(Value::as_str)
        .ok_or_else(|| AdapterError::Data(format!("timeseries row lacks '{column}'")))
}

fn numbers(column: &str, items: &[Value]) -> Result<Vec<Option<f64>>, AdapterError> {
    items
        .iter()
        .map(|v| {
            if v.is_missing() {
                Ok(None)
            } else {
                v.as_f64().map(Some).ok_or_else(|| {
                    AdapterError::Data(format!("non-numeric entry {v:?} in '{column}'"))
                })
            }
        })
        .collect()
}

/// Reshape tall rows into one wide table.
///
/// Rows are grouped by `(start, stop, resolution)` in first-seen order.
/// Each array column of each row becomes the column `<column>_<region>`
/// indexed by `start + i * resolution`. Groups are outer-joined on the
/// timestamp; for a duplicate `(timestamp, column)` the first cell wins.
///
/// # Errors
/// Returns `AdapterError::Data` on missing time columns, unparsable
/// timestamps or resolutions, or non-numeric array entries.
pub fn reshape(rows: &[Row]) -> Result<SequenceTable, AdapterError> {
    let mut groups: IndexMap<(&str, &str, &str), Vec<&Row>> = IndexMap::new();
    for row in rows {
        let key = (
            text_of(row, TIMEINDEX_START)?,
            text_of(row, TIMEINDEX_STOP)?,
            text_of(row, TIMEINDEX_RESOLUTION)?,
        );
        groups.entry(key).or_default().push(row);
    }

    let mut blocks: Vec<SequenceTable> = Vec::new();
    for ((start, _stop, resolution), members) in groups {
        let start = parse_timestamp(start)?;
        let step = parse_resolution(resolution)?;
        for row in members {
            let region = row.get(REGION).and_then(Value::key_part).unwrap_or_default();
            for (column, value) in row {
                if RESERVED.contains(&column.as_str()) {
                    continue;
                }
                let Value::List(items) = value else {
                    continue;
                };
                let values = numbers(column, items)?;
                let index = (0..values.len())
                    .map(|i| {
                        i32::try_from(i)
                            .ok()
                            .and_then(|i| step.checked_mul(i))
                            .and_then(|offset| start.checked_add_signed(offset))
                            .ok_or_else(|| AdapterError::Data(format!("timestamp overflow in '{column}'")))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let name = if region.is_empty() {
                    column.clone()
                } else {
                    format!("{column}_{region}")
                };
                blocks.push(SequenceTable::with_index(index).with_column(name, values)?);
            }
        }
    }
    Ok(SequenceTable::merge(blocks))
}

/// Melt a wide table back into tall rows, one per column.
///
/// Column names are split at their last `_` into array column and region;
/// every row spans the full index at `step`. Inverse of [`reshape`] for
/// regular, gap-free tables.
#[must_use]
pub fn to_tall(table: &SequenceTable, step: TimeDelta) -> Vec<Row> {
    let (Some(first), Some(last)) = (table.index().first(), table.index().last()) else {
        return Vec::new();
    };
    let resolution = format!("{}s", step.num_seconds());
    table
        .columns()
        .iter()
        .map(|(name, values)| {
            let (column, region) = name.rsplit_once('_').unwrap_or((name.as_str(), ""));
            let mut row = Row::new();
            row.insert(REGION.into(), Value::from(region));
            row.insert(
                TIMEINDEX_START.into(),
                Value::Str(first.format(TIMESTAMP_FORMAT).to_string()),
            );
            row.insert(
                TIMEINDEX_STOP.into(),
                Value::Str(last.format(TIMESTAMP_FORMAT).to_string()),
            );
            row.insert(TIMEINDEX_RESOLUTION.into(), Value::Str(resolution.clone()));
            row.insert(
                column.to_string(),
                Value::List(values.iter().map(|v| Value::from(*v)).collect()),
            );
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolutions() {
        assert_eq!(parse_resolution("PT1H").unwrap(), TimeDelta::hours(1));
        assert_eq!(parse_resolution("P0DT01H00M00S").unwrap(), TimeDelta::hours(1));
        assert_eq!(parse_resolution("P1D").unwrap(), TimeDelta::days(1));
        assert_eq!(parse_resolution("h").unwrap(), TimeDelta::hours(1));
        assert_eq!(parse_resolution("1h").unwrap(), TimeDelta::hours(1));
        assert_eq!(parse_resolution("15min").unwrap(), TimeDelta::minutes(15));
        assert_eq!(parse_resolution("30T").unwrap(), TimeDelta::minutes(30));
        assert_eq!(parse_resolution("D").unwrap(), TimeDelta::days(1));
        assert_eq!(parse_resolution("s").unwrap(), TimeDelta::seconds(1));
        assert!(parse_resolution("3 fortnights").is_err());
        assert!(parse_resolution("PT0H").is_err());
        assert!(parse_resolution("").is_err());
    }

    #[test]
    fn timestamps() {
        let a = parse_timestamp("2016-01-01T00:00:00").unwrap();
        let b = parse_timestamp("2016-01-01 00:00:00").unwrap();
        let c = parse_timestamp("2016-01-01").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
