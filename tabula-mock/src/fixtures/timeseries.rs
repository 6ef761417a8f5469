use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tabula_core::{SequenceTable, Timeseries};
use tabula_types::{Row, Value};

/// Years covered by every fixture timeseries.
pub const YEARS: [i32; 3] = [2016, 2030, 2050];
/// Days per year in every fixture timeseries.
pub const DAYS: usize = 2;

fn hours() -> usize {
    DAYS * 24
}

fn start_of(year: i32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, 1, 1)?.and_hms_opt(0, 0, 0)
}

/// Day-night shaped profile in `[floor, floor + amplitude]`.
#[allow(clippy::cast_precision_loss)]
fn shape(hour: usize, floor: f64, amplitude: f64) -> f64 {
    let h = (hour % 24) as f64;
    let daylight = (1.0 - ((h - 12.0) / 12.0).abs()).max(0.0);
    floor + amplitude * daylight
}

pub fn by_process(name: &str) -> Option<Timeseries> {
    match name {
        "wind_onshore" => Some(Timeseries::Tall(wind_tall())),
        "pv_utility" => wide(&[("pv_BB", 0.0, 0.9), ("pv_BE", 0.0, 0.8)]).map(Timeseries::Wide),
        "demand" => wide(&[("demand_BB", 0.6, 0.4)]).map(Timeseries::Wide),
        _ => None,
    }
}

fn wind_tall() -> Vec<Row> {
    let mut rows = Vec::new();
    for year in YEARS {
        for (region, floor) in [("BB", 0.3), ("BE", 0.2)] {
            let values: Vec<f64> = (0..hours()).map(|h| shape(h + 12, floor, 0.5)).collect();
            let mut r = Row::new();
            r.insert("region".into(), Value::from(region));
            r.insert("timeindex_start".into(), Value::Str(format!("{year}-01-01T00:00:00")));
            r.insert(
                "timeindex_stop".into(),
                Value::Str(format!("{year}-01-{:02}T23:00:00", DAYS)),
            );
            r.insert("timeindex_resolution".into(), Value::from("PT1H"));
            r.insert("onshore".into(), Value::floats(&values));
            rows.push(r);
        }
    }
    rows
}

fn wide(columns: &[(&str, f64, f64)]) -> Option<SequenceTable> {
    let mut index = Vec::with_capacity(YEARS.len() * hours());
    for year in YEARS {
        let start = start_of(year)?;
        for h in 0..hours() {
            index.push(start + TimeDelta::hours(i64::try_from(h).ok()?));
        }
    }
    let mut table = SequenceTable::with_index(index);
    for (name, floor, amplitude) in columns {
        let values = (0..YEARS.len() * hours())
            .map(|i| Some(shape(i % hours(), *floor, *amplitude)))
            .collect();
        table.insert_column(*name, values).ok()?;
    }
    Some(table)
}
