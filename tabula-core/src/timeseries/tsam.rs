//! Typical-period aggregation of sequence tables.
//!
//! Each modelled period (a year of the period table) is cut into candidate
//! windows of `hours_per_period`, the windows are clustered, and each
//! cluster is replaced by one representative window. Optionally, the steps
//! of each representative are merged into fewer segments.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use tabula_types::{AdapterError, Representation, Row, TsamConfig, Value};

use super::cluster::{cluster, medoid};
use super::infer::{estimate_step_seconds, is_regular};
use super::reshape::TIMESTAMP_FORMAT;
use crate::tables::{PeriodRow, PeriodTable, SequenceTable};

/// Reconstruction metadata of one aggregated period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsaParameters {
    /// Period id.
    pub period: usize,
    /// Length of a candidate window in hours.
    pub hours_per_period: usize,
    /// Rows per typical period in the reduced table.
    pub timesteps_per_period: usize,
    /// Typical period assigned to each candidate window, in time order.
    pub order: Vec<usize>,
    /// First timestamp of the period's original index.
    pub timeindex_start: NaiveDateTime,
    /// Original step length in seconds.
    pub step_seconds: i64,
    /// Segment lengths (in original steps) per typical period; empty
    /// without segmentation.
    pub segment_durations: Vec<Vec<usize>>,
}

impl TsaParameters {
    /// Flat row as written to the parameters table.
    #[must_use]
    pub fn to_row(&self) -> Row {
        let int = |x: usize| Value::Int(i64::try_from(x).unwrap_or(i64::MAX));
        let ints = |v: &[usize]| Value::List(v.iter().map(|&x| int(x)).collect());
        let mut row = Row::new();
        row.insert("period".into(), int(self.period));
        row.insert("hours_per_period".into(), int(self.hours_per_period));
        row.insert("timesteps_per_period".into(), int(self.timesteps_per_period));
        row.insert("order".into(), ints(self.order.as_slice()));
        row.insert(
            "timeindex_start".into(),
            Value::Str(self.timeindex_start.format(TIMESTAMP_FORMAT).to_string()),
        );
        row.insert("step_seconds".into(), Value::Int(self.step_seconds));
        row.insert(
            "segment_durations".into(),
            Value::List(self.segment_durations.iter().map(|d| ints(d.as_slice())).collect()),
        );
        row
    }
}

/// Reduced sequences, their period table and per-period metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSequences {
    /// Sequence table on the reduced timestamp subset.
    pub sequences: SequenceTable,
    /// Period table of the reduced timestamps.
    pub periods: PeriodTable,
    /// Reconstruction metadata, one entry per period.
    pub parameters: Vec<TsaParameters>,
}

/// Replace every period of `sequences` by its typical periods.
///
/// Periods are processed independently and in parallel.
///
/// # Errors
/// Returns `AdapterError::Config` if `hours_per_period` is not a whole
/// multiple of the step or `typical_periods` is zero, and
/// `AdapterError::Data` if the index is too short, irregular within a
/// period, or a period is shorter than one candidate window.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        target = "tabula::tsam",
        skip(sequences, periods, config),
        fields(rows = sequences.len(), columns = sequences.columns().len()),
    )
)]
pub fn aggregate_periods(
    sequences: &SequenceTable,
    periods: &PeriodTable,
    config: &TsamConfig,
) -> Result<AggregatedSequences, AdapterError> {
    if config.typical_periods == 0 {
        return Err(AdapterError::Config("typical_periods must be positive".into()));
    }
    let step = estimate_step_seconds(sequences.index())
        .ok_or_else(|| AdapterError::Data("at least two timestamps are required".into()))?;
    let window = i64::try_from(config.hours_per_period)
        .ok()
        .and_then(|h| h.checked_mul(3600))
        .filter(|w| *w >= step && w % step == 0)
        .ok_or_else(|| {
            AdapterError::Config(format!(
                "hours_per_period {} is not a multiple of the {step}s step",
                config.hours_per_period
            ))
        })?;
    let steps = usize::try_from(window / step)
        .map_err(|_| AdapterError::Config("window too large".into()))?;

    let position: HashMap<NaiveDateTime, usize> = sequences
        .index()
        .iter()
        .enumerate()
        .map(|(i, t)| (*t, i))
        .collect();
    let jobs: Vec<(usize, Vec<usize>)> = periods
        .periods()
        .into_iter()
        .map(|p| {
            let rows = periods
                .timeindex_of(p)
                .iter()
                .filter_map(|t| position.get(t).copied())
                .collect();
            (p, rows)
        })
        .collect();

    let reduced = jobs
        .par_iter()
        .map(|(period, rows)| {
            reduce_period(*period, &sequences.select_rows(rows), steps, step, config)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut tables = Vec::with_capacity(reduced.len());
    let mut rows = Vec::new();
    let mut parameters = Vec::with_capacity(reduced.len());
    for (table, period_rows, params) in reduced {
        tables.push(table);
        rows.extend(period_rows);
        parameters.push(params);
    }
    rows.sort_by_key(|r| r.timeindex);
    Ok(AggregatedSequences {
        sequences: SequenceTable::merge(tables),
        periods: PeriodTable::from_rows(rows),
        parameters,
    })
}

type Profile = Vec<Vec<Option<f64>>>;

#[allow(clippy::cast_precision_loss)]
fn reduce_period(
    period: usize,
    slice: &SequenceTable,
    steps: usize,
    step_seconds: i64,
    config: &TsamConfig,
) -> Result<(SequenceTable, Vec<PeriodRow>, TsaParameters), AdapterError> {
    let candidates = slice.len() / steps;
    let start = *slice
        .index()
        .first()
        .ok_or_else(|| AdapterError::Data(format!("period {period} has no timestamps")))?;
    if candidates == 0 {
        return Err(AdapterError::Data(format!(
            "period {period} has {} steps, fewer than one window of {steps}",
            slice.len()
        )));
    }
    if !is_regular(slice.index(), step_seconds) {
        return Err(AdapterError::Data(format!(
            "period {period} is not sampled every {step_seconds}s"
        )));
    }

    let columns: Vec<&Vec<Option<f64>>> = slice.columns().values().collect();
    let bounds: Vec<(f64, f64)> = columns
        .iter()
        .map(|col| {
            col.iter().flatten().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
        })
        .collect();
    let normalize = |c: usize, v: Option<f64>| -> f64 {
        let (lo, hi) = bounds[c];
        match v {
            Some(v) if hi > lo => (v - lo) / (hi - lo),
            _ => 0.0,
        }
    };

    // raw[window][step][column]
    let raw: Vec<Profile> = (0..candidates)
        .map(|w| {
            (0..steps)
                .map(|s| columns.iter().map(|col| col[w * steps + s]).collect())
                .collect()
        })
        .collect();
    let features: Vec<Vec<f64>> = raw
        .iter()
        .map(|window| {
            (0..columns.len())
                .flat_map(|c| window.iter().map(move |step| (c, step[c])))
                .map(|(c, v)| normalize(c, v))
                .collect()
        })
        .collect();

    let k = config.typical_periods.min(candidates);
    let order = cluster(&features, k, config.cluster_method, config.seed);
    let clusters = order.iter().max().map_or(0, |m| m + 1);

    let mut typical: Vec<Profile> = Vec::with_capacity(clusters);
    for j in 0..clusters {
        let members: Vec<usize> = (0..candidates).filter(|&w| order[w] == j).collect();
        let profile = match config.representation {
            Representation::Mean => mean_profile(&raw, &members),
            _ => medoid(&features, &members)
                .map_or_else(|| mean_profile(&raw, &members), |m| raw[m].clone()),
        };
        typical.push(profile);
    }

    let segmenting = config.segmentation && config.segments > 0 && config.segments < steps;
    let mut reduced_rows: Vec<Vec<Option<f64>>> = Vec::new();
    let mut increments: Vec<f64> = Vec::new();
    let mut segment_durations: Vec<Vec<usize>> = Vec::new();
    for profile in &typical {
        if segmenting {
            let normalized: Vec<Vec<f64>> = profile
                .iter()
                .map(|step| step.iter().enumerate().map(|(c, v)| normalize(c, *v)).collect())
                .collect();
            let segments = segment(&normalized, config.segments);
            let mut durations = Vec::with_capacity(segments.len());
            for (from, len) in segments {
                reduced_rows.push(mean_rows(&profile[from..from + len]));
                increments.push(len as f64);
                durations.push(len);
            }
            segment_durations.push(durations);
        } else {
            reduced_rows.extend(profile.iter().cloned());
            increments.extend(std::iter::repeat_n(1.0, profile.len()));
        }
    }

    let index: Vec<NaiveDateTime> = slice.index()[..reduced_rows.len()].to_vec();
    let mut table = SequenceTable::with_index(index.clone());
    for (c, name) in slice.columns().keys().enumerate() {
        table.insert_column(name.clone(), reduced_rows.iter().map(|r| r[c]).collect())?;
    }
    let period_rows = index
        .iter()
        .zip(&increments)
        .map(|(t, inc)| PeriodRow {
            timeindex: *t,
            period,
            timeincrement: *inc,
        })
        .collect();
    let params = TsaParameters {
        period,
        hours_per_period: config.hours_per_period,
        timesteps_per_period: if segmenting { config.segments } else { steps },
        order,
        timeindex_start: start,
        step_seconds,
        segment_durations,
    };
    Ok((table, period_rows, params))
}

#[allow(clippy::cast_precision_loss)]
fn mean_rows(rows: &[Vec<Option<f64>>]) -> Vec<Option<f64>> {
    let width = rows.first().map_or(0, Vec::len);
    (0..width)
        .map(|c| {
            let present: Vec<f64> = rows.iter().filter_map(|r| r[c]).collect();
            (!present.is_empty()).then(|| present.iter().sum::<f64>() / present.len() as f64)
        })
        .collect()
}

fn mean_profile(raw: &[Profile], members: &[usize]) -> Profile {
    let steps = raw.first().map_or(0, Vec::len);
    (0..steps)
        .map(|s| {
            let at_step: Vec<Vec<Option<f64>>> = members.iter().map(|&m| raw[m][s].clone()).collect();
            mean_rows(&at_step)
        })
        .collect()
}

/// Greedily merge adjacent steps with the most similar means until
/// `target` segments remain. Returns `(first_step, length)` pairs.
#[allow(clippy::cast_precision_loss)]
fn segment(steps: &[Vec<f64>], target: usize) -> Vec<(usize, usize)> {
    let mut segments: Vec<(usize, usize)> = (0..steps.len()).map(|i| (i, 1)).collect();
    let mean = |(from, len): (usize, usize)| -> Vec<f64> {
        let width = steps.first().map_or(0, Vec::len);
        (0..width)
            .map(|c| steps[from..from + len].iter().map(|s| s[c]).sum::<f64>() / len as f64)
            .collect()
    };
    while segments.len() > target.max(1) {
        let mut best: Option<(usize, f64)> = None;
        for i in 0..segments.len() - 1 {
            let (a, b) = (mean(segments[i]), mean(segments[i + 1]));
            let d: f64 = a.iter().zip(&b).map(|(x, y)| (x - y) * (x - y)).sum();
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        let Some((i, _)) = best else { break };
        let merged = (segments[i].0, segments[i].1 + segments[i + 1].1);
        segments[i] = merged;
        segments.remove(i + 1);
    }
    segments
}
