use std::collections::BTreeMap;

use chrono::NaiveDateTime;

/// Adjacent deltas in seconds of the sorted, de-duplicated index.
fn deltas(index: &[NaiveDateTime]) -> Vec<i64> {
    let mut ts = index.to_vec();
    ts.sort_unstable();
    ts.dedup();
    ts.windows(2).map(|w| (w[1] - w[0]).num_seconds()).collect()
}

/// Step of a sequence index in seconds.
///
/// The most frequent adjacent delta wins. When several deltas are equally
/// frequent, the lower median of all deltas is used, which is always an
/// observed step.
///
/// ```
/// use chrono::{NaiveDate, NaiveDateTime};
/// use tabula_core::estimate_step_seconds;
///
/// fn t(h: u32) -> NaiveDateTime {
///     NaiveDate::from_ymd_opt(2030, 1, 1).unwrap().and_hms_opt(h, 0, 0).unwrap()
/// }
/// // One two-hour gap among hourly steps.
/// let index = vec![t(0), t(1), t(2), t(3), t(5)];
/// assert_eq!(estimate_step_seconds(&index), Some(3600));
/// ```
///
/// Returns `None` for fewer than two distinct timestamps.
#[must_use]
pub fn estimate_step_seconds(index: &[NaiveDateTime]) -> Option<i64> {
    let mut steps = deltas(index);
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for step in &steps {
        *counts.entry(*step).or_default() += 1;
    }
    let top = counts.values().copied().max()?;
    let mut modes = counts.iter().filter(|(_, n)| **n == top).map(|(step, _)| *step);
    match (modes.next(), modes.next()) {
        (Some(mode), None) => Some(mode),
        _ => {
            steps.sort_unstable();
            steps.get((steps.len() - 1) / 2).copied()
        }
    }
}

/// True when every adjacent delta of the sorted, de-duplicated index equals
/// `step_seconds`.
#[must_use]
pub fn is_regular(index: &[NaiveDateTime], step_seconds: i64) -> bool {
    deltas(index).iter().all(|d| *d == step_seconds)
}
