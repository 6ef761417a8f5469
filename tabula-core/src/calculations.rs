//! Derived-field calculations: annuity-based capacity cost, decommissioning
//! and lifetime flooring.
//!
//! Every calculation goes through [`calculation`], which wraps failures in
//! `AdapterError::Calculation` carrying the function name and its inputs.

use tabula_types::{AdapterError, Row, Value};

/// Numeric view of a field that is either a scalar or a per-period list.
#[derive(Debug, Clone, PartialEq)]
pub enum Numbers {
    /// Single value.
    Scalar(f64),
    /// One value per period.
    List(Vec<f64>),
}

impl Numbers {
    /// Numeric view of `value`. Lists must hold only numbers.
    ///
    /// # Errors
    /// Returns a description of the offending value if it is not numeric.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::List(items) => items
                .iter()
                .map(|v| v.as_f64().ok_or_else(|| format!("non-numeric entry {v:?}")))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            other => other
                .as_f64()
                .map(Self::Scalar)
                .ok_or_else(|| format!("non-numeric value {other:?}")),
        }
    }

    fn len(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::List(v) => Some(v.len()),
        }
    }

    fn at(&self, i: usize) -> f64 {
        match self {
            Self::Scalar(x) => *x,
            Self::List(v) => v[i],
        }
    }

    /// Back to a cell value.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Scalar(x) => Value::Float(x),
            Self::List(v) => Value::floats(&v),
        }
    }
}

/// Apply `f` element-wise over scalars and equally long lists, broadcasting
/// scalars. All-scalar inputs give a scalar.
///
/// # Errors
/// Fails on list length mismatches or when `f` fails for any element.
pub fn zip_with<F>(inputs: &[Numbers], mut f: F) -> Result<Numbers, String>
where
    F: FnMut(&[f64]) -> Result<f64, String>,
{
    let mut len: Option<usize> = None;
    for n in inputs {
        match (len, n.len()) {
            (None, Some(l)) => len = Some(l),
            (Some(a), Some(b)) if a != b => {
                return Err(format!("list lengths differ ({a} vs {b})"));
            }
            _ => {}
        }
    }
    let mut args = vec![0.0; inputs.len()];
    let mut eval = |i: usize| -> Result<f64, String> {
        for (slot, n) in args.iter_mut().zip(inputs) {
            *slot = n.at(i);
        }
        f(&args)
    };
    match len {
        None => eval(0).map(Numbers::Scalar),
        Some(l) => (0..l).map(eval).collect::<Result<Vec<_>, _>>().map(Numbers::List),
    }
}

/// Run a named calculation, wrapping any failure with its name and inputs.
///
/// # Errors
/// Returns `AdapterError::Calculation` if `f` fails.
pub fn calculation<T, F>(function: &str, inputs: &[(&str, &Value)], f: F) -> Result<T, AdapterError>
where
    F: FnOnce() -> Result<T, String>,
{
    f().map_err(|reason| {
        let rendered = inputs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        AdapterError::calculation(function, rendered, reason)
    })
}

/// Equivalent annual cost of an investment `capex` over `n` years at
/// interest rate `wacc`.
///
/// `capex * (wacc * (1 + wacc)^n) / ((1 + wacc)^n - 1)`; a zero rate
/// spreads the cost evenly (`capex / n`).
///
/// # Errors
/// Fails if `n < 1` or `wacc` is outside `[0, 1]`.
pub fn annuity(capex: f64, n: f64, wacc: f64) -> Result<f64, String> {
    if n.is_nan() || n < 1.0 {
        return Err(format!("n must be >= 1, got {n}"));
    }
    if !(0.0..=1.0).contains(&wacc) {
        return Err(format!("wacc must be within [0, 1], got {wacc}"));
    }
    if wacc == 0.0 {
        return Ok(capex / n);
    }
    let q = (1.0 + wacc).powf(n);
    Ok(capex * (wacc * q) / (q - 1.0))
}

/// `annuity(overnight_cost, lifetime, wacc) + fixed_cost`, element-wise.
///
/// # Errors
/// Returns `AdapterError::Calculation` on non-numeric inputs, mismatched
/// list lengths or invalid annuity arguments.
pub fn capacity_cost(
    overnight_cost: &Value,
    fixed_cost: Option<&Value>,
    lifetime: &Value,
    wacc: &Value,
) -> Result<Value, AdapterError> {
    let zero = Value::Float(0.0);
    let fixed_cost = fixed_cost.unwrap_or(&zero);
    let inputs = [
        ("overnight_cost", overnight_cost),
        ("fixed_cost", fixed_cost),
        ("lifetime", lifetime),
        ("wacc", wacc),
    ];
    calculation("capacity_cost", &inputs, || {
        let nums = inputs
            .iter()
            .map(|(_, v)| Numbers::from_value(v))
            .collect::<Result<Vec<_>, _>>()?;
        zip_with(&nums, |a| Ok(annuity(a[0], a[2], a[3])? + a[1]))
            .map(Numbers::into_value)
    })
}

/// Express a per-period `capacity` curve as a fixed capacity with a
/// fractional `max` availability.
///
/// Applies only when `capacity` is a list. `max_capacity = max(capacity)`;
/// without an existing `max` the new curve is `capacity_i / max_capacity`,
/// otherwise `max_i * capacity_i / max_capacity` (a scalar `max` is
/// broadcast). A zero `max_capacity` yields `0` per element. `capacity`
/// becomes the scalar `max_capacity`.
///
/// # Errors
/// Returns `AdapterError::Calculation` if `capacity` or `max` are not
/// numeric or their lengths differ.
pub fn decommission(row: &Row) -> Result<Row, AdapterError> {
    let Some(capacity @ Value::List(_)) = row.get("capacity") else {
        return Ok(row.clone());
    };
    let existing = row.get("max").filter(|v| !v.is_missing());
    let null = Value::Null;
    let inputs = [("capacity", capacity), ("max", existing.unwrap_or(&null))];
    let (max_capacity, curve) = calculation("decommission", &inputs, || {
        let Numbers::List(caps) = Numbers::from_value(capacity)? else {
            return Err("capacity is not a list".to_string());
        };
        let max_capacity = caps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if caps.is_empty() {
            return Ok((Value::Null, Value::List(Vec::new())));
        }
        let ratio = |c: f64| if max_capacity == 0.0 { 0.0 } else { c / max_capacity };
        let curve = match existing {
            None => caps.iter().map(|&c| ratio(c)).collect::<Vec<_>>(),
            Some(m) => {
                let m = Numbers::from_value(m)?;
                let Numbers::List(out) =
                    zip_with(&[m, Numbers::List(caps)], |a| Ok(a[0] * ratio(a[1])))?
                else {
                    return Err("capacity is not a list".to_string());
                };
                out
            }
        };
        Ok((Value::Float(max_capacity), Value::floats(&curve)))
    })?;

    let mut out = row.clone();
    out.insert("capacity".to_string(), max_capacity);
    out.insert("max".to_string(), curve);
    Ok(out)
}

/// Lifetime as an integer, floored.
///
/// A per-period list keeps its first non-missing value; the returned flag is
/// true when the list held differing values.
///
/// # Errors
/// Returns `AdapterError::Calculation` if the value is not numeric.
#[allow(clippy::cast_possible_truncation)]
pub fn floor_lifetime(lifetime: &Value) -> Result<(Value, bool), AdapterError> {
    calculation("floor_lifetime", &[("lifetime", lifetime)], || {
        let (first, varied) = match lifetime {
            Value::List(items) => {
                let present: Vec<&Value> = items.iter().filter(|v| !v.is_missing()).collect();
                let Some(first) = present.first() else {
                    return Ok((Value::Null, false));
                };
                (*first, present.iter().any(|v| v != first))
            }
            other => (other, false),
        };
        let n = first
            .as_f64()
            .ok_or_else(|| format!("non-numeric lifetime {first:?}"))?;
        Ok((Value::Int(n.floor() as i64), varied))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn annuity_matches_closed_form() {
        // 1000 over 20 years at 5%
        let a = annuity(1000.0, 20.0, 0.05).unwrap();
        assert!(approx(a, 80.242_587_190_691_4), "{a}");
        assert!(approx(annuity(1000.0, 10.0, 0.0).unwrap(), 100.0));
        assert!(annuity(1000.0, 0.0, 0.05).is_err());
        assert!(annuity(1000.0, 20.0, 1.5).is_err());
        assert!(annuity(1000.0, 20.0, -0.1).is_err());
    }

    #[test]
    fn capacity_cost_broadcasts_scalars() {
        let v = capacity_cost(
            &Value::floats(&[1000.0, 800.0]),
            Some(&Value::Float(10.0)),
            &Value::Int(10),
            &Value::Float(0.0),
        )
        .unwrap();
        assert_eq!(v, Value::floats(&[110.0, 90.0]));
    }

    #[test]
    fn capacity_cost_failure_names_function_and_inputs() {
        let err = capacity_cost(&Value::Float(1.0), None, &Value::Int(0), &Value::Float(0.1))
            .unwrap_err();
        match err {
            AdapterError::Calculation {
                function, inputs, ..
            } => {
                assert_eq!(function, "capacity_cost");
                assert!(inputs.contains("lifetime=0"));
                assert!(inputs.contains("fixed_cost=0.0"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn decommission_without_existing_max() {
        let mut row = Row::new();
        row.insert("capacity".into(), Value::floats(&[100.0, 100.0, 50.0]));
        let out = decommission(&row).unwrap();
        assert_eq!(out["capacity"], Value::Float(100.0));
        assert_eq!(out["max"], Value::floats(&[1.0, 1.0, 0.5]));
    }

    #[test]
    fn decommission_combines_existing_max() {
        let mut row = Row::new();
        row.insert("capacity".into(), Value::floats(&[0.0, 40.0, 80.0]));
        row.insert("max".into(), Value::floats(&[1.0, 0.5, 0.5]));
        let out = decommission(&row).unwrap();
        assert_eq!(out["capacity"], Value::Float(80.0));
        assert_eq!(out["max"], Value::floats(&[0.0, 0.25, 0.5]));

        row.insert("max".into(), Value::floats(&[1.0]));
        assert!(decommission(&row).unwrap_err().is_calculation());
    }

    #[test]
    fn decommission_zero_capacity_gives_zero_curve() {
        let mut row = Row::new();
        row.insert("capacity".into(), Value::floats(&[0.0, 0.0]));
        let out = decommission(&row).unwrap();
        assert_eq!(out["max"], Value::floats(&[0.0, 0.0]));
        assert_eq!(out["capacity"], Value::Float(0.0));
    }

    #[test]
    fn scalar_capacity_is_untouched() {
        let mut row = Row::new();
        row.insert("capacity".into(), Value::Float(5.0));
        assert_eq!(decommission(&row).unwrap(), row);
    }

    #[test]
    fn lifetime_takes_first_period() {
        let (v, varied) = floor_lifetime(&Value::floats(&[25.7, 30.0])).unwrap();
        assert_eq!(v, Value::Int(25));
        assert!(varied);
        let (v, varied) = floor_lifetime(&Value::Float(20.0)).unwrap();
        assert_eq!(v, Value::Int(20));
        assert!(!varied);
    }
}
