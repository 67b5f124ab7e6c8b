//! Scalar coercion for cleaned columns.

/// 2^63, exactly representable as f64. Integral floats in `[-2^63, 2^63)` fit in i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Parse an integer cell.
///
/// Accepts integral text (`94103`) and integral float text (`94103.0`), the
/// form an integer column takes once it has passed through a float-typed
/// tabular column. Fractional, non-finite, or out-of-range values are rejected.
pub(crate) fn to_integer(value: &str) -> Option<i64> {
    let value = value.trim();

    if let Ok(i) = value.parse::<i64>() {
        return Some(i);
    }

    let f = value.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

/// Parse a finite float cell.
pub(crate) fn to_float(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
}
