//! Order statistics and rounding shared by every execution path.
//!
//! The SQLite pushdown aggregate and the in-memory evaluator both call into
//! this module, so both modes produce bit-identical medians.

/// Quantile of `values` using linear interpolation between closest ranks.
///
/// `q` is clamped to `[0, 1]`; `q = 0.5` is exactly [`median`].
/// Returns `None` for an empty slice. The slice is sorted in place.
#[must_use]
pub fn quantile(values: &mut [f64], q: f64) -> Option<f64> {
    let q = if q.is_nan() { 0.5 } else { q.clamp(0.0, 1.0) };
    if q == 0.5 {
        return median(values);
    }
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);

    let rank = q * (values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        return Some(values[lower]);
    }

    let fraction = rank - lower as f64;
    Some(values[lower] + (values[upper] - values[lower]) * fraction)
}

/// Median (mean of the two middle values for even-length input).
#[must_use]
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Arithmetic mean. `None` for empty input.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Round to the nearest integer, ties to even.
///
/// Used for every integer-valued dashboard figure (median age, survival rate).
#[must_use]
pub fn round_half_even(value: f64) -> i64 {
    value.round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_and_even() {
        let mut odd = vec![3.0, 1.0, 2.0];
        assert_eq!(median(&mut odd), Some(2.0));

        let mut even = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(median(&mut even), Some(2.5));

        let mut empty: Vec<f64> = Vec::new();
        assert_eq!(median(&mut empty), None);
    }

    #[test]
    fn test_quantile_interpolation() {
        let mut values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&mut values, 0.0), Some(1.0));
        assert_eq!(quantile(&mut values, 0.25), Some(2.0));
        assert_eq!(quantile(&mut values, 1.0), Some(5.0));

        let mut values = vec![10.0, 20.0, 30.0, 40.0];
        // rank 0.75 between 10 and 20
        assert_eq!(quantile(&mut values, 0.25), Some(17.5));
        assert_eq!(quantile(&mut values, 0.5), Some(25.0));
    }

    #[test]
    fn test_quantile_matches_median() {
        let source = vec![72.0, 55.0, 60.0, 65.0, 50.0, 95.0];
        let mut a = source.clone();
        let mut b = source;
        assert_eq!(quantile(&mut a, 0.5), median(&mut b));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[0.0, 0.0, 1.0, 1.0]), Some(0.5));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(60.5), 60);
        assert_eq!(round_half_even(61.5), 62);
        assert_eq!(round_half_even(67.9), 68);
        assert_eq!(round_half_even(-0.4), 0);
    }
}
