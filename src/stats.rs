//! Column statistics used by the preprocessor.
//!
//! Conventions follow the usual data-frame defaults: sample skewness is the
//! adjusted Fisher-Pearson coefficient, quantiles interpolate linearly
//! between closest ranks.

use std::collections::BTreeMap;

/// Second moments below this are floating-point noise.
const MOMENT_EPSILON: f64 = 1e-14;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Quantile `q` in [0, 1] with linear interpolation.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Adjusted sample skewness.
///
/// NaN for fewer than three values, 0 when the values are all equal.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return f64::NAN;
    }

    let count = n as f64;
    let mean = values.iter().sum::<f64>() / count;
    let m2 = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count;
    let m3 = values.iter().map(|x| (x - mean).powi(3)).sum::<f64>() / count;

    if m2 < MOMENT_EPSILON {
        return 0.0;
    }

    let g1 = m3 / m2.powf(1.5);
    (count * (count - 1.0)).sqrt() / (count - 2.0) * g1
}

/// Most frequent key; ties resolve to the smallest key.
pub fn mode<'a, K: Ord, T>(items: impl IntoIterator<Item = (K, &'a T)>) -> Option<&'a T> {
    let mut counts: BTreeMap<K, (usize, &'a T)> = BTreeMap::new();
    for (key, item) in items {
        counts.entry(key).or_insert((0, item)).0 += 1;
    }

    let mut best: Option<(usize, &'a T)> = None;
    for (count, item) in counts.into_values() {
        if best.map_or(true, |(best_count, _)| count > best_count) {
            best = Some((count, item));
        }
    }
    best.map(|(_, item)| item)
}

/// Tukey fences: [Q1 - 1.5·IQR, Q3 + 1.5·IQR]
pub fn iqr_bounds(values: &[f64]) -> Option<(f64, f64)> {
    let q1 = quantile(values, 0.25)?;
    let q3 = quantile(values, 0.75)?;
    let iqr = q3 - q1;
    Some((q1 - 1.5 * iqr, q3 + 1.5 * iqr))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean_median() {
        let values = [1.0, 2.0, 3.0, 10.0];
        assert_eq!(mean(&values), Some(4.0));
        assert_eq!(median(&values), Some(2.5));
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_quantile_interpolation() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(quantile(&values, 0.25), Some(2.0));
        assert_eq!(quantile(&values, 0.75), Some(4.0));

        let values = [1.0, 2.0, 3.0, 4.0];
        assert!(approx_eq(quantile(&values, 0.25).unwrap(), 1.75));
        assert!(approx_eq(quantile(&values, 0.75).unwrap(), 3.25));
    }

    #[test]
    fn test_skewness() {
        assert!(skewness(&[1.0, 2.0]).is_nan());
        assert_eq!(skewness(&[5.0, 5.0, 5.0]), 0.0);
        assert!(approx_eq(skewness(&[1.0, 2.0, 3.0]), 0.0));

        // Long right tail
        let skewed = [1.0, 1.0, 1.0, 1.0, 1.0, 100.0];
        assert!(skewness(&skewed) > 2.0);

        // G1 of [1, 2, 10] is 1.6523...
        assert!((skewness(&[1.0, 2.0, 10.0]) - 1.6523).abs() < 1e-3);
    }

    #[test]
    fn test_mode_ties_pick_smallest() {
        let values = ["No", "Yes", "Yes", "No"];
        let picked = mode(values.iter().map(|v| (v.to_string(), v)));
        assert_eq!(picked, Some(&"No"));

        let values = ["Yes", "No", "Yes"];
        let picked = mode(values.iter().map(|v| (v.to_string(), v)));
        assert_eq!(picked, Some(&"Yes"));

        // Compared as raw text, not quoted
        let values = ["ab!", "ab"];
        assert_eq!(mode(values.iter().map(|v| (*v, v))), Some(&"ab"));

        let empty: [&str; 0] = [];
        assert_eq!(mode(empty.iter().map(|v| (v.to_string(), v))), None);
    }

    #[test]
    fn test_iqr_bounds() {
        assert_eq!(iqr_bounds(&[7.0]), Some((7.0, 7.0)));

        let (lower, upper) = iqr_bounds(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(lower, -1.0);
        assert_eq!(upper, 7.0);
    }
}
