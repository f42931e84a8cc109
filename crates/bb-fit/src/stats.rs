//! NaN-skipping summary statistics.

/// Mean of the non-NaN values, `NaN` if there are none.
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0f64, 0usize), |(s, c), &v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Population standard deviation of the non-NaN values, `NaN` if there are
/// none.
pub fn nan_std(values: &[f64]) -> f64 {
    let mean = nan_mean(values);
    if mean.is_nan() {
        return f64::NAN;
    }
    let (ss, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0f64, 0usize), |(s, c), &v| {
            let d = v - mean;
            (s + d * d, c + 1)
        });
    (ss / count as f64).sqrt()
}

/// Largest non-NaN value, `None` if there is none.
pub fn nan_max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::{nan_max, nan_mean, nan_std};

    #[test]
    fn population_std_skips_nan() {
        let values = [2.0, 4.0, f64::NAN, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_abs_diff_eq!(nan_mean(&values), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(nan_std(&values), 2.0, epsilon = 1e-12);
        assert_eq!(nan_max(&values), Some(9.0));
    }

    #[test]
    fn empty_and_all_nan() {
        assert!(nan_std(&[]).is_nan());
        assert!(nan_std(&[f64::NAN, f64::NAN]).is_nan());
        assert_eq!(nan_max(&[f64::NAN]), None);
        assert_eq!(nan_std(&[3.0; 5]), 0.0);
    }
}
