use std::f64::consts::TAU;

use bb_core::PolarSample;
use serde::{Deserialize, Serialize};

/// Spreads one pass uniformly over `[0, 2π)`.
///
/// Sample `i` of `n` lands at `θ = 2π·i/n` with radius `base_radius + value`;
/// the curve closes back on sample `0` without repeating it.
pub fn polar_samples(values: &[f64], base_radius: f64) -> Vec<PolarSample> {
    let n = values.len() as f64;
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| PolarSample {
            theta: TAU * i as f64 / n,
            radius: base_radius + v,
        })
        .collect()
}

/// Spread of one pass about its mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundnessSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub peak_to_valley: f64,
}

impl RoundnessSummary {
    /// `None` when the pass has no finite samples.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;
        for &v in values.iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
            sum += v;
            count += 1;
        }
        (count > 0).then(|| Self {
            min,
            max,
            mean: sum / count as f64,
            peak_to_valley: max - min,
        })
    }
}

/// One directional pass ready for plotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub summary: Option<RoundnessSummary>,
    pub polar: Vec<PolarSample>,
}

impl PassReport {
    pub fn new(values: &[f64], base_radius: f64) -> Self {
        Self {
            summary: RoundnessSummary::from_values(values),
            polar: polar_samples(values, base_radius),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use approx::assert_abs_diff_eq;

    use super::{PassReport, RoundnessSummary, polar_samples};

    #[test]
    fn samples_are_evenly_spaced_and_open_ended() {
        let pts = polar_samples(&[1.0, -2.0, 0.5, 0.0], 100.0);
        assert_eq!(pts.len(), 4);
        assert_abs_diff_eq!(pts[0].theta, 0.0);
        assert_abs_diff_eq!(pts[1].theta, FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(pts[2].theta, PI, epsilon = 1e-12);
        assert!(pts[3].theta < 2.0 * PI);
        assert_abs_diff_eq!(pts[1].radius, 98.0);

        let p = pts[1].to_cartesian();
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 98.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_pass_has_no_samples_or_summary() {
        assert!(polar_samples(&[], 10.0).is_empty());
        assert_eq!(RoundnessSummary::from_values(&[]), None);
        assert_eq!(RoundnessSummary::from_values(&[f64::NAN]), None);
    }

    #[test]
    fn summary_skips_non_finite_samples() {
        let s = RoundnessSummary::from_values(&[4.0, -1.0, f64::NAN, 3.0]).expect("finite samples");
        assert_abs_diff_eq!(s.min, -1.0);
        assert_abs_diff_eq!(s.max, 4.0);
        assert_abs_diff_eq!(s.mean, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(s.peak_to_valley, 5.0);
    }

    #[test]
    fn pass_report_pairs_summary_with_curve() {
        let report = PassReport::new(&[2.0, f64::NAN, -1.0], 50.0);
        assert_eq!(report.polar.len(), 3);
        assert_abs_diff_eq!(report.polar[2].radius, 49.0);
        assert!(report.polar[1].radius.is_nan());

        let summary = report.summary.expect("finite samples");
        assert_abs_diff_eq!(summary.peak_to_valley, 3.0);
        assert!(PassReport::new(&[], 50.0).summary.is_none());
    }
}
