use log::warn;

use crate::conv1d::convolve_valid_f64;
use crate::kernels1d::BoxcarKernel1D;

/// Upper bound of the normalized intensity range.
pub const NORMALIZED_MAX: f64 = 255.0;

/// Boxcar smoother with resampling and range normalization.
///
/// The smoother keeps its kernel and convolution buffer between frames; only
/// the returned profile is allocated per call.
#[derive(Debug, Clone)]
pub struct ProfileSmoother {
    kernel: BoxcarKernel1D,
    conv: Vec<f64>,
}

impl ProfileSmoother {
    pub fn new(radius: usize) -> Self {
        Self {
            kernel: BoxcarKernel1D::new(radius),
            conv: Vec::new(),
        }
    }

    pub fn radius(&self) -> usize {
        self.kernel.radius
    }

    pub fn set_radius(&mut self, radius: usize) {
        if radius != self.kernel.radius {
            self.kernel = BoxcarKernel1D::new(radius);
        }
    }

    /// Smooths, resamples back to `profile.len()` and normalizes.
    pub fn smooth(&mut self, profile: &[f64]) -> Vec<f64> {
        self.smooth_to(profile, profile.len())
    }

    /// Smooths `profile`, resamples the narrowed result to `target_len`
    /// samples and rescales it into `[0, 255]`.
    pub fn smooth_to(&mut self, profile: &[f64], target_len: usize) -> Vec<f64> {
        if profile.is_empty() {
            return vec![0.0; target_len];
        }

        let max_radius = (profile.len() - 1) / 2;
        if self.kernel.radius > max_radius {
            warn!(
                "smoothing radius {} too wide for {} samples, clamping to {}",
                self.kernel.radius,
                profile.len(),
                max_radius
            );
            let clamped = BoxcarKernel1D::new(max_radius);
            convolve_valid_f64(profile, &clamped.weights, &mut self.conv);
        } else {
            convolve_valid_f64(profile, &self.kernel.weights, &mut self.conv);
        }

        let mut out = resample_linear(&self.conv, target_len);
        normalize_to_u8_range(&mut out);
        out
    }
}

impl Default for ProfileSmoother {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Piecewise-linear resampling over a uniform parameter grid.
///
/// Input sample `i` sits at `x = i`; output sample `j` sits at
/// `x = j * (len - 1) / (target_len - 1)`, so both ends are preserved.
pub fn resample_linear(values: &[f64], target_len: usize) -> Vec<f64> {
    if values.is_empty() {
        return vec![0.0; target_len];
    }
    if values.len() == 1 || target_len <= 1 {
        return vec![values[0]; target_len];
    }

    let last = values.len() - 1;
    let denom = (target_len - 1) as f64;

    (0..target_len)
        .map(|j| {
            let x = (j * last) as f64 / denom;
            let i0 = (x.floor() as usize).min(last);
            if i0 == last {
                return values[last];
            }
            let t = x - i0 as f64;
            values[i0] + (values[i0 + 1] - values[i0]) * t
        })
        .collect()
}

/// Rescales `values` in place to `[0, 255]`.
///
/// A flat input, or one whose range is not finite, becomes all zeros.
pub fn normalize_to_u8_range(values: &mut [f64]) {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    let mut has_nan = false;
    for &v in values.iter() {
        if v.is_nan() {
            has_nan = true;
            break;
        }
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }

    let range = max_v - min_v;
    if has_nan || !range.is_finite() || range == 0.0 {
        values.fill(0.0);
        return;
    }

    let scale = NORMALIZED_MAX / range;
    for v in values.iter_mut() {
        let r = ((*v - min_v) * scale).clamp(0.0, NORMALIZED_MAX);
        *v = if r.is_finite() { r } else { 0.0 };
    }
}
