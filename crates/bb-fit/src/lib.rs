//! Sub-pixel peak estimation for normalized intensity profiles.
//!
//! The estimator fits `a * exp(-(x - mu)^2 / (2 * sigma^2))` over
//! `x in [0, len)` with Levenberg-Marquardt and reports `mu` as the peak row.
//!
//! Two models are available:
//! - [`FitModel::ThreeParameter`]: amplitude, mean and sigma are free.
//! - [`FitModel::OneParameter`]: amplitude and sigma are fixed from the
//!   profile's max and standard deviation; only the mean moves. Cheaper, but
//!   biased toward the window center for narrow peaks.
//!
//! Flat, empty or NaN-only profiles are rejected before the optimizer runs.
//! The optimizer runs under a hard function-evaluation cap.

mod gaussian;
mod lm;
mod stats;

pub use gaussian::{
    DEFAULT_MAX_EVALUATIONS, FitError, FitModel, GaussianParams, PeakEstimator, PeakFit,
};
pub use lm::{LmOptions, LmReport, NllsProblem, solve_lm};
pub use stats::{nan_max, nan_mean, nan_std};
