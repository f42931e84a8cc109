use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lm::{LmOptions, NllsProblem, solve_lm};
use crate::stats::{nan_max, nan_std};

/// Default hard cap on model evaluations per fit.
pub const DEFAULT_MAX_EVALUATIONS: usize = 800;

/// A free fit whose amplitude is below this fraction of the profile maximum
/// has collapsed onto the flat model.
const MIN_AMPLITUDE_RATIO: f64 = 0.05;

/// A free fit must explain at least this fraction of `½Σy²`.
const MIN_COST_REDUCTION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitModel {
    /// Amplitude, mean and sigma are all free.
    #[default]
    ThreeParameter,
    /// Only the mean is free; amplitude and sigma come from the data.
    OneParameter,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Flat, empty or NaN profile; there is no peak to fit.
    #[error("degenerate signal: std={std}, max={max}")]
    DegenerateSignal { std: f64, max: f64 },
    /// The optimizer did not converge within the evaluation budget.
    #[error("fit diverged after {evaluations} evaluations")]
    FitDivergence { evaluations: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianParams {
    pub amplitude: f64,
    pub mean: f64,
    pub sigma: f64,
}

impl GaussianParams {
    pub fn eval(&self, x: f64) -> f64 {
        let d = x - self.mean;
        self.amplitude * (-(d * d) / (2.0 * self.sigma * self.sigma)).exp()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeakFit {
    pub params: GaussianParams,
    pub evaluations: usize,
    pub final_cost: f64,
}

impl PeakFit {
    /// Sub-pixel peak row.
    pub fn peak(&self) -> f64 {
        self.params.mean
    }
}

#[derive(Debug, Clone)]
pub struct PeakEstimator {
    model: FitModel,
    opts: LmOptions,
}

impl PeakEstimator {
    pub fn new(model: FitModel, max_evaluations: usize) -> Self {
        Self {
            model,
            opts: LmOptions {
                max_evaluations,
                ..LmOptions::default()
            },
        }
    }

    pub fn model(&self) -> FitModel {
        self.model
    }

    pub fn max_evaluations(&self) -> usize {
        self.opts.max_evaluations
    }

    /// Sub-pixel peak row, or `0.0` when the profile is degenerate or the
    /// fit does not converge.
    pub fn estimate(&self, profile: &[f64]) -> f64 {
        match self.fit(profile) {
            Ok(fit) => fit.peak(),
            Err(err) => {
                debug!("peak estimate falls back to 0: {err}");
                0.0
            }
        }
    }

    pub fn fit(&self, profile: &[f64]) -> Result<PeakFit, FitError> {
        let std = nan_std(profile);
        let max = nan_max(profile).unwrap_or(f64::NAN);
        if !std.is_finite() || std <= 0.0 || max == 0.0 || !max.is_finite() {
            return Err(FitError::DegenerateSignal { std, max });
        }

        let n = profile.len();
        let center = (n - 1) as f64 / 2.0;

        let (params, report) = match self.model {
            FitModel::ThreeParameter => {
                let problem = GaussianProblem3 { y: profile };
                let (x, report) = solve_lm(
                    &problem,
                    DVector::from_vec(vec![max, center, std]),
                    &self.opts,
                );
                let params = GaussianParams {
                    amplitude: x[0],
                    mean: x[1],
                    sigma: x[2].abs(),
                };
                (params, report)
            }
            FitModel::OneParameter => {
                let problem = GaussianProblem1 {
                    y: profile,
                    amplitude: max,
                    sigma: std,
                };
                let (x, report) = solve_lm(&problem, DVector::from_element(1, center), &self.opts);
                let params = GaussianParams {
                    amplitude: max,
                    mean: x[0],
                    sigma: std,
                };
                (params, report)
            }
        };

        let fit = PeakFit {
            params,
            evaluations: report.evaluations,
            final_cost: report.final_cost,
        };
        let accepted = report.converged
            && match self.model {
                FitModel::ThreeParameter => is_peak_fit(&fit, profile, max),
                FitModel::OneParameter => fit.params.mean.is_finite(),
            };
        if !accepted {
            return Err(FitError::FitDivergence {
                evaluations: report.evaluations,
            });
        }
        Ok(fit)
    }
}

/// `false` for free fits that converged onto something other than a peak,
/// such as a zero-amplitude curve parked anywhere along the profile.
fn is_peak_fit(fit: &PeakFit, profile: &[f64], max: f64) -> bool {
    let GaussianParams {
        amplitude,
        mean,
        sigma,
    } = fit.params;
    let flat_cost = 0.5
        * profile
            .iter()
            .filter(|v| !v.is_nan())
            .map(|v| v * v)
            .sum::<f64>();

    mean.is_finite()
        && sigma.is_finite()
        && sigma > 0.0
        && amplitude.is_finite()
        && amplitude > MIN_AMPLITUDE_RATIO * max
        && fit.final_cost.is_finite()
        && fit.final_cost < MIN_COST_REDUCTION * flat_cost
}

impl Default for PeakEstimator {
    fn default() -> Self {
        Self::new(FitModel::default(), DEFAULT_MAX_EVALUATIONS)
    }
}

/// Residual `model(x_i) - y_i`, or `None` if any entry is not finite.
fn residual_vector(y: &[f64], params: &GaussianParams) -> Option<DVector<f64>> {
    if params.sigma == 0.0 {
        return None;
    }
    let r = DVector::from_iterator(
        y.len(),
        y.iter()
            .enumerate()
            .map(|(i, &yi)| params.eval(i as f64) - if yi.is_nan() { 0.0 } else { yi }),
    );
    r.iter().all(|v| v.is_finite()).then_some(r)
}

// x = [amplitude, mean, sigma]
struct GaussianProblem3<'a> {
    y: &'a [f64],
}

impl NllsProblem for GaussianProblem3<'_> {
    fn residuals(&self, x: &DVector<f64>) -> Option<DVector<f64>> {
        residual_vector(
            self.y,
            &GaussianParams {
                amplitude: x[0],
                mean: x[1],
                sigma: x[2],
            },
        )
    }

    fn jacobian(&self, x: &DVector<f64>) -> Option<DMatrix<f64>> {
        let (a, mu, s) = (x[0], x[1], x[2]);
        if s == 0.0 {
            return None;
        }
        let s2 = s * s;
        let j = DMatrix::from_fn(self.y.len(), 3, |i, col| {
            let d = i as f64 - mu;
            let e = (-(d * d) / (2.0 * s2)).exp();
            match col {
                0 => e,
                1 => a * e * d / s2,
                _ => a * e * d * d / (s2 * s),
            }
        });
        j.iter().all(|v| v.is_finite()).then_some(j)
    }
}

// x = [mean]
struct GaussianProblem1<'a> {
    y: &'a [f64],
    amplitude: f64,
    sigma: f64,
}

impl NllsProblem for GaussianProblem1<'_> {
    fn residuals(&self, x: &DVector<f64>) -> Option<DVector<f64>> {
        residual_vector(
            self.y,
            &GaussianParams {
                amplitude: self.amplitude,
                mean: x[0],
                sigma: self.sigma,
            },
        )
    }

    fn jacobian(&self, x: &DVector<f64>) -> Option<DMatrix<f64>> {
        let s2 = self.sigma * self.sigma;
        let j = DMatrix::from_fn(self.y.len(), 1, |i, _| {
            let d = i as f64 - x[0];
            self.amplitude * (-(d * d) / (2.0 * s2)).exp() * d / s2
        });
        j.iter().all(|v| v.is_finite()).then_some(j)
    }
}
