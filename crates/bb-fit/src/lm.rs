use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{DMatrix, DVector, Dyn, storage::Owned};

/// Dense non-linear least-squares problem.
///
/// Returning `None` aborts the solve; use it for parameters where the model
/// cannot be evaluated (e.g. non-finite residuals).
pub trait NllsProblem {
    fn residuals(&self, x: &DVector<f64>) -> Option<DVector<f64>>;
    fn jacobian(&self, x: &DVector<f64>) -> Option<DMatrix<f64>>;
}

#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    /// Hard cap on residual evaluations.
    ///
    /// Converted to MINPACK patience as `max_evaluations / (n + 1)`, so the
    /// solver can never evaluate more than this many times.
    pub max_evaluations: usize,
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 800,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LmReport {
    pub evaluations: usize,
    pub final_cost: f64,
    pub converged: bool,
}

struct LmWrapper<'a, P: NllsProblem> {
    problem: &'a P,
    params: DVector<f64>,
}

impl<P: NllsProblem> LeastSquaresProblem<f64, Dyn, Dyn> for LmWrapper<'_, P> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, x: &DVector<f64>) {
        self.params.clone_from(x);
    }

    fn params(&self) -> DVector<f64> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        self.problem.residuals(&self.params)
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        self.problem.jacobian(&self.params)
    }
}

/// Runs Levenberg-Marquardt from `x0`.
pub fn solve_lm<P: NllsProblem>(
    problem: &P,
    x0: DVector<f64>,
    opts: &LmOptions,
) -> (DVector<f64>, LmReport) {
    let n = x0.len();
    let patience = (opts.max_evaluations / (n + 1)).max(1);

    let lm = LevenbergMarquardt::new()
        .with_ftol(opts.ftol)
        .with_xtol(opts.xtol)
        .with_gtol(opts.gtol)
        .with_patience(patience);

    let wrapper = LmWrapper {
        problem,
        params: x0,
    };

    let (wrapper, report) = lm.minimize(wrapper);
    let converged = report.termination.was_successful()
        && report.number_of_evaluations <= opts.max_evaluations;

    (
        wrapper.params,
        LmReport {
            evaluations: report.number_of_evaluations,
            final_cost: report.objective_function,
            converged,
        },
    )
}
