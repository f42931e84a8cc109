use std::sync::{Arc, PoisonError, RwLock};

use bb_fit::{DEFAULT_MAX_EVALUATIONS, FitModel};
use bb_profile::ProfileAxis;
use serde::{Deserialize, Serialize};

use crate::units::SignConvention;

/// Sensor geometry and stage parameters for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Physical sensor extent along the profile axis, in millimeters.
    pub sensor_size_mm: f64,
    /// Boxcar half-width; `0` disables smoothing.
    pub smoothing_radius: usize,
    pub fit_model: FitModel,
    /// Hard cap on model evaluations per fit.
    pub max_evaluations: usize,
    pub axis: ProfileAxis,
    pub sign: SignConvention,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sensor_size_mm: 0.0,
            smoothing_radius: 0,
            fit_model: FitModel::ThreeParameter,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
            axis: ProfileAxis::Rows,
            sign: SignConvention::TowardEnd,
        }
    }
}

/// Cloneable handle to the operator-adjustable configuration.
///
/// Readers take a [`snapshot`](Self::snapshot) at frame start and never see a
/// half-applied edit.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<PipelineConfig>>,
}

impl SharedConfig {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn snapshot(&self) -> PipelineConfig {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut PipelineConfig)) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }

    pub fn replace(&self, config: PipelineConfig) {
        self.update(|cfg| *cfg = config);
    }
}
