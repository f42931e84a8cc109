use bb_core::{Image, ImageView};
use bb_fit::PeakEstimator;
use bb_profile::{ProfileSmoother, extract_profile_u8, scope_strip};
use log::{debug, warn};
use thiserror::Error;

use crate::config::{PipelineConfig, SharedConfig};
use crate::gate::ReadyGate;
use crate::units::{CalibratedSample, GeometryError, UnitConverter};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("invalid sensor geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),
}

/// Result of one accepted frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub sample: CalibratedSample,
    /// Normalized profile the peak was fitted on, values in `[0, 255]`.
    pub smoothed: Vec<f64>,
    /// `false` when the peak fell back to the `0.0` sentinel.
    pub peak_found: bool,
}

impl FrameAnalysis {
    /// Value to record in a rotation trace: the offset in microns, or `NaN`
    /// when no peak was found so the sample reads as a gap.
    pub fn trace_value(&self) -> f64 {
        if self.peak_found {
            self.sample.physical_offset_microns
        } else {
            f64::NAN
        }
    }

    /// Display strip of the normalized profile.
    pub fn scope(&self) -> Result<Image<u8>, bb_core::Error> {
        scope_strip(&self.smoothed)
    }
}

/// The four per-frame stages with their reusable buffers.
#[derive(Debug, Clone)]
pub struct FrameStages {
    smoother: ProfileSmoother,
    estimator: PeakEstimator,
}

impl FrameStages {
    pub fn new(cfg: &PipelineConfig) -> Self {
        Self {
            smoother: ProfileSmoother::new(cfg.smoothing_radius),
            estimator: PeakEstimator::new(cfg.fit_model, cfg.max_evaluations),
        }
    }

    pub fn configure(&mut self, cfg: &PipelineConfig) {
        self.smoother.set_radius(cfg.smoothing_radius);
        if self.estimator.model() != cfg.fit_model
            || self.estimator.max_evaluations() != cfg.max_evaluations
        {
            self.estimator = PeakEstimator::new(cfg.fit_model, cfg.max_evaluations);
        }
    }

    /// Runs all stages on `frame` with `cfg`.
    ///
    /// `Ok(None)` means the frame had zero area and was dropped.
    pub fn run(
        &mut self,
        frame: &ImageView<'_, u8>,
        cfg: &PipelineConfig,
    ) -> Result<Option<FrameAnalysis>, PipelineError> {
        self.configure(cfg);

        let Some(profile) = extract_profile_u8(frame, cfg.axis) else {
            debug!(
                "dropping zero-area frame {}x{}",
                frame.width(),
                frame.height()
            );
            return Ok(None);
        };

        let converter = UnitConverter::new(cfg.sensor_size_mm, cfg.sign).inspect_err(|err| {
            warn!("rejecting frame: {err}");
        })?;

        let smoothed = self.smoother.smooth(&profile);
        let (pixel_position, peak_found) = match self.estimator.fit(&smoothed) {
            Ok(fit) => (fit.peak(), true),
            Err(err) => {
                debug!("no peak in frame: {err}");
                (0.0, false)
            }
        };

        let sample = converter.calibrate(pixel_position, profile.len())?;
        Ok(Some(FrameAnalysis {
            sample,
            smoothed,
            peak_found,
        }))
    }
}

/// Synchronous single-flight pipeline.
///
/// `submit_frame` may be called from any number of threads; only one frame
/// is processed at a time and the rest are dropped.
#[derive(Debug, Clone, Default)]
pub struct FrameAnalysisPipeline {
    config: SharedConfig,
    gate: ReadyGate,
}

impl FrameAnalysisPipeline {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            config,
            gate: ReadyGate::new(),
        }
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn gate(&self) -> &ReadyGate {
        &self.gate
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Processes `frame` if no other frame is in flight.
    ///
    /// Returns `Ok(None)` when the frame was dropped (busy or zero-area).
    pub fn submit_frame(
        &self,
        frame: &ImageView<'_, u8>,
    ) -> Result<Option<FrameAnalysis>, PipelineError> {
        let Some(_permit) = self.gate.try_acquire() else {
            debug!("pipeline busy, dropping frame");
            return Ok(None);
        };

        let cfg = self.config.snapshot();
        FrameStages::new(&cfg).run(frame, &cfg)
    }
}
