//! Frame-to-sample measurement pipeline for ballbar checks.
//!
//! Stage order per accepted frame:
//! 1. profile extraction (mean per sensor line),
//! 2. boxcar smoothing + resampling + normalization,
//! 3. Gaussian peak fit,
//! 4. pixel-to-micron conversion about the frame center.
//!
//! Delivery policy:
//! - A [`ReadyGate`] admits at most one frame at a time. Frames offered while
//!   a frame is in flight are dropped, never queued.
//! - Configuration lives in a [`SharedConfig`]; each frame takes a snapshot
//!   when it starts, so edits apply from the next frame on.
//! - [`FrameAnalysisPipeline::submit_frame`] runs on the calling thread;
//!   [`PipelineWorker`] runs the same stages on one dedicated thread.
//!
//! Degenerate profiles and fit failures yield a sample at the sentinel peak
//! `0.0`. Invalid sensor geometry is returned as an error.

mod config;
mod gate;
mod pipeline;
mod units;
mod worker;

pub use config::{PipelineConfig, SharedConfig};
pub use gate::{GatePermit, ReadyGate};
pub use pipeline::{FrameAnalysis, FrameAnalysisPipeline, FrameStages, PipelineError};
pub use units::{CalibratedSample, DisplayUnit, GeometryError, SignConvention, UnitConverter};
pub use worker::{PipelineWorker, WorkerEvent};
