//! Rotation-level processing for ballbar checks.
//!
//! A [`RotationTrace`] is the ordered list of calibrated offsets collected
//! while the arm travels a full circuit in both directions. This crate:
//! - persists traces as a small little-endian binary blob ([`trace`]),
//! - splits a trace into clockwise and counterclockwise passes
//!   ([`SegmentClassifier`]),
//! - maps a pass onto a closed polar curve and summarizes its roundness
//!   ([`polar`]).

pub mod polar;
pub mod segment;
pub mod trace;

pub use polar::{PassReport, RoundnessSummary, polar_samples};
pub use segment::{
    ClassifiedRotation, ClassifierConfig, DEFAULT_THRESHOLD, Segment, SegmentClassifier,
    SegmentPolicy, SegmentationError, segments,
};
pub use trace::{RotationTrace, TRACE_MAGIC, TRACE_VERSION, TraceError};
