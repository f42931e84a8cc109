//! Umbrella crate for the ballbar workspace.
//!
//! Re-exports the frame pipeline and rotation analysis crates, plus a
//! [`synth`] rig for generating sensor frames without hardware.

pub use bb_core::*;
pub use bb_fit::*;
pub use bb_pipeline::*;
pub use bb_profile::*;
pub use bb_rotation::*;

pub mod synth;
