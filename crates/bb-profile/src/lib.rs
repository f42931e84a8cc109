//! 1D intensity profile stages for line-scan metrology.
//!
//! Coordinates follow pixel-center convention: sample `profile[i]` describes
//! sensor line `i`.
//!
//! Stages, in pipeline order:
//! - [`extract_profile_u8`] averages a frame across one axis.
//! - [`ProfileSmoother`] boxcar-smooths with "valid" convolution, resamples
//!   back to the original length, then rescales into `[0, 255]`.
//! - [`scope_strip`] renders the normalized profile as a bar strip for
//!   display.
//!
//! A flat profile (max == min) normalizes to all zeros, never NaN.

pub mod conv1d;
pub mod extract;
pub mod kernels1d;
pub mod scope;
pub mod smooth;

pub use extract::{ProfileAxis, extract_profile_u8};
pub use kernels1d::BoxcarKernel1D;
pub use scope::{SCOPE_LEVEL, SCOPE_WIDTH, scope_strip};
pub use smooth::{NORMALIZED_MAX, ProfileSmoother, normalize_to_u8_range, resample_linear};
