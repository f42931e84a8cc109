//! Foundational primitives for ballbar metrology.
//!
//! ## Frames and Stride
//! Frames are 8-bit grayscale grids stored row-major. `stride` is the
//! distance, in elements, between adjacent row starts and may be greater than
//! `width`, so borrowed views can wrap padded camera buffers without a copy.
//!
//! ## Coordinates
//! Pixel index `i` refers to the center of sensor line `i`. A frame with `n`
//! lines has its geometric center at `n / 2`.
//!
//! ## Polar Samples
//! A closed trace is plotted as `(theta, radius)` pairs with `theta` in
//! `[0, 2π)`; [`PolarSample::to_cartesian`] converts for renderers that only
//! understand `x/y`.

mod error;
mod geom;
mod image;

pub use error::Error;
pub use geom::{Point2d, PolarSample};
pub use image::{Image, ImageView};
