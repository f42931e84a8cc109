use bb_core::{Error, Image};

/// Width of the scope strip, one column per normalized intensity level.
pub const SCOPE_WIDTH: usize = 256;

/// Pixel value used for the lit part of each scope row.
pub const SCOPE_LEVEL: u8 = 128;

/// Renders a normalized profile as a `len x 256` bar strip.
///
/// Row `i` lights its first `floor(profile[i])` columns; values are expected
/// in `[0, 255]` and are clamped otherwise.
pub fn scope_strip(profile: &[f64]) -> Result<Image<u8>, Error> {
    let mut data = vec![0u8; profile.len() * SCOPE_WIDTH];
    for (row, &v) in data.chunks_exact_mut(SCOPE_WIDTH).zip(profile) {
        let lit = if v.is_finite() {
            (v.floor().max(0.0) as usize).min(SCOPE_WIDTH)
        } else {
            0
        };
        row[..lit].fill(SCOPE_LEVEL);
    }

    Image::from_vec(SCOPE_WIDTH, profile.len(), data)
}
