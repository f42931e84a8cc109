//! Synthetic ballbar rig.
//!
//! Renders the frames a line sensor would see while the arm sweeps one
//! clockwise and one counterclockwise pass, separated by parked dwells. The
//! arm deviation is modeled as eccentricity plus ovality:
//! `e·cos θ + o·cos 2θ` microns.

use std::f64::consts::TAU;

use bb_core::{Error, Image};

const BACKGROUND: f64 = 8.0;
const STRIPE_PEAK: f64 = 240.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticRig {
    pub width: usize,
    pub height: usize,
    /// Sensor extent along the rows, in millimeters.
    pub sensor_size_mm: f64,
    pub stripe_sigma_px: f64,
    pub eccentricity_um: f64,
    pub ovality_um: f64,
    /// Offset while the arm is parked between passes.
    pub parked_offset_um: f64,
}

impl Default for SyntheticRig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 480,
            sensor_size_mm: 4.8,
            stripe_sigma_px: 5.0,
            eccentricity_um: 12.0,
            ovality_um: 4.0,
            parked_offset_um: 900.0,
        }
    }
}

impl SyntheticRig {
    pub fn microns_per_row(&self) -> f64 {
        self.sensor_size_mm * 1000.0 / self.height as f64
    }

    /// Arm deviation at angle `theta`, in microns.
    pub fn deviation_um(&self, theta: f64) -> f64 {
        self.eccentricity_um * theta.cos() + self.ovality_um * (2.0 * theta).cos()
    }

    /// Expected deviation of sample `i` of an `n`-sample pass.
    pub fn expected_pass(&self, samples_per_pass: usize) -> Vec<f64> {
        (0..samples_per_pass)
            .map(|i| self.deviation_um(TAU * i as f64 / samples_per_pass as f64))
            .collect()
    }

    /// Horizontal stripe whose center sits `offset_um` past the sensor center.
    pub fn frame_at_offset(&self, offset_um: f64) -> Result<Image<u8>, Error> {
        let center = self.height as f64 / 2.0 + offset_um / self.microns_per_row();
        let two_s2 = 2.0 * self.stripe_sigma_px * self.stripe_sigma_px;

        let mut img = Image::new_fill(self.width, self.height, 0u8)?;
        for y in 0..self.height {
            let d = y as f64 - center;
            let v = BACKGROUND + (STRIPE_PEAK - BACKGROUND) * (-(d * d) / two_s2).exp();
            img.row_mut(y).fill(v.round().clamp(0.0, 255.0) as u8);
        }
        Ok(img)
    }

    /// `dwell` parked frames, a clockwise pass, `dwell` parked frames, a
    /// counterclockwise pass, and `dwell` parked frames.
    ///
    /// The clockwise pass visits the angles in descending order, so reversing
    /// it lines it up with [`expected_pass`](Self::expected_pass).
    pub fn rotation_frames(
        &self,
        samples_per_pass: usize,
        dwell: usize,
    ) -> Result<Vec<Image<u8>>, Error> {
        let expected = self.expected_pass(samples_per_pass);
        let parked = self.frame_at_offset(self.parked_offset_um)?;

        let mut frames = Vec::with_capacity(2 * samples_per_pass + 3 * dwell);
        frames.extend(std::iter::repeat_n(parked.clone(), dwell));
        for &d in expected.iter().rev() {
            frames.push(self.frame_at_offset(d)?);
        }
        frames.extend(std::iter::repeat_n(parked.clone(), dwell));
        for &d in &expected {
            frames.push(self.frame_at_offset(d)?);
        }
        frames.extend(std::iter::repeat_n(parked, dwell));
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::SyntheticRig;

    #[test]
    fn deviation_model() {
        let rig = SyntheticRig::default();
        assert_abs_diff_eq!(rig.deviation_um(0.0), 16.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            rig.deviation_um(std::f64::consts::PI),
            -8.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(rig.microns_per_row(), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn frame_peak_follows_offset() {
        let rig = SyntheticRig::default();
        let img = rig.frame_at_offset(300.0).unwrap();
        let brightest = (0..img.height())
            .max_by_key(|&y| img.as_view().row(y)[0])
            .unwrap();
        assert_eq!(brightest, 270);
    }

    #[test]
    fn rotation_layout() {
        let rig = SyntheticRig::default();
        let frames = rig.rotation_frames(10, 3).unwrap();
        assert_eq!(frames.len(), 29);
        assert_eq!(frames[0], frames[28]);
    }
}
