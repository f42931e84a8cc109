use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MICRONS_PER_MM: f64 = 1000.0;
const INCHES_PER_MM: f64 = 0.0393701;

/// Which pixel direction yields positive offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignConvention {
    /// Offsets grow with the pixel index.
    #[default]
    TowardEnd,
    /// Offsets grow toward pixel index 0.
    TowardStart,
}

impl SignConvention {
    fn factor(self) -> f64 {
        match self {
            SignConvention::TowardEnd => 1.0,
            SignConvention::TowardStart => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("frame pixel size must be positive")]
    ZeroPixelSize,
    #[error("sensor size must be finite and non-negative, got {0} mm")]
    InvalidSensorSize(f64),
}

/// One calibrated measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibratedSample {
    /// Sub-pixel peak row; `0.0` when no peak was found.
    pub pixel_position: f64,
    /// Signed displacement from the frame center, in microns.
    pub physical_offset_microns: f64,
}

/// Maps pixel positions to microns relative to the frame center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    sensor_size_mm: f64,
    sign: SignConvention,
}

impl UnitConverter {
    /// `sensor_size_mm == 0` is accepted and maps every position to `0`.
    pub fn new(sensor_size_mm: f64, sign: SignConvention) -> Result<Self, GeometryError> {
        if !sensor_size_mm.is_finite() || sensor_size_mm < 0.0 {
            return Err(GeometryError::InvalidSensorSize(sensor_size_mm));
        }
        Ok(Self {
            sensor_size_mm,
            sign,
        })
    }

    pub fn sensor_size_mm(&self) -> f64 {
        self.sensor_size_mm
    }

    pub fn microns_per_pixel(&self, frame_pixel_size: usize) -> Result<f64, GeometryError> {
        if frame_pixel_size == 0 {
            return Err(GeometryError::ZeroPixelSize);
        }
        Ok(self.sensor_size_mm / frame_pixel_size as f64 * MICRONS_PER_MM)
    }

    /// `(p * k) - (n/2 * k)` with `k` microns per pixel, so `p == n/2` maps
    /// to exactly zero.
    pub fn to_microns(
        &self,
        pixel_position: f64,
        frame_pixel_size: usize,
    ) -> Result<f64, GeometryError> {
        let k = self.microns_per_pixel(frame_pixel_size)?;
        let center = frame_pixel_size as f64 / 2.0;
        let offset = pixel_position * k - center * k;
        Ok(self.sign.factor() * offset)
    }

    pub fn calibrate(
        &self,
        pixel_position: f64,
        frame_pixel_size: usize,
    ) -> Result<CalibratedSample, GeometryError> {
        Ok(CalibratedSample {
            pixel_position,
            physical_offset_microns: self.to_microns(pixel_position, frame_pixel_size)?,
        })
    }
}

/// Operator-facing unit for printing offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayUnit {
    #[default]
    Microns,
    Millimeters,
    /// Inches with four decimals.
    Inches4,
    /// Inches with five decimals.
    Inches5,
}

impl DisplayUnit {
    pub fn format(self, microns: f64) -> String {
        let mm = microns / MICRONS_PER_MM;
        match self {
            DisplayUnit::Microns => format!("{microns:.2}μm"),
            DisplayUnit::Millimeters => format!("{mm:.2}mm"),
            DisplayUnit::Inches4 => format!("{:.4}\"", mm * INCHES_PER_MM),
            DisplayUnit::Inches5 => format!("{:.5}\"", mm * INCHES_PER_MM),
        }
    }
}

impl FromStr for DisplayUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "um" | "μm" | "microns" => Ok(DisplayUnit::Microns),
            "mm" | "millimeters" => Ok(DisplayUnit::Millimeters),
            "in4" | "inches4" => Ok(DisplayUnit::Inches4),
            "in5" | "inches5" => Ok(DisplayUnit::Inches5),
            other => Err(format!("unknown display unit '{other}'")),
        }
    }
}
