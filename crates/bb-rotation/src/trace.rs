use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TRACE_MAGIC: [u8; 4] = *b"BBTR";
pub const TRACE_VERSION: u8 = 1;

const HEADER_LEN: usize = 16;
const SAMPLE_LEN: usize = std::mem::size_of::<f64>();

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace i/o: {0}")]
    Io(#[from] io::Error),
    #[error("not a rotation trace (magic {0:?})")]
    BadMagic([u8; 4]),
    #[error("unsupported trace version {0}")]
    UnsupportedVersion(u8),
    #[error("truncated trace: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("{0} unexpected bytes after trace payload")]
    TrailingBytes(usize),
}

/// One rotation's worth of calibrated offsets, in acquisition order.
///
/// Blob layout (all little-endian):
///
/// | offset | size  | field                  |
/// |--------|-------|------------------------|
/// | 0      | 4     | magic `BBTR`           |
/// | 4      | 1     | version (`1`)          |
/// | 5      | 3     | reserved, zero         |
/// | 8      | 8     | sample count `u64`     |
/// | 16     | 8 * n | samples, IEEE-754 f64  |
///
/// Samples are stored by bit pattern, so NaN payloads and signed zeros
/// survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RotationTrace {
    values: Vec<f64>,
}

impl RotationTrace {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.values.len() * SAMPLE_LEN);
        out.extend_from_slice(&TRACE_MAGIC);
        out.push(TRACE_VERSION);
        out.extend_from_slice(&[0u8; 3]);
        out.extend_from_slice(&(self.values.len() as u64).to_le_bytes());
        for v in &self.values {
            out.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TraceError> {
        if bytes.len() < HEADER_LEN {
            return Err(TraceError::Truncated {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let (header, payload) = bytes.split_at(HEADER_LEN);

        let magic = [header[0], header[1], header[2], header[3]];
        if magic != TRACE_MAGIC {
            return Err(TraceError::BadMagic(magic));
        }
        if header[4] != TRACE_VERSION {
            return Err(TraceError::UnsupportedVersion(header[4]));
        }

        let mut count = [0u8; 8];
        count.copy_from_slice(&header[8..16]);
        let count = u64::from_le_bytes(count);

        let expected = usize::try_from(count)
            .ok()
            .and_then(|n| n.checked_mul(SAMPLE_LEN))
            .unwrap_or(usize::MAX);
        if payload.len() < expected {
            return Err(TraceError::Truncated {
                expected: HEADER_LEN.saturating_add(expected),
                actual: bytes.len(),
            });
        }
        if payload.len() > expected {
            return Err(TraceError::TrailingBytes(payload.len() - expected));
        }

        let values = payload
            .chunks_exact(SAMPLE_LEN)
            .map(|chunk| {
                let mut raw = [0u8; SAMPLE_LEN];
                raw.copy_from_slice(chunk);
                f64::from_bits(u64::from_le_bytes(raw))
            })
            .collect();
        Ok(Self { values })
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), TraceError> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, TraceError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TraceError> {
        fs::write(path, self.to_bytes())?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        Self::from_bytes(&fs::read(path)?)
    }
}

impl From<Vec<f64>> for RotationTrace {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<f64> for RotationTrace {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Extend<f64> for RotationTrace {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}
