use crate::rational::Rational;
use serde::Serialize;

/// Unit for sampling frequencies, using the NISO Z39.87 codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SamplingFrequencyUnit {
    NoUnit,
    Inch,
    Centimeter,
}

impl SamplingFrequencyUnit {
    pub fn code(&self) -> u8 {
        match self {
            SamplingFrequencyUnit::NoUnit => 1,
            SamplingFrequencyUnit::Inch => 2,
            SamplingFrequencyUnit::Centimeter => 3,
        }
    }
}

/// Calibrated image properties collected while one file is decoded.
///
/// Created fresh for every decode session and handed to each interpreter
/// by mutable reference. Each field is written by at most one box type, so
/// last writer wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageMetadata {
    pub image_width: Option<u32>,
    pub image_length: Option<u32>,
    pub samples_per_pixel: Option<u16>,
    pub bits_per_sample: Option<u8>,
    /// Horizontal sampling frequency.
    pub x_sampling_frequency: Option<Rational>,
    /// Vertical sampling frequency.
    pub y_sampling_frequency: Option<Rational>,
    pub sampling_frequency_unit: Option<SamplingFrequencyUnit>,
}

impl ImageMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == ImageMetadata::default()
    }
}
