//! Validated engine configuration.
//!
//! A `Config` is immutable once constructed: every field is checked, and
//! fields with a sensible default range are clamped rather than rejected, at
//! construction time, and the values derived from it (`frame_len`, `delay`,
//! fade tables, Gaussian sigma) are computed once and never recomputed.

use crate::error::{Error, Result};
use crate::math::limit;

/// Channel count range, inclusive.
pub const CHANNELS_RANGE: std::ops::RangeInclusive<u32> = 1..=8;
/// Sample rate range in Hz, inclusive.
pub const SAMPLE_RATE_RANGE: std::ops::RangeInclusive<u32> = 11025..=192_000;
/// Frame length range in milliseconds, inclusive.
pub const FRAME_LEN_MS_RANGE: std::ops::RangeInclusive<u32> = 10..=8000;
/// Derived frame length (in samples) range, inclusive.
pub const FRAME_LEN_SAMPLES_RANGE: std::ops::RangeInclusive<u32> = 32..=2_097_152;
/// Filter window range, inclusive; must also be odd.
pub const FILTER_SIZE_RANGE: std::ops::RangeInclusive<u32> = 3..=301;
/// Target peak range, inclusive.
pub const PEAK_RANGE: std::ops::RangeInclusive<f64> = 0.01..=1.0;
/// Maximum gain range, inclusive.
pub const MAX_GAIN_RANGE: std::ops::RangeInclusive<f64> = 1.0..=100.0;
/// Target RMS range, inclusive.
pub const TARGET_RMS_RANGE: std::ops::RangeInclusive<f64> = 0.0..=1.0;
/// Compression factor range, inclusive (besides the sentinel value `0.0`,
/// which disables compression).
pub const COMPRESS_FACTOR_RANGE: std::ops::RangeInclusive<f64> = 1.0..=30.0;

/// Validated engine parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    channels: u32,
    sample_rate: u32,
    frame_len_ms: u32,
    filter_size: u32,
    peak: f64,
    max_gain: f64,
    target_rms: f64,
    compress_factor: f64,
    channels_coupled: bool,
    dc_correction: bool,
    alt_boundary_mode: bool,

    frame_len: u32,
    delay: u64,
}

impl Default for Config {
    /// A half-second frame, a 31-tap filter window, -0.4 dBFS peak, 20 dB
    /// of headroom, and
    /// no RMS targeting, DC correction, or compression.
    fn default() -> Self {
        Self::new(2, 44100, 500, 31, 0.95, 10.0, 0.0, 0.0, true, false, false)
            .expect("default configuration is always valid")
    }
}

impl Config {
    /// Validates and derives a configuration. Channel count, sample rate,
    /// and the resulting frame length in samples are rejected outright if
    /// out of range; the remaining numeric parameters are clamped into
    /// range instead.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channels: u32,
        sample_rate: u32,
        frame_len_ms: u32,
        filter_size: u32,
        peak: f64,
        max_gain: f64,
        target_rms: f64,
        compress_factor: f64,
        channels_coupled: bool,
        dc_correction: bool,
        alt_boundary_mode: bool,
    ) -> Result<Self> {
        if !CHANNELS_RANGE.contains(&channels) {
            return Err(Error::ConfigurationInvalid(format!(
                "channels must be in {CHANNELS_RANGE:?}, got {channels}"
            )));
        }
        if !SAMPLE_RATE_RANGE.contains(&sample_rate) {
            return Err(Error::ConfigurationInvalid(format!(
                "sample_rate must be in {SAMPLE_RATE_RANGE:?}, got {sample_rate}"
            )));
        }
        if !FRAME_LEN_MS_RANGE.contains(&frame_len_ms) {
            return Err(Error::ConfigurationInvalid(format!(
                "frame_len_ms must be in {FRAME_LEN_MS_RANGE:?}, got {frame_len_ms}"
            )));
        }

        let frame_len = frame_size(sample_rate, frame_len_ms);
        if !FRAME_LEN_SAMPLES_RANGE.contains(&frame_len) {
            return Err(Error::ConfigurationInvalid(format!(
                "resulting frame length {frame_len} samples is out of the \
                 {FRAME_LEN_SAMPLES_RANGE:?} range; raise frame_len_ms or sample_rate"
            )));
        }

        let filter_size = filter_size.clamp(*FILTER_SIZE_RANGE.start(), *FILTER_SIZE_RANGE.end());
        let filter_size = if filter_size % 2 == 0 { filter_size + 1 } else { filter_size };

        let peak = limit(*PEAK_RANGE.start(), peak, *PEAK_RANGE.end());
        let max_gain = limit(*MAX_GAIN_RANGE.start(), max_gain, *MAX_GAIN_RANGE.end());
        let target_rms = limit(*TARGET_RMS_RANGE.start(), target_rms, *TARGET_RMS_RANGE.end());
        let compress_factor = if compress_factor > f64::EPSILON {
            limit(*COMPRESS_FACTOR_RANGE.start(), compress_factor, *COMPRESS_FACTOR_RANGE.end())
        } else {
            0.0
        };

        let delay = u64::from(frame_len) * u64::from(filter_size);

        Ok(Self {
            channels,
            sample_rate,
            frame_len_ms,
            filter_size,
            peak,
            max_gain,
            target_rms,
            compress_factor,
            channels_coupled,
            dc_correction,
            alt_boundary_mode,
            frame_len,
            delay,
        })
    }

    #[must_use]
    pub fn channels(&self) -> u32 {
        self.channels
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[must_use]
    pub fn frame_len_ms(&self) -> u32 {
        self.frame_len_ms
    }

    #[must_use]
    pub fn filter_size(&self) -> u32 {
        self.filter_size
    }

    #[must_use]
    pub fn peak(&self) -> f64 {
        self.peak
    }

    #[must_use]
    pub fn max_gain(&self) -> f64 {
        self.max_gain
    }

    #[must_use]
    pub fn target_rms(&self) -> f64 {
        self.target_rms
    }

    #[must_use]
    pub fn compress_factor(&self) -> f64 {
        self.compress_factor
    }

    #[must_use]
    pub fn channels_coupled(&self) -> bool {
        self.channels_coupled
    }

    #[must_use]
    pub fn dc_correction(&self) -> bool {
        self.dc_correction
    }

    #[must_use]
    pub fn alt_boundary_mode(&self) -> bool {
        self.alt_boundary_mode
    }

    /// Derived frame length in samples (`N`), rounded up to an even number.
    #[must_use]
    pub fn frame_len(&self) -> u32 {
        self.frame_len
    }

    /// Declared fixed delay in samples (`D = N * filter_size`).
    #[must_use]
    pub fn delay(&self) -> u64 {
        self.delay
    }

    /// Standard deviation of the Gaussian smoothing filter, derived from the
    /// filter window so that the window's half-width is roughly three
    /// standard deviations.
    #[must_use]
    pub fn sigma(&self) -> f64 {
        ((f64::from(self.filter_size) / 2.0) - 1.0) / 3.0 + (1.0 / 3.0)
    }
}

fn frame_size(sample_rate: u32, frame_len_ms: u32) -> u32 {
    let frame_size = (f64::from(sample_rate) * (f64::from(frame_len_ms) / 1000.0)).round() as u32;
    frame_size + (frame_size % 2)
}
