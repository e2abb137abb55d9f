//! Audio test file generation
//!
//! Deterministic WAV fixtures with known duration for exercising the file
//! provider end to end.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;

/// Low sample rate keeps fixtures small; duration is what the tests check
const TEST_SAMPLE_RATE: u32 = 8000;

fn spec() -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate: TEST_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Generate a silent mono WAV file of `duration_ms`
pub fn generate_silent_wav<P: AsRef<Path>>(path: P, duration_ms: u64) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, spec())?;
    let total_frames = (TEST_SAMPLE_RATE as u64 * duration_ms) / 1000;

    for _ in 0..total_frames {
        writer.write_sample(0i16)?;
    }

    writer.finalize()
}

/// Generate a mono sine wave WAV file
///
/// `amplitude` is 0.0-1.0 of full scale.
pub fn generate_sine_wav<P: AsRef<Path>>(
    path: P,
    duration_ms: u64,
    frequency_hz: f32,
    amplitude: f32,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, spec())?;
    let total_frames = (TEST_SAMPLE_RATE as u64 * duration_ms) / 1000;
    let peak = amplitude.clamp(0.0, 1.0) * i16::MAX as f32;

    for n in 0..total_frames {
        let t = n as f32 / TEST_SAMPLE_RATE as f32;
        let sample = (2.0 * PI * frequency_hz * t).sin() * peak;
        writer.write_sample(sample as i16)?;
    }

    writer.finalize()
}
