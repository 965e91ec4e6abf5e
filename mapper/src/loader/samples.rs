use anyhow::{bail, Context};
use byteorder::{ByteOrder, LittleEndian};
use reflectcore::survey::Waveform;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk layout of a sample file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    /// Interleaved little-endian `f32` I/Q pairs as the radio records them.
    /// Only the in-phase part is kept.
    #[default]
    ComplexF32,
    /// Plain little-endian `f32` samples.
    RealF32,
}

impl SampleFormat {
    fn values_per_sample(self) -> usize {
        match self {
            SampleFormat::ComplexF32 => 2,
            SampleFormat::RealF32 => 1,
        }
    }
}

pub fn decode_samples(bytes: &[u8], format: SampleFormat) -> anyhow::Result<Vec<f64>> {
    let record = format.values_per_sample() * 4;
    if bytes.len() % record != 0 {
        bail!(
            "{} bytes is not a whole number of {}-byte {:?} samples",
            bytes.len(),
            record,
            format
        );
    }

    let mut values = vec![0.0f32; bytes.len() / 4];
    LittleEndian::read_f32_into(bytes, &mut values);
    Ok(values
        .chunks_exact(format.values_per_sample())
        .map(|chunk| f64::from(chunk[0]))
        .collect())
}

pub fn load_waveform<P: AsRef<Path>>(
    path: P,
    format: SampleFormat,
    sample_rate: f64,
) -> anyhow::Result<Waveform> {
    let path_ref = path.as_ref();
    let bytes =
        fs::read(path_ref).with_context(|| format!("reading samples {}", path_ref.display()))?;
    let samples = decode_samples(&bytes, format)
        .with_context(|| format!("decoding samples {}", path_ref.display()))?;
    let waveform = Waveform::new(samples, sample_rate)
        .with_context(|| format!("validating samples {}", path_ref.display()))?;
    Ok(waveform)
}
