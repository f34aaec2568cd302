//! Stereo WAV output.

use std::path::Path;

use anyhow::Context;
use hound::{SampleFormat, WavSpec, WavWriter};
use patchwire_core::StereoBuffer;

/// Writes interleaved stereo at `bits_per_sample` (16, 24 or 32-bit float).
pub fn write_stereo(
    path: &Path,
    audio: &StereoBuffer,
    sample_rate: u32,
    bits_per_sample: u16,
) -> anyhow::Result<()> {
    if !matches!(bits_per_sample, 16 | 24 | 32) {
        anyhow::bail!("unsupported bit depth {bits_per_sample} (expected 16, 24 or 32)");
    }
    let spec = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample,
        sample_format: if bits_per_sample == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("creating {}", path.display()))?;

    if bits_per_sample == 32 {
        for (&l, &r) in audio.left.iter().zip(&audio.right) {
            writer.write_sample(l)?;
            writer.write_sample(r)?;
        }
    } else {
        let max_val = (1i32 << (bits_per_sample - 1)) as f32;
        let quantize = |x: f32| (x * max_val).clamp(-max_val, max_val - 1.0) as i32;
        for (&l, &r) in audio.left.iter().zip(&audio.right) {
            writer.write_sample(quantize(l))?;
            writer.write_sample(quantize(r))?;
        }
    }
    writer.finalize()?;
    Ok(())
}
