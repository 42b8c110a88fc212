//! Turning a raw microphone recording into Whisper input
//!
//! Whisper wants mono f32 at 16 kHz with a sensible level; capture devices
//! usually run at 44.1 or 48 kHz.

use crate::{Result, SampuranaError};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Sample rate Whisper models are trained on
pub const WHISPER_SAMPLE_RATE: u32 = 16000;

const CHUNK_FRAMES: usize = 1024;

/// Resample mono audio from `input_rate` to `output_rate`
pub fn resample(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == 0 || output_rate == 0 {
        return Err(SampuranaError::ConfigError(
            "Sample rates must be greater than 0".into(),
        ));
    }
    if input.is_empty() || input_rate == output_rate {
        return Ok(input.to_vec());
    }

    let ratio = output_rate as f64 / input_rate as f64;
    let mut resampler = sinc_resampler(ratio)?;

    let expected = (input.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(expected + CHUNK_FRAMES);

    for chunk in input.chunks(CHUNK_FRAMES) {
        // SincFixedIn wants exactly CHUNK_FRAMES per call; the tail is zero-padded.
        let mut frame = vec![0.0f32; CHUNK_FRAMES];
        frame[..chunk.len()].copy_from_slice(chunk);

        let processed = resampler
            .process(&[frame], None)
            .map_err(|e| SampuranaError::AudioProcessingError(format!("Resampling failed: {}", e)))?;
        output.extend_from_slice(&processed[0]);
    }

    output.truncate(expected);
    debug!(
        "Resampled {} samples @ {} Hz -> {} samples @ {} Hz",
        input.len(),
        input_rate,
        output.len(),
        output_rate
    );
    Ok(output)
}

fn sinc_resampler(ratio: f64) -> Result<SincFixedIn<f32>> {
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_FRAMES, 1).map_err(|e| {
        SampuranaError::AudioProcessingError(format!("Failed to create resampler: {}", e))
    })
}

/// Resampler for audio arriving in blocks of any size
///
/// Input is buffered until a full resampler chunk is available, so the
/// output lags the input by less than one chunk.
pub struct StreamResampler {
    resampler: Option<SincFixedIn<f32>>,
    pending: Vec<f32>,
}

impl StreamResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(SampuranaError::ConfigError(
                "Sample rates must be greater than 0".into(),
            ));
        }
        let resampler = if input_rate == output_rate {
            None
        } else {
            Some(sinc_resampler(output_rate as f64 / input_rate as f64)?)
        };
        Ok(Self {
            resampler,
            pending: Vec::with_capacity(CHUNK_FRAMES * 2),
        })
    }

    /// Feed one block; returns whatever output is ready
    pub fn push(&mut self, block: &[f32]) -> Result<Vec<f32>> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(block.to_vec());
        };

        self.pending.extend_from_slice(block);
        let mut output = Vec::new();
        while self.pending.len() >= CHUNK_FRAMES {
            let frame: Vec<f32> = self.pending.drain(..CHUNK_FRAMES).collect();
            let processed = resampler.process(&[frame], None).map_err(|e| {
                SampuranaError::AudioProcessingError(format!("Resampling failed: {}", e))
            })?;
            output.extend_from_slice(&processed[0]);
        }
        Ok(output)
    }
}

/// Scale so the loudest sample sits just below full scale
pub fn normalize_audio(samples: &[f32]) -> Vec<f32> {
    let peak = samples.iter().fold(0.0f32, |max, s| max.max(s.abs()));
    if peak == 0.0 || peak.is_nan() {
        return samples.to_vec();
    }
    let gain = 0.95 / peak;
    samples.iter().map(|s| s * gain).collect()
}

/// Subtract the mean so silence sits at zero
pub fn remove_dc_offset(samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mean = samples.iter().sum::<f32>() / samples.len() as f32;
    samples.iter().map(|s| s - mean).collect()
}

/// Full preparation: resample to 16 kHz, centre and normalise
pub fn prepare_for_whisper(samples: &[f32], input_rate: u32) -> Result<Vec<f32>> {
    let resampled = resample(samples, input_rate, WHISPER_SAMPLE_RATE)?;
    Ok(normalize_audio(&remove_dc_offset(&resampled)))
}
