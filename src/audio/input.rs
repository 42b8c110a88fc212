use crate::{Result, SampuranaError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Whether the platform will hand us microphone audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAccess {
    /// A default input device exists and its configuration is readable
    Available,
    /// A device exists but the system refuses to configure it
    Blocked,
    /// No input device at all
    Missing,
}

/// Probe the default input device without opening a stream
pub fn probe_default_input() -> DeviceAccess {
    let host = cpal::default_host();
    match host.default_input_device() {
        None => DeviceAccess::Missing,
        Some(device) => match device.default_input_config() {
            Ok(_) => DeviceAccess::Available,
            Err(e) => {
                warn!("Input device present but not configurable: {}", e);
                DeviceAccess::Blocked
            }
        },
    }
}

/// Microphone capture delivering mono f32 blocks over a channel
///
/// The cpal stream is not `Send` on every platform, so an `AudioInput`
/// stays on the thread that created it; only the sample channel crosses
/// threads.
pub struct AudioInput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    capturing: Arc<AtomicBool>,
}

impl AudioInput {
    /// Create a new audio input with the default input device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| SampuranaError::AudioDeviceError("No input device available".into()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_input_config()
            .map_err(|e| {
                SampuranaError::AudioDeviceError(format!("Failed to get input config: {}", e))
            })?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
            capturing: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start capturing and send mono blocks to `audio_tx`
    pub fn start(&mut self, audio_tx: Sender<Vec<f32>>) -> Result<()> {
        if self.stream.is_some() {
            warn!("Already capturing");
            return Ok(());
        }

        let channels = self.config.channels.max(1) as usize;
        let capturing = Arc::clone(&self.capturing);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !capturing.load(Ordering::Relaxed) {
                        return;
                    }

                    let samples = if channels == 1 {
                        data.to_vec()
                    } else {
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                            .collect()
                    };

                    if let Err(e) = audio_tx.try_send(samples) {
                        debug!("Dropped audio block: {}", e);
                    }
                },
                |err| error!("Audio input stream error: {}", err),
                None,
            )
            .map_err(|e| {
                SampuranaError::AudioDeviceError(format!("Failed to build input stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            SampuranaError::AudioDeviceError(format!("Failed to start input stream: {}", e))
        })?;

        self.capturing.store(true, Ordering::SeqCst);
        self.stream = Some(stream);

        info!("Started audio capture at {} Hz", self.sample_rate());
        Ok(())
    }

    /// Stop capturing and release the device stream
    pub fn stop(&mut self) {
        self.capturing.store(false, Ordering::SeqCst);
        if self.stream.take().is_some() {
            info!("Stopped audio capture");
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.stream.is_some() && self.capturing.load(Ordering::SeqCst)
    }
}

impl Drop for AudioInput {
    fn drop(&mut self) {
        self.stop();
    }
}
