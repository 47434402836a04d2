use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, info, warn};

use parle_core::error::{ParleError, Result};

use crate::wav::encode_wav_mono16;

/// Microphone capture port. One recording at a time; `stop` without a
/// matching `start` is an error.
pub trait Recorder: Send + Sync {
    fn start(&self) -> Result<()>;
    /// Stops capture and returns the recording as WAV bytes.
    fn stop(&self) -> Result<Vec<u8>>;
}

struct ActiveCapture {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
    samples: Arc<Mutex<Vec<f32>>>,
    channels: u16,
    sample_rate: u32,
}

/// Recorder backed by the default cpal input device.
///
/// The cpal stream is not `Send`, so each recording runs on its own thread
/// that owns the stream for its whole lifetime. Device and stream errors at
/// startup are reported synchronously from `start`.
pub struct CpalRecorder {
    active: Mutex<Option<ActiveCapture>>,
}

impl CpalRecorder {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }
}

impl Default for CpalRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder for CpalRecorder {
    fn start(&self) -> Result<()> {
        let mut active = self.active.lock().expect("recorder lock poisoned");
        if active.is_some() {
            return Err(ParleError::Audio("Capture is already running".to_string()));
        }

        let samples = Arc::new(Mutex::new(Vec::new()));
        let (stop_tx, stop_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_samples = samples.clone();
        let handle = std::thread::Builder::new()
            .name("parle-audio".to_string())
            .spawn(move || run_capture(thread_samples, stop_rx, ready_tx))
            .map_err(|e| ParleError::Audio(format!("Failed to spawn capture thread: {e}")))?;

        // The capture thread reports its device config, or the startup error.
        let (channels, sample_rate) = ready_rx
            .recv()
            .map_err(|_| ParleError::Audio("Capture thread exited before starting".to_string()))?
            .map_err(ParleError::Audio)?;

        info!(channels, sample_rate, "Recording started");
        *active = Some(ActiveCapture {
            stop_tx,
            handle,
            samples,
            channels,
            sample_rate,
        });
        Ok(())
    }

    fn stop(&self) -> Result<Vec<u8>> {
        let capture = self
            .active
            .lock()
            .expect("recorder lock poisoned")
            .take()
            .ok_or_else(|| ParleError::Audio("No recording in progress".to_string()))?;

        let _ = capture.stop_tx.send(());
        if capture.handle.join().is_err() {
            warn!("Capture thread panicked during shutdown");
        }

        let samples = std::mem::take(&mut *capture.samples.lock().expect("sample lock poisoned"));
        debug!(
            samples = samples.len(),
            channels = capture.channels,
            "Recording stopped"
        );
        encode_wav_mono16(&samples, capture.channels, capture.sample_rate)
    }
}

/// Body of the capture thread: builds the stream, reports readiness, then
/// holds the stream alive until stop is signalled.
fn run_capture(
    samples: Arc<Mutex<Vec<f32>>>,
    stop_rx: mpsc::Receiver<()>,
    ready_tx: mpsc::Sender<std::result::Result<(u16, u32), String>>,
) {
    let setup = (|| {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| "No input device available".to_string())?;
        let config = device
            .default_input_config()
            .map_err(|e| format!("Failed to query input config: {e}"))?;
        let channels = config.channels();
        let sample_rate = config.sample_rate().0;

        let err_fn = |err: cpal::StreamError| {
            warn!(error = %err, "Audio stream error");
        };

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => {
                let samples = samples.clone();
                device
                    .build_input_stream(
                        &config.config(),
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            samples.lock().expect("sample lock poisoned").extend_from_slice(data);
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|e| format!("Failed to build input stream: {e}"))?
            }
            cpal::SampleFormat::I16 => {
                let samples = samples.clone();
                device
                    .build_input_stream(
                        &config.config(),
                        move |data: &[i16], _: &cpal::InputCallbackInfo| {
                            let mut buffer = samples.lock().expect("sample lock poisoned");
                            buffer.extend(data.iter().map(|&s| s as f32 / i16::MAX as f32));
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|e| format!("Failed to build input stream: {e}"))?
            }
            cpal::SampleFormat::U16 => {
                let samples = samples.clone();
                device
                    .build_input_stream(
                        &config.config(),
                        move |data: &[u16], _: &cpal::InputCallbackInfo| {
                            let mut buffer = samples.lock().expect("sample lock poisoned");
                            buffer.extend(data.iter().map(|&s| (s as f32 - 32768.0) / 32768.0));
                        },
                        err_fn,
                        None,
                    )
                    .map_err(|e| format!("Failed to build input stream: {e}"))?
            }
            other => return Err(format!("Unsupported sample format: {other:?}")),
        };

        stream
            .play()
            .map_err(|e| format!("Failed to start audio stream: {e}"))?;
        Ok((stream, channels, sample_rate))
    })();

    match setup {
        Ok((stream, channels, sample_rate)) => {
            let _ = ready_tx.send(Ok((channels, sample_rate)));
            // Blocks until stop is signalled or the recorder is dropped.
            let _ = stop_rx.recv();
            drop(stream);
        }
        Err(message) => {
            let _ = ready_tx.send(Err(message));
        }
    }
}
