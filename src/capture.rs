//! Reference capture front-end: microphone input to [`SpectrumFrame`]s.
//!
//! Everything in this module is an external collaborator of the engine.
//! It owns the audio device, the FFT and the thread handoff; the engine
//! only ever sees the `SpectrumFrame` values it produces.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::{Receiver, Sender};
use log::{info, warn};
use rustfft::{num_complex::Complex, FftPlanner};

use crate::analysis::{FeatureSet, SpectrumFrame};

/// Captures the default input device and turns it into magnitude spectra
/// on the 0-255 scale, stamped with a monotonic clock anchored at stream
/// start.
pub struct SpectrumSource {
    #[allow(dead_code)]
    stream: Stream,
    audio_receiver: Receiver<Vec<f32>>,
    fft: Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    fft_size: usize,
    sample_rate: f32,
    pending: Vec<f32>,
    started: Instant,
}

impl SpectrumSource {
    pub fn from_default_input(fft_size: usize) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("No input device available"))?;

        let config = device
            .default_input_config()
            .map_err(|e| anyhow!("Failed to get default input config: {}", e))?;

        info!(
            "Using audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );
        info!("Audio config: {:?}", config);

        let sample_rate = config.sample_rate().0 as f32;
        let (audio_sender, audio_receiver) = crossbeam_channel::unbounded();

        let stream = Self::create_input_stream(&device, &config.into(), audio_sender)?;
        stream.play()?;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Ok(Self {
            stream,
            audio_receiver,
            fft,
            window: Self::hann_window(fft_size),
            fft_size,
            sample_rate,
            pending: Vec::with_capacity(fft_size * 2),
            started: Instant::now(),
        })
    }

    fn create_input_stream(
        device: &Device,
        config: &StreamConfig,
        sender: Sender<Vec<f32>>,
    ) -> Result<Stream> {
        let channels = config.channels as usize;

        info!(
            "Creating input stream with {} channels at {} Hz",
            channels, config.sample_rate.0
        );

        let stream = device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono_data: Vec<f32> = if channels == 1 {
                    data.to_vec()
                } else {
                    data.chunks(channels)
                        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                        .collect()
                };

                if sender.send(mono_data).is_err() {
                    warn!("Failed to send audio data");
                }
            },
            |err| {
                warn!("Audio stream error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }

    fn hann_window(size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect()
    }

    /// Drain captured audio and, once a full FFT window has accumulated,
    /// produce the next spectrum frame. Returns `None` when not enough
    /// audio has arrived yet.
    pub fn poll_frame(&mut self) -> Option<SpectrumFrame> {
        while let Ok(chunk) = self.audio_receiver.try_recv() {
            self.pending.extend_from_slice(&chunk);
        }

        if self.pending.len() < self.fft_size {
            return None;
        }

        // Analyze the newest full window and drop the backlog; a slow
        // consumer tracks the live signal rather than falling behind.
        let start = self.pending.len() - self.fft_size;
        let bins = self.compute_spectrum(start);
        self.pending.drain(..);

        Some(SpectrumFrame::new(
            bins,
            self.sample_rate,
            self.fft_size,
            self.started.elapsed().as_secs_f64(),
        ))
    }

    fn compute_spectrum(&self, start: usize) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = self.pending[start..start + self.fft_size]
            .iter()
            .zip(self.window.iter())
            .map(|(&sample, &w)| Complex::new(sample * w, 0.0))
            .collect();

        self.fft.process(&mut buffer);

        // Normalized magnitude scaled onto the 0-255 convention the
        // engine's default thresholds assume.
        let scale = 2.0 / self.fft_size as f32;
        buffer[..self.fft_size / 2]
            .iter()
            .map(|c| (c.norm() * scale * 255.0).min(255.0))
            .collect()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

/// Single-slot latest-value handoff between a capture/analysis thread and
/// a render or UI thread. Publishing never blocks the producer; readers
/// always get the most recent complete set.
#[derive(Clone)]
pub struct FrameMailbox {
    slot: Arc<Mutex<FeatureSet>>,
}

impl FrameMailbox {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(FeatureSet::default())),
        }
    }

    /// Replace the stored set. Skips the update instead of blocking when
    /// the consumer holds the lock.
    pub fn publish(&self, set: FeatureSet) {
        if let Ok(mut slot) = self.slot.try_lock() {
            *slot = set;
        }
    }

    pub fn latest(&self) -> FeatureSet {
        self.slot.lock().unwrap().clone()
    }
}

impl Default for FrameMailbox {
    fn default() -> Self {
        Self::new()
    }
}
