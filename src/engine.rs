use anyhow::Result;
use log::{debug, warn};

use crate::analysis::{
    BandBeats, BandDecomposer, BandSmoother, BeatDetector, FeatureSet, FluxDetector, PeakPicker,
    SpectrumFrame, TempoEstimator,
};
use crate::config::EngineConfig;

type FeatureCallback = Box<dyn FnMut(&FeatureSet) + Send>;

/// The orchestrator: owns every analysis stage and turns one spectrum
/// frame into one [`FeatureSet`] per call.
///
/// The engine is logically single-threaded and stateful across calls.
/// Exactly one caller feeds it frames in strictly increasing timestamp
/// order; cross-thread handoff of inputs or outputs belongs to the caller
/// (see `FrameMailbox` under the `capture` feature). `process` never
/// blocks and every history it keeps is a fixed-size ring, so each call
/// completes in time proportional to the spectrum length.
pub struct FeatureEngine {
    config: EngineConfig,
    decomposer: BandDecomposer,
    smoother: BandSmoother,
    beats: BeatDetector,
    tempo: TempoEstimator,
    flux: FluxDetector,
    peaks: PeakPicker,
    subscriber: Option<FeatureCallback>,
    last_timestamp: Option<f64>,
    frames_processed: u64,
}

impl FeatureEngine {
    /// Build an engine from a validated configuration. Configuration
    /// errors are rejected here; nothing after construction can fail.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            decomposer: BandDecomposer::new(),
            smoother: BandSmoother::new(config.band_history_len),
            beats: BeatDetector::new(&config),
            tempo: TempoEstimator::new(&config),
            flux: FluxDetector::new(&config),
            peaks: PeakPicker::new(config.peak_floor, config.max_peaks),
            subscriber: None,
            last_timestamp: None,
            frames_processed: 0,
            config,
        })
    }

    /// Register the feature subscriber. Single slot: registering a new
    /// callback replaces the previous one. The callback runs synchronously
    /// on the thread that calls [`FeatureEngine::process`].
    pub fn on_features<F>(&mut self, callback: F)
    where
        F: FnMut(&FeatureSet) + Send + 'static,
    {
        self.subscriber = Some(Box::new(callback));
    }

    /// Run the full pipeline for one frame: band decomposition, smoothing,
    /// beat detection (feeding the tempo estimate), spectral flux and peak
    /// picking, in that order.
    ///
    /// Malformed frames never panic. An empty spectrum or non-positive
    /// sample rate yields a degenerate set (zero bands, no events, tempo
    /// unchanged) and mutates nothing. A timestamp that goes backwards
    /// still feeds the smoothing, beat-energy and flux histories but
    /// skips every timing-dependent decision for that call.
    pub fn process(&mut self, frame: &SpectrumFrame) -> FeatureSet {
        if frame.bins.is_empty() || frame.sample_rate <= 0.0 {
            warn!(
                "discarding malformed frame at {:.3}s ({} bins, sample rate {})",
                frame.timestamp,
                frame.bins.len(),
                frame.sample_rate
            );
            let set = FeatureSet {
                timestamp: frame.timestamp,
                spectrum: frame.bins.clone(),
                tempo_bpm: self.tempo.bpm(),
                tempo_confidence: self.tempo.confidence(),
                ..FeatureSet::default()
            };
            self.emit(&set);
            return set;
        }

        let timing_valid = match self.last_timestamp {
            Some(last) => frame.timestamp > last,
            None => true,
        };
        if timing_valid {
            self.last_timestamp = Some(frame.timestamp);
        } else {
            warn!(
                "non-monotonic timestamp {:.6}s (last {:.6}s); skipping timing updates",
                frame.timestamp,
                self.last_timestamp.unwrap_or_default()
            );
        }

        if self.frames_processed == 0 {
            debug!(
                "engine running: first frame with {} bins at {} Hz",
                frame.bins.len(),
                frame.sample_rate
            );
        }
        self.frames_processed += 1;

        let raw = self.decomposer.decompose(frame);
        let bands = self.smoother.push(&raw);

        let beats = if timing_valid {
            let beats = self.beats.detect(&bands, frame.timestamp);
            self.tempo.update(beats.bass, frame.timestamp);
            beats
        } else {
            self.beats.observe(&bands);
            BandBeats::default()
        };

        let (flux, is_onset) = self.flux.update(&frame.bins);
        let peaks = self.peaks.find_peaks(frame);

        let set = FeatureSet {
            timestamp: frame.timestamp,
            spectrum: frame.bins.clone(),
            bands,
            beats,
            is_beat: beats.any(),
            tempo_bpm: self.tempo.bpm(),
            tempo_confidence: self.tempo.confidence(),
            flux,
            is_onset,
            peaks,
        };
        self.emit(&set);
        set
    }

    /// Clear every ring buffer and the tempo/flux state without rebuilding
    /// the engine. Call this whenever the upstream spectrum shape changes
    /// (new capture source, new FFT size).
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.beats.reset();
        self.tempo.reset();
        self.flux.reset();
        self.last_timestamp = None;
        self.frames_processed = 0;
        debug!("engine state reset");
    }

    /// Current tempo estimate as `(bpm, confidence)` without processing a
    /// frame.
    pub fn tempo(&self) -> (u32, f32) {
        (self.tempo.bpm(), self.tempo.confidence())
    }

    /// Frames that have reached the analysis pipeline since construction
    /// or the last reset. Discarded malformed frames are not counted.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn emit(&mut self, set: &FeatureSet) {
        if let Some(callback) = self.subscriber.as_mut() {
            callback(set);
        }
    }
}
