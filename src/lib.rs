//! Real-time audio feature extraction for visualizers and other reactive
//! consumers.
//!
//! Feed one magnitude spectrum per tick into a [`FeatureEngine`] and read
//! back a [`FeatureSet`]: smoothed band energies, per-band beat events, a
//! tempo estimate with confidence, a spectral-flux onset flag and the
//! dominant spectral peaks. The engine never touches raw audio and never
//! performs I/O; producing spectra (microphone capture, FFT) is the
//! caller's concern. An optional reference front-end lives behind the
//! `capture` feature.
//!
//! ```no_run
//! use pulseframe::{EngineConfig, FeatureEngine, SpectrumFrame};
//!
//! let mut engine = FeatureEngine::new(EngineConfig::default())?;
//! engine.on_features(|features| {
//!     if features.is_beat {
//!         println!("beat at {:.3}s ({} BPM)", features.timestamp, features.tempo_bpm);
//!     }
//! });
//!
//! let frame = SpectrumFrame::new(vec![0.0; 1024], 44100.0, 2048, 0.0);
//! engine.process(&frame);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod analysis;
pub mod config;
pub mod engine;

#[cfg(feature = "capture")]
pub mod capture;

pub use analysis::{BandBeats, BandEnergies, FeatureSet, SpectralPeak, SpectrumFrame};
pub use config::EngineConfig;
pub use engine::FeatureEngine;
