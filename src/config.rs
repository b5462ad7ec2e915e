use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Every tunable the engine accepts, with defaults suited to byte-scale
/// (0-255) magnitude spectra from a 30-60 Hz capture driver.
///
/// Amplitude-scale parameters (`peak_floor`) assume the 0-255 convention;
/// scale them down when feeding normalized 0.0-1.0 spectra. The relative
/// parameters (multipliers, flux threshold) are scale-free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Logical FFT length of the upstream transform; the spectra
    /// themselves typically carry `fft_size / 2` bins.
    pub fft_size: usize,

    /// Samples of raw band energy kept for recency smoothing.
    pub band_history_len: usize,

    /// Samples of band energy backing each beat threshold.
    pub beat_history_len: usize,

    // Beat thresholds: current energy must exceed the rolling average
    // times the band's multiplier.
    pub bass_multiplier: f32,
    pub mid_multiplier: f32,
    pub high_multiplier: f32,

    /// Minimum seconds between bass beats.
    pub refractory_bass_secs: f64,
    /// Minimum seconds between beats in the other tracked bands.
    pub refractory_other_secs: f64,

    /// Trailing window of bass-beat timestamps feeding the tempo estimate.
    pub tempo_window_secs: f64,
    /// Beats that must remain in the window before the estimate updates.
    pub tempo_min_beats: usize,

    /// Samples of spectral flux backing the onset baseline.
    pub flux_history_len: usize,
    /// Onset fires when flux exceeds this fraction of the rolling mean.
    pub flux_threshold: f32,

    /// Minimum amplitude for a bin to count as a spectral peak.
    pub peak_floor: f32,
    /// Maximum peaks reported per frame.
    pub max_peaks: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            band_history_len: 5,
            beat_history_len: 20,
            bass_multiplier: 1.5,
            mid_multiplier: 1.2,
            high_multiplier: 1.8,
            refractory_bass_secs: 0.2,
            refractory_other_secs: 0.1,
            tempo_window_secs: 6.0,
            tempo_min_beats: 4,
            flux_history_len: 20,
            flux_threshold: 0.5,
            peak_floor: 100.0,
            max_peaks: 3,
        }
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot run with. Called by
    /// [`crate::FeatureEngine::new`]; construction is the only place a
    /// bad value can enter, so nothing is re-checked mid-stream.
    pub fn validate(&self) -> Result<()> {
        if self.fft_size == 0 {
            bail!("fft_size must be non-zero");
        }
        if self.band_history_len == 0 {
            bail!("band_history_len must be at least 1");
        }
        if self.beat_history_len == 0 {
            bail!("beat_history_len must be at least 1");
        }
        if !(self.bass_multiplier > 0.0 && self.mid_multiplier > 0.0 && self.high_multiplier > 0.0)
        {
            bail!("beat threshold multipliers must be positive");
        }
        if !(self.refractory_bass_secs > 0.0 && self.refractory_other_secs > 0.0) {
            bail!("refractory windows must be positive");
        }
        if !(self.tempo_window_secs > 0.0) {
            bail!("tempo_window_secs must be positive");
        }
        if self.tempo_min_beats < 2 {
            bail!("tempo_min_beats must be at least 2 to form an interval");
        }
        if self.flux_history_len == 0 {
            bail!("flux_history_len must be at least 1");
        }
        if !(self.flux_threshold > 0.0) {
            bail!("flux_threshold must be positive");
        }
        if self.peak_floor < 0.0 {
            bail!("peak_floor must not be negative");
        }
        if self.max_peaks == 0 {
            bail!("max_peaks must be at least 1");
        }
        Ok(())
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)
            .with_context(|| format!("writing config to {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Load and validate a configuration saved with [`EngineConfig::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading config from {}", path.as_ref().display()))?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
