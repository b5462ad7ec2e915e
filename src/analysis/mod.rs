pub mod bands;
pub mod beat;
pub mod flux;
pub mod peaks;
pub mod smoother;
pub mod tempo;

pub use bands::BandDecomposer;
pub use beat::{BandBeats, BeatDetector};
pub use flux::FluxDetector;
pub use peaks::PeakPicker;
pub use smoother::BandSmoother;
pub use tempo::TempoEstimator;

/// One frame of frequency-domain magnitudes plus capture metadata.
///
/// Magnitudes follow the 0-255 byte-frequency convention of common capture
/// sources; normalized 0.0-1.0 spectra work equally well as long as the
/// amplitude thresholds in [`crate::EngineConfig`] are scaled to match.
/// `timestamp` is engine-clock seconds (monotonic, not wall-clock).
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFrame {
    pub bins: Vec<f32>,
    pub sample_rate: f32,
    pub fft_size: usize,
    pub timestamp: f64,
}

impl SpectrumFrame {
    pub fn new(bins: Vec<f32>, sample_rate: f32, fft_size: usize, timestamp: f64) -> Self {
        Self {
            bins,
            sample_rate,
            fft_size,
            timestamp,
        }
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate / 2.0
    }
}

/// Energy in each of the five named frequency bands, in the same units as
/// the input spectrum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandEnergies {
    pub bass: f32,
    pub mid_low: f32,
    pub mid: f32,
    pub high_mid: f32,
    pub high: f32,
}

/// A dominant spectral peak reported by the peak picker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPeak {
    /// Center frequency in Hz.
    pub frequency: f32,
    /// Bin magnitude at the peak.
    pub amplitude: f32,
}

/// Everything derived from one processed frame. Constructed fresh per tick
/// and handed to the subscriber; the engine keeps no reference to it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    /// Timestamp of the frame this set was derived from.
    pub timestamp: f64,
    /// Raw magnitudes, copied from the input frame.
    pub spectrum: Vec<f32>,
    /// Recency-smoothed band energies.
    pub bands: BandEnergies,
    /// Per-band beat events for this frame.
    pub beats: BandBeats,
    /// True if any tracked band fired a beat this frame.
    pub is_beat: bool,
    /// Estimated tempo in whole BPM. Persists through silences.
    pub tempo_bpm: u32,
    /// Regularity of recent beat intervals, 0.0-1.0.
    pub tempo_confidence: f32,
    /// Broadband spectral flux for this frame.
    pub flux: f32,
    /// True if the flux spiked above its recent baseline.
    pub is_onset: bool,
    /// Up to `max_peaks` dominant peaks, strongest first.
    pub peaks: Vec<SpectralPeak>,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self {
            timestamp: 0.0,
            spectrum: Vec::new(),
            bands: BandEnergies::default(),
            beats: BandBeats::default(),
            is_beat: false,
            tempo_bpm: 0,
            tempo_confidence: 0.0,
            flux: 0.0,
            is_onset: false,
            peaks: Vec::new(),
        }
    }
}
