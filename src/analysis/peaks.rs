use std::cmp::Ordering;

use super::{SpectralPeak, SpectrumFrame};

/// Local-maxima extraction for dominant-frequency reporting.
pub struct PeakPicker {
    floor: f32,
    max_peaks: usize,
}

impl PeakPicker {
    pub fn new(floor: f32, max_peaks: usize) -> Self {
        Self { floor, max_peaks }
    }

    /// Up to `max_peaks` strict local maxima above the amplitude floor,
    /// strongest first. A bin qualifies only if it exceeds both neighbours
    /// on each side, so plateau edges and noise ripples stay out.
    pub fn find_peaks(&self, frame: &SpectrumFrame) -> Vec<SpectralPeak> {
        let bins = &frame.bins;
        let len = bins.len();
        if len < 5 || frame.sample_rate <= 0.0 {
            return Vec::new();
        }

        let hz_per_bin = frame.nyquist() / len as f32;
        let mut peaks = Vec::new();
        for i in 2..len - 2 {
            let v = bins[i];
            if v <= self.floor {
                continue;
            }
            if v > bins[i - 1] && v > bins[i - 2] && v > bins[i + 1] && v > bins[i + 2] {
                peaks.push(SpectralPeak {
                    frequency: i as f32 * hz_per_bin,
                    amplitude: v,
                });
            }
        }

        peaks.sort_by(|a, b| {
            b.amplitude
                .partial_cmp(&a.amplitude)
                .unwrap_or(Ordering::Equal)
        });
        peaks.truncate(self.max_peaks);
        peaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(bins: Vec<f32>) -> SpectrumFrame {
        let fft_size = bins.len() * 2;
        SpectrumFrame::new(bins, 44100.0, fft_size, 0.0)
    }

    fn with_peak(bins: &mut [f32], index: usize, amplitude: f32) {
        bins[index] = amplitude;
    }

    #[test]
    fn peaks_sorted_by_amplitude() {
        let mut bins = vec![0.0f32; 128];
        with_peak(&mut bins, 10, 150.0);
        with_peak(&mut bins, 40, 200.0);
        with_peak(&mut bins, 90, 120.0);
        let peaks = PeakPicker::new(100.0, 3).find_peaks(&frame(bins));
        let amplitudes: Vec<f32> = peaks.iter().map(|p| p.amplitude).collect();
        assert_eq!(amplitudes, vec![200.0, 150.0, 120.0]);
    }

    #[test]
    fn flat_spectrum_has_no_peaks() {
        let peaks = PeakPicker::new(100.0, 3).find_peaks(&frame(vec![180.0; 128]));
        assert!(peaks.is_empty());
    }

    #[test]
    fn floor_excludes_small_maxima() {
        let mut bins = vec![0.0f32; 128];
        with_peak(&mut bins, 30, 90.0);
        let peaks = PeakPicker::new(100.0, 3).find_peaks(&frame(bins));
        assert!(peaks.is_empty());
    }

    #[test]
    fn truncates_to_strongest_three() {
        let mut bins = vec![0.0f32; 256];
        for (k, &amp) in [200.0, 190.0, 180.0, 170.0, 160.0].iter().enumerate() {
            with_peak(&mut bins, 10 + k * 20, amp);
        }
        let peaks = PeakPicker::new(100.0, 3).find_peaks(&frame(bins));
        assert_eq!(peaks.len(), 3);
        assert_eq!(peaks[2].amplitude, 180.0);
    }

    #[test]
    fn edges_are_never_candidates() {
        let mut bins = vec![0.0f32; 64];
        with_peak(&mut bins, 0, 250.0);
        with_peak(&mut bins, 1, 240.0);
        with_peak(&mut bins, 62, 240.0);
        with_peak(&mut bins, 63, 250.0);
        let peaks = PeakPicker::new(100.0, 3).find_peaks(&frame(bins));
        assert!(peaks.is_empty());
    }

    #[test]
    fn frequency_maps_bin_to_hz() {
        let mut bins = vec![0.0f32; 128];
        with_peak(&mut bins, 64, 200.0);
        let peaks = PeakPicker::new(100.0, 3).find_peaks(&frame(bins));
        assert_eq!(peaks.len(), 1);
        // Bin 64 of 128 sits at half of Nyquist.
        let expected = 64.0 * (22050.0 / 128.0);
        assert!((peaks[0].frequency - expected).abs() < 1e-3);
    }

    #[test]
    fn tiny_spectrum_is_empty_not_a_panic() {
        let peaks = PeakPicker::new(100.0, 3).find_peaks(&frame(vec![255.0; 4]));
        assert!(peaks.is_empty());
    }
}
