use std::collections::VecDeque;

use log::debug;

use crate::config::EngineConfig;

/// Converts a stream of bass-beat timestamps into a BPM estimate with a
/// confidence score.
///
/// Timestamps older than the trailing window are pruned on every update.
/// The estimate is recomputed only while enough beats remain in the window;
/// otherwise the previous tempo and confidence persist, so the reading
/// survives breakdowns and brief silences instead of snapping to zero.
pub struct TempoEstimator {
    window_secs: f64,
    min_beats: usize,
    beat_times: VecDeque<f64>,
    bpm: u32,
    confidence: f32,
}

impl TempoEstimator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            window_secs: config.tempo_window_secs,
            min_beats: config.tempo_min_beats,
            beat_times: VecDeque::new(),
            bpm: 0,
            confidence: 0.0,
        }
    }

    pub fn update(&mut self, bass_beat_fired: bool, now: f64) {
        if bass_beat_fired {
            self.beat_times.push_back(now);
        }

        let cutoff = now - self.window_secs;
        while let Some(&oldest) = self.beat_times.front() {
            if oldest < cutoff {
                self.beat_times.pop_front();
            } else {
                break;
            }
        }

        if self.beat_times.len() < self.min_beats {
            return;
        }

        let interval_count = (self.beat_times.len() - 1) as f64;
        let mut sum = 0.0f64;
        for (a, b) in self.beat_times.iter().zip(self.beat_times.iter().skip(1)) {
            sum += b - a;
        }
        let mean = sum / interval_count;
        if mean <= 0.0 {
            return;
        }

        let mut variance = 0.0f64;
        for (a, b) in self.beat_times.iter().zip(self.beat_times.iter().skip(1)) {
            let deviation = (b - a) - mean;
            variance += deviation * deviation;
        }
        variance /= interval_count;
        let std_dev = variance.sqrt();

        let bpm = (60.0 / mean).round() as u32;
        if bpm != self.bpm {
            debug!("tempo estimate {} -> {} BPM", self.bpm, bpm);
        }
        self.bpm = bpm;
        self.confidence = (1.0 - std_dev / mean).clamp(0.0, 1.0) as f32;
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn reset(&mut self) {
        self.beat_times.clear();
        self.bpm = 0;
        self.confidence = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> TempoEstimator {
        TempoEstimator::new(&EngineConfig::default())
    }

    #[test]
    fn regular_beats_give_exact_tempo() {
        let mut tempo = estimator();
        for &t in &[0.0, 0.5, 1.0, 1.5] {
            tempo.update(true, t);
        }
        assert_eq!(tempo.bpm(), 120);
        assert!((tempo.confidence() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn too_few_beats_leave_estimate_untouched() {
        let mut tempo = estimator();
        tempo.update(true, 0.0);
        tempo.update(true, 0.5);
        tempo.update(true, 1.0);
        assert_eq!(tempo.bpm(), 0);
        assert_eq!(tempo.confidence(), 0.0);
    }

    #[test]
    fn estimate_persists_through_silence() {
        let mut tempo = estimator();
        for &t in &[0.0, 0.5, 1.0, 1.5] {
            tempo.update(true, t);
        }
        assert_eq!(tempo.bpm(), 120);

        // No beats for long enough that the window empties completely.
        for i in 0..600 {
            tempo.update(false, 2.0 + i as f64 / 60.0);
        }
        assert_eq!(tempo.bpm(), 120);
        assert!((tempo.confidence() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn irregular_beats_lower_confidence() {
        let mut tempo = estimator();
        for &t in &[0.0, 0.3, 1.0, 1.4] {
            tempo.update(true, t);
        }
        assert!(tempo.confidence() < 0.9, "confidence = {}", tempo.confidence());
        assert!(tempo.bpm() > 0);
    }

    #[test]
    fn window_prunes_stale_beats() {
        let mut tempo = estimator();
        // Two early beats that will age out, then a regular pulse.
        tempo.update(true, 0.0);
        tempo.update(true, 0.1);
        for i in 0..8 {
            tempo.update(true, 7.0 + i as f64 * 0.5);
        }
        // Only the 0.5s-spaced beats remain in the 6s window.
        assert_eq!(tempo.bpm(), 120);
        assert!((tempo.confidence() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn half_time_pulse_reads_60_bpm() {
        let mut tempo = estimator();
        for i in 0..5 {
            tempo.update(true, i as f64);
        }
        assert_eq!(tempo.bpm(), 60);
    }

    #[test]
    fn reset_clears_estimate() {
        let mut tempo = estimator();
        for &t in &[0.0, 0.5, 1.0, 1.5] {
            tempo.update(true, t);
        }
        tempo.reset();
        assert_eq!(tempo.bpm(), 0);
        assert_eq!(tempo.confidence(), 0.0);
    }
}
