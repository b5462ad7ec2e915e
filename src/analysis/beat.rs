use std::collections::VecDeque;

use log::debug;

use super::BandEnergies;
use crate::config::EngineConfig;

/// Which of the tracked bands fired a beat this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BandBeats {
    pub bass: bool,
    pub mid: bool,
    pub high: bool,
}

impl BandBeats {
    pub fn any(&self) -> bool {
        self.bass || self.mid || self.high
    }
}

/// Rolling state for one tracked band.
struct BandState {
    name: &'static str,
    history: VecDeque<f32>,
    capacity: usize,
    multiplier: f32,
    refractory: f64,
    last_beat: f64,
}

impl BandState {
    fn new(name: &'static str, capacity: usize, multiplier: f32, refractory: f64) -> Self {
        Self {
            name,
            history: VecDeque::with_capacity(capacity),
            capacity,
            multiplier,
            refractory,
            // Negative infinity so the very first over-threshold frame is
            // not swallowed by the refractory gate.
            last_beat: f64::NEG_INFINITY,
        }
    }

    fn push(&mut self, energy: f32) -> f32 {
        self.history.push_back(energy);
        if self.history.len() > self.capacity {
            self.history.pop_front();
        }
        self.history.iter().sum::<f32>() / self.history.len() as f32
    }

    fn detect(&mut self, energy: f32, now: f64) -> bool {
        let avg = self.push(energy);
        let threshold = avg * self.multiplier;
        let fired = energy > threshold && now - self.last_beat > self.refractory;
        if fired {
            debug!(
                "{} beat at {:.3}s (energy {:.2} > threshold {:.2})",
                self.name, now, energy, threshold
            );
            self.last_beat = now;
        }
        fired
    }

    fn reset(&mut self) {
        self.history.clear();
        self.last_beat = f64::NEG_INFINITY;
    }
}

/// Per-band adaptive-threshold beat detection with refractory timing.
///
/// Each tracked band keeps a rolling energy history; a beat fires when the
/// current energy exceeds the rolling average times the band's multiplier
/// and the band is outside its refractory window. With fewer samples than
/// the history holds, the average is over whatever exists so far.
pub struct BeatDetector {
    bass: BandState,
    mid: BandState,
    high: BandState,
}

impl BeatDetector {
    pub fn new(config: &EngineConfig) -> Self {
        let len = config.beat_history_len;
        Self {
            bass: BandState::new(
                "bass",
                len,
                config.bass_multiplier,
                config.refractory_bass_secs,
            ),
            mid: BandState::new(
                "mid",
                len,
                config.mid_multiplier,
                config.refractory_other_secs,
            ),
            high: BandState::new(
                "high",
                len,
                config.high_multiplier,
                config.refractory_other_secs,
            ),
        }
    }

    /// Run beat detection for one frame. `now` must come from a strictly
    /// non-decreasing engine clock.
    pub fn detect(&mut self, bands: &BandEnergies, now: f64) -> BandBeats {
        BandBeats {
            bass: self.bass.detect(bands.bass, now),
            mid: self.mid.detect(bands.mid, now),
            high: self.high.detect(bands.high, now),
        }
    }

    /// Update the energy histories without making any timing-dependent
    /// decision. Used for frames whose timestamp went backwards.
    pub fn observe(&mut self, bands: &BandEnergies) {
        self.bass.push(bands.bass);
        self.mid.push(bands.mid);
        self.high.push(bands.high);
    }

    pub fn reset(&mut self) {
        self.bass.reset();
        self.mid.reset();
        self.high.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn energies(bass: f32, mid: f32, high: f32) -> BandEnergies {
        BandEnergies {
            bass,
            mid,
            high,
            ..BandEnergies::default()
        }
    }

    #[test]
    fn constant_energy_never_beats() {
        let mut detector = BeatDetector::new(&EngineConfig::default());
        for i in 0..60 {
            let beats = detector.detect(&energies(50.0, 50.0, 50.0), i as f64 / 60.0);
            assert!(!beats.any(), "unexpected beat at frame {}", i);
        }
    }

    #[test]
    fn spike_over_quiet_history_beats() {
        let mut detector = BeatDetector::new(&EngineConfig::default());
        for i in 0..20 {
            detector.detect(&energies(10.0, 0.0, 0.0), i as f64 / 60.0);
        }
        let beats = detector.detect(&energies(200.0, 0.0, 0.0), 20.0 / 60.0);
        assert!(beats.bass);
        assert!(!beats.mid);
        assert!(!beats.high);
    }

    #[test]
    fn refractory_limits_beat_rate() {
        // Exponentially growing energy stays above the rolling threshold on
        // every call, so the refractory window is the only limiter: with
        // 0.2s for bass, at most 5 beats can fire across 1.1 simulated
        // seconds at 60 fps.
        let mut detector = BeatDetector::new(&EngineConfig::default());
        let mut bass_beats = 0;
        let mut energy = 1.0f32;
        let mut t = 0.0f64;
        while t <= 1.1 {
            let beats = detector.detect(&energies(energy, 0.0, 0.0), t);
            if beats.bass {
                bass_beats += 1;
            }
            energy *= 2.0;
            t += 1.0 / 60.0;
        }
        assert!(bass_beats >= 2, "expected some beats, got {}", bass_beats);
        assert!(bass_beats <= 5, "refractory violated: {} beats", bass_beats);
    }

    #[test]
    fn mid_and_high_use_shorter_refractory() {
        let mut detector = BeatDetector::new(&EngineConfig::default());
        let mut mid_beats = 0;
        let mut energy = 1.0f32;
        let mut t = 0.0f64;
        while t <= 1.0 {
            let beats = detector.detect(&energies(0.0, energy, 0.0), t);
            if beats.mid {
                mid_beats += 1;
            }
            energy *= 2.0;
            t += 1.0 / 60.0;
        }
        // 0.1s refractory allows roughly twice the bass rate.
        assert!(mid_beats >= 6, "got {} mid beats", mid_beats);
    }

    #[test]
    fn observe_updates_history_without_beats() {
        let mut detector = BeatDetector::new(&EngineConfig::default());
        for _ in 0..20 {
            detector.observe(&energies(10.0, 10.0, 10.0));
        }
        // History is primed at 10.0, so a spike immediately clears the
        // threshold even on the first timed call.
        let beats = detector.detect(&energies(100.0, 100.0, 100.0), 0.0);
        assert!(beats.bass && beats.mid && beats.high);
    }

    #[test]
    fn reset_forgets_last_beat_and_history() {
        let mut detector = BeatDetector::new(&EngineConfig::default());
        for i in 0..20 {
            detector.detect(&energies(10.0, 0.0, 0.0), i as f64 / 60.0);
        }
        assert!(detector.detect(&energies(200.0, 0.0, 0.0), 0.34).bass);
        detector.reset();
        // Same stimulus right after reset: history only holds the spike
        // itself, so no beat fires.
        let beats = detector.detect(&energies(200.0, 0.0, 0.0), 0.35);
        assert!(!beats.bass);
    }
}
