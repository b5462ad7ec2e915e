//! Frame-to-frame spectral difference and onset flagging.

use std::collections::VecDeque;

use crate::config::EngineConfig;

/// Broadband onset detection from rectified spectral flux.
///
/// Only positive spectral growth counts: a bin that loses energy between
/// frames contributes nothing, so decaying tails never read as transients.
pub struct FluxDetector {
    previous: Option<Vec<f32>>,
    history: VecDeque<f32>,
    history_len: usize,
    threshold: f32,
}

impl FluxDetector {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            previous: None,
            history: VecDeque::with_capacity(config.flux_history_len),
            history_len: config.flux_history_len,
            threshold: config.flux_threshold,
        }
    }

    /// Compute flux against the stored previous spectrum and flag onsets.
    ///
    /// The first call (and any call after the spectrum changed shape
    /// without a reset) stores the spectrum and returns `(0.0, false)`.
    pub fn update(&mut self, bins: &[f32]) -> (f32, bool) {
        if bins.is_empty() {
            return (0.0, false);
        }

        let flux = match self.previous.take() {
            Some(mut prev) if prev.len() == bins.len() => {
                let mut sum_squares = 0.0f32;
                for (&current, &old) in bins.iter().zip(prev.iter()) {
                    let rise = (current - old).max(0.0);
                    sum_squares += rise * rise;
                }
                prev.copy_from_slice(bins);
                self.previous = Some(prev);
                sum_squares.sqrt() / bins.len() as f32
            }
            _ => {
                self.previous = Some(bins.to_vec());
                return (0.0, false);
            }
        };

        self.history.push_back(flux);
        if self.history.len() > self.history_len {
            self.history.pop_front();
        }
        let mean = self.history.iter().sum::<f32>() / self.history.len() as f32;
        let is_onset = flux > mean * self.threshold;

        (flux, is_onset)
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.history.clear();
    }
}
