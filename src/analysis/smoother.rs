use std::collections::VecDeque;

use super::BandEnergies;

/// Recency-weighted smoothing over a fixed-length history per band.
///
/// Each push evicts the oldest sample once the ring is full and returns the
/// position-weighted mean, where the newest sample carries the highest
/// weight (`weight = position + 1`, oldest at position 0).
pub struct BandSmoother {
    history_len: usize,
    histories: [VecDeque<f32>; 5],
}

impl BandSmoother {
    pub fn new(history_len: usize) -> Self {
        Self {
            history_len,
            histories: std::array::from_fn(|_| VecDeque::with_capacity(history_len)),
        }
    }

    pub fn push(&mut self, raw: &BandEnergies) -> BandEnergies {
        let values = [raw.bass, raw.mid_low, raw.mid, raw.high_mid, raw.high];
        let mut smoothed = [0.0f32; 5];

        for ((ring, &value), out) in self
            .histories
            .iter_mut()
            .zip(values.iter())
            .zip(smoothed.iter_mut())
        {
            ring.push_back(value);
            if ring.len() > self.history_len {
                ring.pop_front();
            }
            *out = Self::weighted_mean(ring);
        }

        BandEnergies {
            bass: smoothed[0],
            mid_low: smoothed[1],
            mid: smoothed[2],
            high_mid: smoothed[3],
            high: smoothed[4],
        }
    }

    pub fn reset(&mut self) {
        for ring in &mut self.histories {
            ring.clear();
        }
    }

    fn weighted_mean(ring: &VecDeque<f32>) -> f32 {
        if ring.is_empty() {
            return 0.0;
        }
        let mut sum = 0.0f32;
        let mut weight_total = 0.0f32;
        for (i, &value) in ring.iter().enumerate() {
            let weight = (i + 1) as f32;
            sum += value * weight;
            weight_total += weight;
        }
        sum / weight_total
    }
}
