//! Per-bin logarithmic magnitude in whole decibels.
//!
//! The log is never evaluated per sample. Instead a table holds the squared
//! amplitude of every 1 dB step below full scale, and a bin's loudness is the
//! index of the first step its power reaches. Powers are compared in `i64` so
//! `re^2 + im^2` cannot overflow for any pair of `i16` inputs.

use super::fft::Q15_ONE;

/// Number of 1 dB steps covered below full scale.
pub const LOUD_STEPS: usize = 100;

/// dB added per `scale_shift` step; one bit of amplitude is ~6 dB.
const DB_PER_SHIFT: i32 = 6;

#[derive(Clone, Debug)]
pub struct LoudnessTable {
    /// `thresholds[i]` is the power boundary between `-i` dB and `-(i+1)` dB.
    thresholds: [i64; LOUD_STEPS],
}

impl LoudnessTable {
    pub fn new() -> Self {
        let mut amplitudes = [0i64; LOUD_STEPS];
        for (i, amplitude) in amplitudes.iter_mut().enumerate() {
            let gain = 10f64.powf(-(i as f64) / 20.0);
            *amplitude = (Q15_ONE as f64 * gain).round() as i64;
        }

        // Boundaries sit halfway (in power) between neighbouring steps so a
        // bin rounds to the nearest dB; the last step keeps its own power.
        let mut thresholds = [0i64; LOUD_STEPS];
        for i in 0..LOUD_STEPS {
            let power = amplitudes[i] * amplitudes[i];
            thresholds[i] = match amplitudes.get(i + 1) {
                Some(next) => (power + next * next) / 2,
                None => power,
            };
        }
        Self { thresholds }
    }

    /// Loudness of one bin in dB relative to full scale, in `[-LOUD_STEPS, 0]`.
    pub fn db_from_ampl(&self, re: i16, im: i16) -> i16 {
        let power = re as i64 * re as i64 + im as i64 * im as i64;
        let step = self
            .thresholds
            .iter()
            .position(|&threshold| threshold <= power)
            .unwrap_or(LOUD_STEPS);
        -(step as i16)
    }

    /// Fills `loud` with the loudness of every bin of `real`/`imag`.
    ///
    /// The forward transform divides by `N`, so raw values sit well below
    /// full scale; every bin is lifted by `(scale_shift + 1) * 6` dB to
    /// compensate. Results are capped at 0 dB, or 10 dB once a positive
    /// `scale_shift` is asked for. The offset is summed in `i32` and the
    /// result saturates at `i16::MIN` for large negative shifts.
    pub fn compute(&self, loud: &mut [i16], real: &[i16], imag: &[i16], scale_shift: i16) {
        let ceiling: i32 = if scale_shift > 0 { 10 } else { 0 };
        let offset = (scale_shift as i32 + 1) * DB_PER_SHIFT;

        for ((out, &re), &im) in loud.iter_mut().zip(real).zip(imag) {
            let db = (self.db_from_ampl(re, im) as i32 + offset).min(ceiling);
            *out = db.max(i16::MIN as i32) as i16;
        }
    }
}

impl Default for LoudnessTable {
    fn default() -> Self {
        Self::new()
    }
}
