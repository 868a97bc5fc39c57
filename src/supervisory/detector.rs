//! Goertzel supervisory-tone detector with attack/recovery hysteresis
//! (spec §4.4, §8 property 10).
//!
//! Detection gates on a windowed Goertzel correlation plus a
//! threshold-and-consecutive-count hysteresis pattern.

use crate::dsp::goertzel::{goertzel_coeff, goertzel_magnitude};

/// The set of candidate frequencies plus a noise-reference bin this
/// detector discriminates among (spec §4.4): AMPS has three SAT tones and a
/// noise bin; NMT has four super-tones and a noise bin. The signaling-tone
/// bin is modeled as its own single-frequency [`ToneDetector`] instance.
#[derive(Debug, Clone)]
pub struct ToneSet {
    pub candidates_hz: Vec<f32>,
    pub noise_ref_hz: f32,
    pub window_ms: u32,
}

impl ToneSet {
    pub const AMPS_SAT: [f32; 3] = [5970.0, 6000.0, 6030.0];
    pub const AMPS_NOISE_REF_HZ: f32 = 5800.0;
    pub const AMPS_SIGNALING_TONE_HZ: f32 = 10_000.0;

    pub const NMT_SUPER: [f32; 4] = [3955.0, 3985.0, 4015.0, 4045.0];
    pub const NMT_NOISE_REF_HZ: f32 = 3900.0;

    pub fn amps_sat() -> Self {
        Self { candidates_hz: Self::AMPS_SAT.to_vec(), noise_ref_hz: Self::AMPS_NOISE_REF_HZ, window_ms: 100 }
    }

    pub fn nmt_super() -> Self {
        Self { candidates_hz: Self::NMT_SUPER.to_vec(), noise_ref_hz: Self::NMT_NOISE_REF_HZ, window_ms: 250 }
    }

    pub fn signaling_tone() -> Self {
        Self { candidates_hz: vec![Self::AMPS_SIGNALING_TONE_HZ], noise_ref_hz: Self::AMPS_NOISE_REF_HZ, window_ms: 100 }
    }
}

/// Per-window result: best-matching candidate frequency index, its quality
/// `(sig - noise) / sig`, and whether it cleared `quality_threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneWindowResult {
    pub best_candidate: usize,
    pub quality: f32,
    pub above_threshold: bool,
}

/// Hysteresis-gated detector: `hysteresis_count` consecutive above-threshold
/// windows to declare detected, the same count of below-threshold windows
/// to declare lost (spec §4.4, §8 property 10).
pub struct ToneDetector {
    sample_rate: u32,
    candidate_coeffs: Vec<f32>,
    noise_coeff: f32,
    window_samples: usize,
    quality_threshold: f32,
    hysteresis_count: u32,

    detected: bool,
    consecutive_above: u32,
    consecutive_below: u32,
    buffer: Vec<f32>,
}

impl ToneDetector {
    pub fn new(tones: &ToneSet, sample_rate: u32, quality_threshold: f32, hysteresis_count: u32) -> Self {
        let window_samples = (sample_rate as u64 * tones.window_ms as u64 / 1000) as usize;
        Self {
            sample_rate,
            candidate_coeffs: tones.candidates_hz.iter().map(|&f| goertzel_coeff(f, sample_rate)).collect(),
            noise_coeff: goertzel_coeff(tones.noise_ref_hz, sample_rate),
            window_samples: window_samples.max(1),
            quality_threshold,
            hysteresis_count,
            detected: false,
            consecutive_above: 0,
            consecutive_below: 0,
            buffer: Vec::new(),
        }
    }

    pub fn is_detected(&self) -> bool {
        self.detected
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn evaluate_window(&self, window: &[f32]) -> ToneWindowResult {
        let noise = goertzel_magnitude(window, self.noise_coeff).max(1e-6);
        let (best_idx, best_sig) = self
            .candidate_coeffs
            .iter()
            .map(|&c| goertzel_magnitude(window, c))
            .enumerate()
            .fold((0usize, 0.0f32), |(bi, bs), (i, s)| if s > bs { (i, s) } else { (bi, bs) });
        let quality = (best_sig - noise) / best_sig.max(1e-6);
        ToneWindowResult { best_candidate: best_idx, quality, above_threshold: quality >= self.quality_threshold }
    }

    /// Feed RX samples; runs one evaluation per full window accumulated and
    /// returns `Some(detected)` each time the hysteresis state *transitions*
    /// (the protocol FSM's `on_sat(detected)`/`on_signaling_tone(detected)`
    /// callback per spec §4.4), `None` otherwise.
    pub fn process(&mut self, samples: &[f32]) -> Option<bool> {
        self.buffer.extend_from_slice(samples);
        let mut transition = None;
        while self.buffer.len() >= self.window_samples {
            let window: Vec<f32> = self.buffer.drain(..self.window_samples).collect();
            let result = self.evaluate_window(&window);
            if result.above_threshold {
                self.consecutive_above += 1;
                self.consecutive_below = 0;
            } else {
                self.consecutive_below += 1;
                self.consecutive_above = 0;
            }

            if !self.detected && self.consecutive_above >= self.hysteresis_count {
                self.detected = true;
                transition = Some(true);
            } else if self.detected && self.consecutive_below >= self.hysteresis_count {
                self.detected = false;
                transition = Some(false);
            }
        }
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, sample_rate: u32, n: usize) -> Vec<f32> {
        (0..n).map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin()).collect()
    }

    #[test]
    fn declares_detected_after_n_consecutive_above_threshold_windows() {
        let sample_rate = 48_000;
        let tones = ToneSet::amps_sat();
        let mut det = ToneDetector::new(&tones, sample_rate, 0.3, 3);
        let window_samples = (sample_rate as u64 * 100 / 1000) as usize;
        let sat_tone = tone(6000.0, sample_rate, window_samples * 2);

        assert_eq!(det.process(&sat_tone), None); // 2 windows, need 3
        let more = tone(6000.0, sample_rate, window_samples);
        assert_eq!(det.process(&more), Some(true));
        assert!(det.is_detected());
    }

    #[test]
    fn single_spurious_window_does_not_flip_state() {
        let sample_rate = 48_000;
        let tones = ToneSet::amps_sat();
        let mut det = ToneDetector::new(&tones, sample_rate, 0.3, 3);
        let window_samples = (sample_rate as u64 * 100 / 1000) as usize;

        det.process(&tone(6000.0, sample_rate, window_samples * 3));
        assert!(det.is_detected());

        // one noisy window (silence) shouldn't immediately declare loss
        det.process(&vec![0.0f32; window_samples]);
        assert!(det.is_detected());
    }

    #[test]
    fn loses_detection_after_n_consecutive_below_threshold_windows() {
        let sample_rate = 48_000;
        let tones = ToneSet::amps_sat();
        let mut det = ToneDetector::new(&tones, sample_rate, 0.3, 3);
        let window_samples = (sample_rate as u64 * 100 / 1000) as usize;

        det.process(&tone(6000.0, sample_rate, window_samples * 3));
        assert!(det.is_detected());

        let silence = vec![0.0f32; window_samples * 3];
        assert_eq!(det.process(&silence), Some(false));
        assert!(!det.is_detected());
    }
}
