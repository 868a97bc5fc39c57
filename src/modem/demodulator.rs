//! Window-slide FSK demodulator with sync hunt (spec §4.3).
//!
//! Sync state is tracked across repeated calls and refined incrementally;
//! soft-bit extraction uses `s = (mag_high/level - mag_low/level + 1) / 2`
//! over windowed mark/space energy from [`crate::dsp::goertzel`].

use crate::dsp::goertzel::{goertzel_coeff, goertzel_magnitude};
use crate::dsp::level::rms;

/// Sync-hunt sub-state (spec §4.3): `None` / `Dotting` both run the
/// zero-crossing dotting metric; `PositiveSync`/`NegativeSync` track which
/// Barker polarity matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    None,
    Dotting,
    PositiveSync,
    NegativeSync,
}

/// One demodulated bit plus its averaged level/quality, handed off once a
/// full frame has been accumulated (spec §4.3's "level and quality per bit
/// are averaged over the frame").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemodulatedBit {
    pub bit: bool,
    pub quality: f32,
    pub level: f32,
}

/// Tolerant matching allows up to one bit of mismatch against the expected
/// sync word (spec §4.3, §8 property 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTolerance {
    Strict,
    Tolerant,
}

pub struct Demodulator {
    sample_rate: u32,
    mark_coeff: f32,
    space_coeff: f32,
    window_samples: usize,
    step_samples: usize,
    sync_word: Vec<bool>,
    tolerance: SyncTolerance,
    frame_bits: usize,

    buffer: Vec<f32>,
    sync_state: SyncState,
    last_hard_bit: Option<bool>,
    half_bit_counter: usize,
    samples_per_bit: usize,
    edge_intervals: std::collections::VecDeque<usize>,
    samples_since_edge: usize,
    dotting_window: Vec<bool>,
    frame_buffer: Vec<DemodulatedBit>,
}

impl Demodulator {
    /// `mark_hz`/`space_hz` are the two FSK tone frequencies; `bit_hz` the
    /// line rate; `sync_word` the Barker/sync pattern to hunt for;
    /// `frame_bits` the fixed frame length handed to the codec once reached.
    pub fn new(
        sample_rate: u32,
        mark_hz: f32,
        space_hz: f32,
        bit_hz: f32,
        sync_word: Vec<bool>,
        frame_bits: usize,
        tolerance: SyncTolerance,
    ) -> Self {
        let samples_per_bit = (sample_rate as f32 / bit_hz).round() as usize;
        let window_samples = samples_per_bit.max(1);
        let step_samples = (window_samples / 10).max(1);
        Self {
            sample_rate,
            mark_coeff: goertzel_coeff(mark_hz, sample_rate),
            space_coeff: goertzel_coeff(space_hz, sample_rate),
            window_samples,
            step_samples,
            sync_word,
            tolerance,
            frame_bits,
            buffer: Vec::new(),
            sync_state: SyncState::None,
            last_hard_bit: None,
            half_bit_counter: 0,
            samples_per_bit,
            edge_intervals: std::collections::VecDeque::with_capacity(8),
            samples_since_edge: 0,
            dotting_window: Vec::new(),
            frame_buffer: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.sync_state = SyncState::None;
        self.last_hard_bit = None;
        self.half_bit_counter = 0;
        self.edge_intervals.clear();
        self.samples_since_edge = 0;
        self.dotting_window.clear();
        self.frame_buffer.clear();
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    /// One soft-bit evaluation at the current window position, per spec
    /// §4.3 step 1-3.
    fn soft_bit(&self, window: &[f32]) -> (bool, f32, f32) {
        let mag_high = goertzel_magnitude(window, self.mark_coeff);
        let mag_low = goertzel_magnitude(window, self.space_coeff);
        let level = rms(window).max(1e-6);
        let s = (mag_high / level - mag_low / level + 1.0) / 2.0;
        let s = s.clamp(0.0, 1.0);
        let bit = s > 0.5;
        let quality = (2.0 * s - 1.0).abs();
        (bit, quality, level)
    }

    /// Feed a chunk of RX samples through the window-slide/sync-hunt
    /// pipeline. Returns any frames completed during this call (each a full
    /// `frame_bits`-length sequence of [`DemodulatedBit`]).
    pub fn process(&mut self, samples: &[f32]) -> Vec<Vec<DemodulatedBit>> {
        self.buffer.extend_from_slice(samples);
        let mut completed_frames = Vec::new();

        while self.buffer.len() >= self.window_samples {
            let window = self.buffer[..self.window_samples].to_vec();
            let (bit, quality, level) = self.soft_bit(&window);

            let changed = self.last_hard_bit.map(|prev| prev != bit).unwrap_or(true);
            if changed {
                self.on_polarity_change(bit);
            } else {
                self.half_bit_counter += self.step_samples;
            }
            self.samples_since_edge += self.step_samples;

            match self.sync_state {
                SyncState::None | SyncState::Dotting => {
                    self.update_dotting(bit, changed);
                }
                SyncState::PositiveSync | SyncState::NegativeSync => {
                    if self.half_bit_counter >= self.samples_per_bit {
                        self.half_bit_counter -= self.samples_per_bit;
                        self.frame_buffer.push(DemodulatedBit { bit, quality, level });
                        if self.frame_buffer.len() >= self.frame_bits {
                            completed_frames.push(std::mem::take(&mut self.frame_buffer));
                            self.sync_state = SyncState::None;
                        }
                    }
                }
            }

            self.last_hard_bit = Some(bit);
            self.buffer.drain(..self.step_samples.min(self.buffer.len()));
        }

        completed_frames
    }

    fn on_polarity_change(&mut self, _bit: bool) {
        if self.samples_since_edge > 0 {
            self.edge_intervals.push_back(self.samples_since_edge);
            if self.edge_intervals.len() > 8 {
                self.edge_intervals.pop_front();
            }
        }
        self.samples_since_edge = 0;
        // Resync the half-bit sample counter on every polarity change.
        self.half_bit_counter = self.samples_per_bit / 2;
    }

    fn update_dotting(&mut self, bit: bool, changed: bool) {
        self.dotting_window.push(bit);
        if self.dotting_window.len() > self.sync_word.len() {
            self.dotting_window.remove(0);
        }

        if changed {
            self.sync_state = SyncState::Dotting;
        }

        if self.edge_intervals.len() >= 8 {
            let ideal = self.samples_per_bit as f32;
            let tolerance = ideal * 0.5;
            let dotting_ok = self
                .edge_intervals
                .iter()
                .all(|&iv| (iv as f32 - ideal).abs() <= tolerance);
            if dotting_ok && self.dotting_window.len() == self.sync_word.len() {
                if let Some(state) = self.match_sync_word() {
                    self.sync_state = state;
                    self.half_bit_counter = 0;
                    self.frame_buffer.clear();
                }
            }
        }
    }

    fn match_sync_word(&self) -> Option<SyncState> {
        let errors_positive = hamming(&self.dotting_window, &self.sync_word);
        let inverted: Vec<bool> = self.sync_word.iter().map(|b| !b).collect();
        let errors_negative = hamming(&self.dotting_window, &inverted);

        let budget = match self.tolerance {
            SyncTolerance::Strict => 0,
            SyncTolerance::Tolerant => 1,
        };

        if errors_positive <= budget {
            Some(SyncState::PositiveSync)
        } else if errors_negative <= budget {
            Some(SyncState::NegativeSync)
        } else {
            None
        }
    }

    /// Sample-rate accessor, used by callers wiring in Goertzel windows for
    /// other detectors that need to share the demod's timebase.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

fn hamming(a: &[bool], b: &[bool]) -> usize {
    if a.len() != b.len() {
        return usize::MAX;
    }
    a.iter().zip(b.iter()).filter(|(x, y)| x != y).count()
}
