//! Compander (spec §4.1), grounded on `common/compander.c`'s numeric scheme.
//!
//! Separate envelopes for compress and expand. Step factors follow ITU-T
//! G.162: after `attack_ms` the envelope has risen to 1.5x steady state;
//! after `recovery_ms` it has fallen to 0.75x. The envelope is clamped to a
//! small floor to keep the square-root gain (compress path) defined, and
//! output samples are clipped to the signed 16-bit range.

const ZERO_DB_LEVEL: f64 = 16384.0;
const ATTACK_FACTOR: f64 = 1.5;
const RECOVERY_FACTOR: f64 = 0.75;
const ENVELOPE_MIN: f64 = 0.001;

#[derive(Debug, Clone, Copy)]
pub struct Compander {
    step_up: f64,
    step_down: f64,
    envelope_compress: f64,
    envelope_expand: f64,
}

impl Compander {
    /// `attack_ms`/`recovery_ms`: AMPS and NMT both use 3.0 / 13.5.
    pub fn new(sample_rate: u32, attack_ms: f64, recovery_ms: f64) -> Self {
        let sr = sample_rate as f64;
        Self {
            step_up: ATTACK_FACTOR.powf(1000.0 / attack_ms / sr),
            step_down: RECOVERY_FACTOR.powf(1000.0 / recovery_ms / sr),
            envelope_compress: 1.0,
            envelope_expand: 1.0,
        }
    }

    /// Compress a block of 16-bit PCM samples in place (TX path, mic → air).
    pub fn compress(&mut self, samples: &mut [i16]) {
        let mut envelope = self.envelope_compress;
        for sample in samples.iter_mut() {
            let mut value = *sample as f64 / ZERO_DB_LEVEL;

            if value.abs() > envelope {
                envelope *= self.step_up;
            } else {
                envelope *= self.step_down;
            }
            if envelope < ENVELOPE_MIN {
                envelope = ENVELOPE_MIN;
            }

            value /= envelope.sqrt();

            *sample = clip_i16(value * ZERO_DB_LEVEL);
        }
        self.envelope_compress = envelope;
    }

    /// Expand a block of 16-bit PCM samples in place (RX path, air → speaker).
    pub fn expand(&mut self, samples: &mut [i16]) {
        let mut envelope = self.envelope_expand;
        for sample in samples.iter_mut() {
            let mut value = *sample as f64 / ZERO_DB_LEVEL;

            if value.abs() > envelope {
                envelope *= self.step_up;
            } else {
                envelope *= self.step_down;
            }
            if envelope < ENVELOPE_MIN {
                envelope = ENVELOPE_MIN;
            }

            value *= envelope;

            *sample = clip_i16(value * ZERO_DB_LEVEL);
        }
        self.envelope_expand = envelope;
    }
}

fn clip_i16(value: f64) -> i16 {
    if value > i16::MAX as f64 {
        i16::MAX
    } else if value < i16::MIN as f64 {
        i16::MIN
    } else {
        value as i16
    }
}
