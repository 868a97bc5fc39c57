//! DC-blocking high-pass (spec §4.1), cutoff ≈300 Hz, applied before FSK demod.
//!
//! `y = factor * (y_prev + x - x_prev)`. `factor` is derived from the cutoff
//! and sample rate: `factor = 1 / (1 + 2*pi*fc/fs)`.

#[derive(Debug, Clone, Copy)]
pub struct DcFilter {
    factor: f32,
    x_prev: f32,
    y_prev: f32,
}

impl DcFilter {
    /// `cutoff_hz` ≈ 300.0 for the systems this core targets.
    pub fn new(sample_rate: u32, cutoff_hz: f32) -> Self {
        let factor = 1.0 / (1.0 + 2.0 * std::f32::consts::PI * cutoff_hz / sample_rate as f32);
        Self { factor, x_prev: 0.0, y_prev: 0.0 }
    }

    pub fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }

    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.factor * (self.y_prev + x - self.x_prev);
        self.x_prev = x;
        self.y_prev = y;
        y
    }

    pub fn process_block(&mut self, samples: &mut [f32]) {
        for s in samples.iter_mut() {
            *s = self.process(*s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_dc_offset() {
        let mut f = DcFilter::new(8000, 300.0);
        let mut last = 1.0;
        for _ in 0..2000 {
            last = f.process(0.5);
        }
        assert!(last.abs() < 0.01, "residual DC {last} should have decayed");
    }

    #[test]
    fn passes_audio_band_with_little_attenuation() {
        let sr = 8000u32;
        let mut f = DcFilter::new(sr, 300.0);
        let freq = 1000.0f32;
        let mut max_abs = 0.0f32;
        for n in 0..4000 {
            let x = (2.0 * std::f32::consts::PI * freq * n as f32 / sr as f32).sin();
            let y = f.process(x);
            if n > 200 {
                max_abs = max_abs.max(y.abs());
            }
        }
        assert!(max_abs > 0.9, "1kHz tone should pass mostly unattenuated, got {max_abs}");
    }
}
