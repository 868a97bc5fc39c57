//! Audio level meter: RMS over a window and a dB conversion, used to report
//! `rf_level_db` up through `rx_samples` and as the RF-level tiebreaker in
//! the transaction registry (spec §4.9 of the AMPS catalog / §4.8).

/// Root-mean-square of a sample block, samples assumed normalized to [-1, 1].
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Convert an RMS level to dBFS (0 dB = full scale amplitude of 1.0).
pub fn level_db(rms_value: f32) -> f32 {
    if rms_value <= 0.0 {
        return -120.0;
    }
    20.0 * rms_value.log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_full_scale_sine_is_about_0_707() {
        let n = 8000;
        let samples: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 8000.0).sin())
            .collect();
        let r = rms(&samples);
        assert!((r - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.01);
    }

    #[test]
    fn silence_is_floor_db() {
        assert_eq!(level_db(0.0), -120.0);
    }

    #[test]
    fn full_scale_is_about_0db() {
        assert!(level_db(1.0).abs() < 1e-5);
    }
}
