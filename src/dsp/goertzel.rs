//! Single-frequency Goertzel magnitude (spec §4.1).
//!
//! Given a precomputed `coeff = 2*cos(2*pi*f/fs)`, computes the magnitude of
//! the DFT bin at `f` over the supplied sample window. The result is never
//! normalized here — callers that need a ratio (SAT quality, soft-bit value)
//! divide by a reference bin themselves.

/// Precompute the recursion coefficient for a target frequency.
pub fn goertzel_coeff(freq_hz: f32, sample_rate: u32) -> f32 {
    2.0 * (2.0 * std::f32::consts::PI * freq_hz / sample_rate as f32).cos()
}

/// Run the Goertzel recursion over `samples` using a precomputed `coeff`,
/// returning the (unnormalized) magnitude.
pub fn goertzel_magnitude(samples: &[f32], coeff: f32) -> f32 {
    let mut s_prev = 0.0f32;
    let mut s_prev2 = 0.0f32;

    for &x in samples {
        let s = x + coeff * s_prev - s_prev2;
        s_prev2 = s_prev;
        s_prev = s;
    }

    (s_prev2 * s_prev2 + s_prev * s_prev - coeff * s_prev * s_prev2).sqrt()
}

/// Convenience: compute magnitude directly from a frequency, recomputing the
/// coefficient each call. Prefer [`goertzel_coeff`] + [`goertzel_magnitude`]
/// when evaluating the same frequency repeatedly (the supervisory detector
/// and demodulator both do).
pub fn goertzel_magnitude_at(samples: &[f32], freq_hz: f32, sample_rate: u32) -> f32 {
    goertzel_magnitude(samples, goertzel_coeff(freq_hz, sample_rate))
}
