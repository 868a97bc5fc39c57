//! Per-system bit rate and idle-pattern table (spec §4.2).

use crate::channel::System;

/// Bit rate and line-coding shape for one system's FSK/biphase channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRate {
    pub bits_per_second: u32,
    pub manchester: bool,
}

impl BitRate {
    pub const AMPS: Self = Self { bits_per_second: 10_000, manchester: true };
    pub const NMT: Self = Self { bits_per_second: 1_200, manchester: true };
    pub const BNETZ: Self = Self { bits_per_second: 100, manchester: false };
    pub const CNETZ: Self = Self { bits_per_second: 5_280, manchester: false };
    pub const GOLAY: Self = Self { bits_per_second: 600, manchester: false };

    pub fn for_system(system: System) -> Self {
        match system {
            System::Amps | System::Tacs | System::Jtacs => Self::AMPS,
            System::Nmt450 | System::Nmt900 => Self::NMT,
            System::BNetz => Self::BNETZ,
            System::CNetz => Self::CNETZ,
        }
    }

    /// Samples per bit at `sample_rate`, rounded to the nearest integer.
    /// The modulator carries the fractional remainder across chunk
    /// boundaries rather than truncating every bit (spec §4.2).
    pub fn samples_per_bit_f32(self, sample_rate: u32) -> f32 {
        sample_rate as f32 / self.bits_per_second as f32
    }
}

/// Idle line pattern emitted when a modulator runs out of source bits
/// (spec §4.2): an FFSK mark tone for biphase systems, a test tone
/// otherwise. The DSP-mode decides which is active; this just names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdlePattern {
    FfskMark,
    TestTone,
}

impl BitRate {
    pub fn idle_pattern(self) -> IdlePattern {
        if self.manchester {
            IdlePattern::FfskMark
        } else {
            IdlePattern::TestTone
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amps_is_ten_kbps_manchester() {
        assert_eq!(BitRate::for_system(System::Amps), BitRate::AMPS);
        assert_eq!(BitRate::AMPS.bits_per_second, 10_000);
        assert!(BitRate::AMPS.manchester);
    }

    #[test]
    fn nmt_is_1200bps_biphase() {
        assert_eq!(BitRate::for_system(System::Nmt450), BitRate::NMT);
        assert_eq!(BitRate::NMT.bits_per_second, 1200);
    }

    #[test]
    fn idle_pattern_follows_line_coding() {
        assert_eq!(BitRate::AMPS.idle_pattern(), IdlePattern::FfskMark);
        assert_eq!(BitRate::CNETZ.idle_pattern(), IdlePattern::TestTone);
    }

    #[test]
    fn samples_per_bit_matches_sample_rate_ratio() {
        let spb = BitRate::AMPS.samples_per_bit_f32(48_000);
        assert!((spb - 4.8).abs() < 1e-6);
    }
}
