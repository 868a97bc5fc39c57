//! Supervisory subsystem (C4): SAT (AMPS) / super-tone (NMT) / signaling-tone
//! detection and generation, with attack/recovery hysteresis (spec §4.4).

pub mod detector;
pub mod generator;

pub use detector::{ToneDetector, ToneSet};
pub use generator::ToneGenerator;
