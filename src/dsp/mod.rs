//! DSP primitives (C1)
//!
//! Pure-function / small-state signal blocks shared by every system: emphasis
//! filters, a DC-blocking high-pass, the compander, the single-frequency
//! Goertzel detector, and an audio level meter. Nothing here knows about
//! frames, channels, or protocol state — these are the leaves of the
//! dependency graph (spec §2).

pub mod compander;
pub mod dc_filter;
pub mod emphasis;
pub mod goertzel;
pub mod level;

pub use compander::Compander;
pub use dc_filter::DcFilter;
pub use emphasis::{DeEmphasis, PreEmphasis};
pub use goertzel::goertzel_magnitude;
pub use level::{level_db, rms};
