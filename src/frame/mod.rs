//! Per-system frame codecs (C5, spec §4.5): bit-exact encode/decode for the
//! signaling words each protocol carries, plus the shared BCH/cyclic-code
//! machinery they're built from.

pub mod amps;
pub mod bch;
pub mod bnetz;
pub mod cnetz;
pub mod nmt;
pub mod pager;
