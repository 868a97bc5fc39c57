//! Base-station protocol core for a multi-system 1G analog cellular
//! emulator (AMPS/TACS/JTACS, NMT-450/900, B-Netz, C-Netz, and the
//! experimental simplex JollyCom repeater), its FSK/FM signal-processing
//! primitives, and its pager sub-system (Eurosignal, Golay/GSC) framing.
//!
//! [`core::Core`] is the top-level context object every entry point is
//! driven through: it owns the transaction arena, the transceiver list, and
//! the timer wheel, and every module below is reached through it rather than
//! through global state.

pub mod bitbuf;
pub mod callcontrol;
pub mod channel;
pub mod config;
pub mod core;
pub mod dms;
pub mod dsp;
pub mod error;
pub mod frame;
pub mod fsm;
pub mod modem;
pub mod scheduler;
pub mod supervisory;
pub mod timer;
pub mod tracing_init;
pub mod transaction;
pub mod transceiver;

pub use crate::core::Core;
pub use config::CoreConfig;
pub use error::{Error, Result};
