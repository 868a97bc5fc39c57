//! FSK/biphase modem (C2/C3): per-system bit rates, a ramp-shaped
//! Manchester/biphase modulator, and a window-slide demodulator with sync
//! hunt. Sits between [`crate::frame`]'s bit-exact frames and the sample
//! stream a transceiver pushes to/pulls from the radio (spec §2/§4.2/§4.3).

pub mod demodulator;
pub mod modulator;
pub mod rates;

pub use demodulator::{Demodulator, DemodulatedBit, SyncState};
pub use modulator::Modulator;
pub use rates::BitRate;
