//! Channel number ↔ frequency tables (spec §6), and the [`System`] tag used
//! throughout the core to pick per-system behavior (spec §9 design note:
//! "tagged variants with per-variant methods, not inheritance").

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum System {
    Amps,
    Tacs,
    Jtacs,
    Nmt450,
    Nmt900,
    BNetz,
    CNetz,
}

/// Broadcast overhead fields for one cell, read-only during a call (spec §3).
#[derive(Debug, Clone, Copy)]
pub struct SystemInfo {
    pub system: System,
    /// AMPS: SID; C-Netz: FuFSt; otherwise unused (0).
    pub system_id: u32,
    /// AMPS: DCC (0..3); C-Netz: DCC.
    pub dcc: u8,
    /// AMPS: DTX (discontinuous transmission flag).
    pub dtx: bool,
    /// AMPS: registration id field; NMT: area number.
    pub regid: u16,
    /// NMT: traffic area.
    pub traffic_area: u8,
    /// NMT: MS transmit power class.
    pub ms_power: u8,
}

impl SystemInfo {
    pub fn new(system: System) -> Self {
        Self {
            system,
            system_id: 0,
            dcc: 0,
            dtx: false,
            regid: 0,
            traffic_area: 0,
            ms_power: 0,
        }
    }
}

/// Error returned when a channel number has no valid frequency mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidChannel(pub u32);

const AMPS_STEP_KHZ: f64 = 30.0;
const AMPS_DUPLEX_MHZ: f64 = 45.000;
const TACS_STEP_KHZ: f64 = 25.0;
const TACS_BASE_MHZ: f64 = 935.0125;
const JTACS_DUPLEX_MHZ: f64 = 55.000;

/// `channel_to_freq(channel, uplink)` → downlink (base-to-mobile) or uplink
/// (mobile-to-base) frequency in MHz, per spec §6's per-system tables.
pub fn channel_to_freq(system: System, channel: i32, uplink: bool) -> Result<f64, InvalidChannel> {
    match system {
        System::Amps => {
            let mapped = amps_channel_index(channel).ok_or(InvalidChannel(channel as u32))?;
            let downlink = 870.030 + mapped as f64 * AMPS_STEP_KHZ / 1000.0;
            Ok(if uplink { downlink - AMPS_DUPLEX_MHZ } else { downlink })
        }
        System::Tacs => {
            if !(1..=600).contains(&channel) {
                return Err(InvalidChannel(channel as u32));
            }
            let downlink = TACS_BASE_MHZ + (channel - 1) as f64 * TACS_STEP_KHZ / 1000.0;
            Ok(if uplink { downlink - AMPS_DUPLEX_MHZ } else { downlink })
        }
        System::Jtacs => {
            if !jtacs_channel_valid(channel) {
                return Err(InvalidChannel(channel as u32));
            }
            let downlink = 860.0125 + (channel - 1) as f64 * TACS_STEP_KHZ / 1000.0;
            Ok(if uplink { downlink + JTACS_DUPLEX_MHZ } else { downlink })
        }
        System::Nmt450 => {
            let downlink = match channel {
                1..=180 => 463.000 + (channel - 1) as f64 * 0.025,
                181..=200 => 462.500 + (channel - 181) as f64 * 0.025,
                201..=380 => 463.000 + (channel - 201) as f64 * 0.025 + 0.0125,
                381..=399 => 462.500 + (channel - 381) as f64 * 0.025 + 0.0125,
                _ => return Err(InvalidChannel(channel as u32)),
            };
            Ok(if uplink { downlink - 10.000 } else { downlink })
        }
        System::Nmt900 => {
            if !(1..=1999).contains(&channel) {
                return Err(InvalidChannel(channel as u32));
            }
            let downlink = 935.0125 + (channel - 1) as f64 * 0.0125;
            Ok(if uplink { downlink - 45.000 } else { downlink })
        }
        System::BNetz => {
            if !bnetz_channel_valid(channel) {
                return Err(InvalidChannel(channel as u32));
            }
            let downlink = 157.350 + (channel - 1) as f64 * 0.020;
            Ok(if uplink { downlink - 4.600 } else { downlink })
        }
        System::CNetz => {
            if !(1..=492).contains(&channel) {
                return Err(InvalidChannel(channel as u32));
            }
            let downlink = 465.740 + (channel - 1) as f64 * 0.020;
            Ok(if uplink { downlink - 10.000 } else { downlink })
        }
    }
}

/// Inverse of [`channel_to_freq`]: recover the channel number from a
/// frequency, given which leg (uplink/downlink) it is.
pub fn channel_from_freq(system: System, freq_mhz: f64, uplink: bool) -> Option<i32> {
    // Linear search is fine: channel plans here are a few hundred to ~2000 entries.
    let (lo, hi) = channel_range(system);
    for ch in lo..=hi {
        if let Ok(f) = channel_to_freq(system, ch, uplink) {
            if (f - freq_mhz).abs() < 1e-6 {
                return Some(ch);
            }
        }
    }
    None
}

fn channel_range(system: System) -> (i32, i32) {
    match system {
        System::Amps => (-33, 1023),
        System::Tacs => (1, 600),
        System::Jtacs => (1, 1600),
        System::Nmt450 => (1, 399),
        System::Nmt900 => (1, 1999),
        System::BNetz => (1, 86),
        System::CNetz => (1, 492),
    }
}

/// AMPS channel numbering: 1..799 direct, 990..1023 wrap to -33..0 (spec §6).
fn amps_channel_index(channel: i32) -> Option<i32> {
    if (1..=799).contains(&channel) {
        Some(channel - 1)
    } else if (990..=1023).contains(&channel) {
        Some(channel - 1023 - 1) // 990..1023 -> -33..0
    } else {
        None
    }
}

/// AMPS control channels per spec §6.
pub fn amps_is_control_channel(channel: i32) -> bool {
    (313..=354).contains(&channel)
}

/// TACS control channels per spec §6.
pub fn tacs_is_control_channel(channel: i32) -> bool {
    (23..=43).contains(&channel) || (323..=343).contains(&channel)
}

/// JTACS channel plan is fragmented across four bands (spec §6).
fn jtacs_channel_valid(channel: i32) -> bool {
    (1..=799).contains(&channel)
        || (801..=1039).contains(&channel)
        || (1041..=1199).contains(&channel)
        || (1201..=1600).contains(&channel)
}

/// JTACS control channels: 418..456, even only (spec §6).
pub fn jtacs_is_control_channel(channel: i32) -> bool {
    (418..=456).contains(&channel) && channel % 2 == 0
}

/// B-Netz channels 1..39, 50..86; 19 is the paging channel and excluded
/// from the regular traffic plan (spec §6).
fn bnetz_channel_valid(channel: i32) -> bool {
    ((1..=39).contains(&channel) && channel != 19) || (50..=86).contains(&channel)
}

/// B-Netz's dedicated paging channel.
pub const BNETZ_PAGING_CHANNEL: i32 = 19;

/// Eurosignal channels A-D: `87.34 + 0.025*n` MHz, minus 7.5 kHz in FM mode
/// (spec §6).
pub fn eurosignal_freq_mhz(n: i32, fm_mode: bool) -> f64 {
    let base = 87.34 + 0.025 * n as f64;
    if fm_mode {
        base - 0.0075
    } else {
        base
    }
}
