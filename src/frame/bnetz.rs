//! B-Netz frame codec (spec §4.5): 16-bit digit telegrams.
//!
//! Each telegram is a 7-bit header (`0111` + `010`) followed by 9 payload
//! bits encoding a digit 0-9, the dial-start/dial-stop signals, or the
//! "Gruppenfreisignal" idle code. Level changes on the channel are used both
//! to decode digits and to detect the continuous tone pair (1950/2070 Hz)
//! that accompanies dialing; the tone frequencies are listed here because
//! they gate this codec's digit decisions, even though the Goertzel work
//! itself lives in [`crate::dsp::goertzel`].

use crate::bitbuf::{push_uint, read_uint, Bits};
use bitvec::prelude::*;

/// 7-bit header: `0111` followed by `010` (spec §4.5).
pub const HEADER: [u8; 7] = [0, 1, 1, 1, 0, 1, 0];

pub const TONE_LOW_HZ: f32 = 1950.0;
pub const TONE_HIGH_HZ: f32 = 2070.0;

const PAYLOAD_BITS: usize = 9;
const DIAL_START_CODE: u16 = 10;
const DIAL_STOP_CODE: u16 = 11;
const GROUP_FREE_CODE: u16 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Telegram {
    Digit(u8),
    DialStart,
    DialStop,
    GroupFree,
    Unknown(u16),
}

impl Telegram {
    fn code(self) -> u16 {
        match self {
            Telegram::Digit(d) => d as u16,
            Telegram::DialStart => DIAL_START_CODE,
            Telegram::DialStop => DIAL_STOP_CODE,
            Telegram::GroupFree => GROUP_FREE_CODE,
            Telegram::Unknown(v) => v,
        }
    }

    fn from_code(code: u16) -> Self {
        match code {
            0..=9 => Telegram::Digit(code as u8),
            DIAL_START_CODE => Telegram::DialStart,
            DIAL_STOP_CODE => Telegram::DialStop,
            GROUP_FREE_CODE => Telegram::GroupFree,
            other => Telegram::Unknown(other),
        }
    }
}

/// Assemble a 16-bit telegram: 7-bit header + 9-bit payload code.
pub fn encode(telegram: Telegram) -> Bits {
    let mut bits = Bits::with_capacity(16);
    for &b in HEADER.iter() {
        bits.push(b == 1);
    }
    push_uint(&mut bits, telegram.code() as u64, PAYLOAD_BITS);
    bits
}

/// Parse a 16-bit telegram, verifying the header. Returns `None` if the
/// header doesn't match (frame dropped, per spec §7).
pub fn decode(bits: &BitSlice<u8, Msb0>) -> Option<Telegram> {
    if bits.len() != 16 {
        return None;
    }
    for (i, &expect) in HEADER.iter().enumerate() {
        if bits[i] as u8 != expect {
            return None;
        }
    }
    let code = read_uint(bits, 7, PAYLOAD_BITS) as u16;
    Some(Telegram::from_code(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_roundtrip() {
        for d in 0..10u8 {
            let bits = encode(Telegram::Digit(d));
            assert_eq!(decode(&bits), Some(Telegram::Digit(d)));
        }
    }

    #[test]
    fn control_codes_roundtrip() {
        for t in [Telegram::DialStart, Telegram::DialStop, Telegram::GroupFree] {
            let bits = encode(t);
            assert_eq!(decode(&bits), Some(t));
        }
    }

    #[test]
    fn bad_header_is_dropped() {
        let mut bits = encode(Telegram::Digit(5));
        let b = bits[0];
        bits.set(0, !b);
        assert_eq!(decode(&bits), None);
    }
}
