//! Small bit-vector helpers shared by the frame codecs, built on `bitvec`.
//! All frame schemas use MSB-first bit order, matching the wire order the
//! systems this core targets actually transmit in.

use bitvec::prelude::*;

pub type Bits = BitVec<u8, Msb0>;
pub type BitSliceRef<'a> = &'a BitSlice<u8, Msb0>;

/// Pack the low `width` bits of `value` onto the end of `out`, MSB first.
pub fn push_uint(out: &mut Bits, value: u64, width: usize) {
    for i in (0..width).rev() {
        out.push((value >> i) & 1 == 1);
    }
}

/// Read `width` bits starting at `offset` as an unsigned integer, MSB first.
pub fn read_uint(bits: BitSliceRef, offset: usize, width: usize) -> u64 {
    let mut value = 0u64;
    for bit in &bits[offset..offset + width] {
        value = (value << 1) | (*bit as u64);
    }
    value
}

/// Count 1-bits, used by checksum/parity routines (e.g. AMPS caller-ID chunk checksum).
pub fn popcount(bits: BitSliceRef) -> u32 {
    bits.count_ones() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_read_roundtrip() {
        let mut b = Bits::new();
        push_uint(&mut b, 0b1011, 4);
        push_uint(&mut b, 0x3F, 6);
        assert_eq!(read_uint(&b, 0, 4), 0b1011);
        assert_eq!(read_uint(&b, 4, 6), 0x3F);
    }

    #[test]
    fn zero_width_reads_zero() {
        let b = Bits::new();
        assert_eq!(read_uint(&b, 0, 0), 0);
    }
}
