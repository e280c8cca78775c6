//! # Bit Packing Primitives
//!
//! Everything on the wire is built from one 8-bit read-modify-write
//! primitive. A value of up to 8 bits at an arbitrary bit offset touches at
//! most two bytes:
//!
//! ```text
//!   byte p                  byte p + 1
//! ┌─────────────────────┐ ┌─────────────────────┐
//! │ new bits │ old bits │ │ old bits │ new bits │
//! └─────────────────────┘ └─────────────────────┘
//!   ^ bits_free  ^ bits_used         ^ n - bits_free
//! ```
//!
//! Bits are LSB-first: bit offset `k` lives in byte `k / 8`, bit `k % 8`.
//! Wider integers are peeled off 8 bits at a time, low byte first.
//!
//! Callers own bounds checking. These functions index directly and panic on
//! a short slice, which the writer and reader rule out before calling.

/// Number of bytes needed to hold `bits` bits.
#[inline]
#[must_use]
pub const fn bytes_for_bits(bits: usize) -> usize {
    (bits + 7) >> 3
}

/// Mask with the low `n` bits set, `n` in `0..=8`.
#[inline]
const fn low_mask(n: usize) -> u32 {
    (1u32 << n) - 1
}

/// Packs the low `n_bits` (1..=8) of `src` into `dest` at bit `dest_offset`.
///
/// Bits of `dest` outside the target range are preserved.
#[inline]
pub fn pack_bits(src: u8, n_bits: usize, dest: &mut [u8], dest_offset: usize) {
    debug_assert!((1..=8).contains(&n_bits));

    let src = u32::from(src) & low_mask(n_bits);
    let p = dest_offset >> 3;
    let bits_used = dest_offset & 0x7;
    let bits_free = 8 - bits_used;

    if n_bits <= bits_free {
        // Keep everything below the cursor and above the new field.
        let keep = low_mask(bits_used) | (0xFF << (bits_used + n_bits));
        dest[p] = ((u32::from(dest[p]) & keep) | (src << bits_used)) as u8;
        return;
    }

    let spill = n_bits - bits_free;
    dest[p] = ((u32::from(dest[p]) & low_mask(bits_used)) | (src << bits_used)) as u8;
    dest[p + 1] = ((u32::from(dest[p + 1]) & (0xFF << spill)) | (src >> bits_free)) as u8;
}

/// Packs the low `n_bits` (1..=32) of `src` into `dest` at bit `dest_offset`.
#[inline]
pub fn pack_uint(src: u32, n_bits: usize, dest: &mut [u8], dest_offset: usize) {
    debug_assert!((1..=32).contains(&n_bits));

    let mut src = src;
    let mut n_bits = n_bits;
    let mut offset = dest_offset;
    while n_bits > 8 {
        pack_bits(src as u8, 8, dest, offset);
        src >>= 8;
        offset += 8;
        n_bits -= 8;
    }
    pack_bits(src as u8, n_bits, dest, offset);
}

/// Reads `n_bits` (1..=8) from `src` at bit `src_offset`.
#[inline]
#[must_use]
pub fn unpack_bits(src: &[u8], n_bits: usize, src_offset: usize) -> u8 {
    debug_assert!((1..=8).contains(&n_bits));

    let p = src_offset >> 3;
    let bits_used = src_offset & 0x7;
    let bits_free = 8 - bits_used;

    let mut value = u32::from(src[p]) >> bits_used;
    if n_bits > bits_free {
        value |= u32::from(src[p + 1]) << bits_free;
    }
    (value & low_mask(n_bits)) as u8
}

/// Reads `n_bits` (1..=32) from `src` at bit `src_offset`.
#[inline]
#[must_use]
pub fn unpack_uint(src: &[u8], n_bits: usize, src_offset: usize) -> u32 {
    debug_assert!((1..=32).contains(&n_bits));

    let mut value = 0u32;
    let mut shift = 0;
    let mut n_bits = n_bits;
    let mut offset = src_offset;
    while n_bits > 8 {
        value |= u32::from(unpack_bits(src, 8, offset)) << shift;
        shift += 8;
        offset += 8;
        n_bits -= 8;
    }
    value | (u32::from(unpack_bits(src, n_bits, offset)) << shift)
}
