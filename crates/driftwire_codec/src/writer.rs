//! # Bit Writer
//!
//! Packs caller-supplied values into a growable byte buffer using only the
//! bits each value's precision needs.
//!
//! ## Reuse
//!
//! A writer can be pooled: [`BitWriter::reset`] rewinds the cursor and keeps
//! the allocation, so steady-state encoding does not allocate.

use std::io::{self, Write};

use driftwire_shared::{Quaternion, Vec3};

use crate::packing::{bytes_for_bits, pack_uint};
use crate::policy::{max_code, quantize, QuantizationPolicy, MAX_BITS};

/// Extra bytes added whenever the buffer has to grow.
const GROWTH_BYTES: usize = 4;

/// Capacity hint used by [`BitWriter::default`].
pub const DEFAULT_CAPACITY_BITS: usize = 64;

/// Bit-granular encoder.
///
/// Field order and widths are the schema: the peer must issue the matching
/// `get_*` calls on a [`BitReader`](crate::BitReader) in the same order.
///
/// # Example
///
/// ```rust
/// use driftwire_codec::{BitReader, BitWriter};
///
/// let mut writer = BitWriter::new(32);
/// writer.put_bool(true);
/// writer.put_uint(5, 3);
/// writer.put_radians_quantized(1.25);
///
/// let mut reader = BitReader::new(writer.as_bytes());
/// assert!(reader.get_bool().unwrap());
/// assert_eq!(reader.get_uint(3).unwrap(), 5);
/// assert!((reader.get_radians_quantized().unwrap() - 1.25).abs() < 1e-3);
/// ```
#[derive(Clone, Debug)]
pub struct BitWriter {
    buffer: Vec<u8>,
    bit_offset: usize,
    policy: QuantizationPolicy,
}

impl BitWriter {
    /// Creates a writer with room for at least `initial_capacity_bits` bits,
    /// using the protocol quantization profile.
    ///
    /// Zero is legal; the buffer then grows on the first write.
    #[must_use]
    pub fn new(initial_capacity_bits: usize) -> Self {
        Self::with_policy(initial_capacity_bits, QuantizationPolicy::default())
    }

    /// Creates a writer that encodes with `policy`.
    ///
    /// # Panics
    ///
    /// `policy` must pass [`QuantizationPolicy::validate`]. Debug builds
    /// check this here; otherwise the first quantized write panics.
    #[must_use]
    pub fn with_policy(initial_capacity_bits: usize, policy: QuantizationPolicy) -> Self {
        debug_assert!(policy.validate().is_ok(), "invalid quantization policy: {policy:?}");
        Self {
            buffer: vec![0u8; bytes_for_bits(initial_capacity_bits)],
            bit_offset: 0,
            policy,
        }
    }

    /// The policy this writer quantizes with.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> &QuantizationPolicy {
        &self.policy
    }

    /// Bits written so far.
    #[inline]
    #[must_use]
    pub const fn bit_length(&self) -> usize {
        self.bit_offset
    }

    /// Whole bytes needed to hold everything written so far.
    #[inline]
    #[must_use]
    pub const fn byte_length(&self) -> usize {
        bytes_for_bits(self.bit_offset)
    }

    /// Returns true if nothing has been written.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bit_offset == 0
    }

    /// The packed bytes. Unused high bits of the last byte are zero.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.byte_length()]
    }

    /// Copies exactly [`byte_length`](Self::byte_length) bytes into `sink`.
    ///
    /// Leaves the writer untouched, so it can be called repeatedly.
    ///
    /// # Errors
    ///
    /// Propagates the sink's I/O error.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        sink.write_all(self.as_bytes())
    }

    /// Consumes the writer and returns the packed bytes.
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buffer.truncate(self.byte_length());
        self.buffer
    }

    /// Rewinds to an empty message, keeping the allocation.
    pub fn reset(&mut self) {
        let used = self.byte_length();
        self.buffer[..used].fill(0);
        self.bit_offset = 0;
    }

    /// Writes one bit.
    #[inline]
    pub fn put_bool(&mut self, value: bool) {
        self.put_uint(u32::from(value), 1);
    }

    /// Writes the low `bits` bits of `value`.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is outside `1..=32`. A bad width is a bug in the
    /// message definition, not bad input.
    #[inline]
    pub fn put_uint(&mut self, value: u32, bits: u32) {
        assert_width(bits);
        let bits = bits as usize;
        self.reserve_bits(bits);
        pack_uint(value, bits, &mut self.buffer, self.bit_offset);
        self.bit_offset += bits;
    }

    /// Writes all 32 bits of `value` (two's complement).
    #[inline]
    pub fn put_int32(&mut self, value: i32) {
        self.put_uint(value as u32, 32);
    }

    /// Writes 8 bits.
    #[inline]
    pub fn put_byte(&mut self, value: u8) {
        self.put_uint(u32::from(value), 8);
    }

    /// Writes the IEEE-754 bit pattern of `value` verbatim.
    #[inline]
    pub fn put_float(&mut self, value: f32) {
        self.put_uint(value.to_bits(), 32);
    }

    /// Writes `x`, `y`, `z` as raw floats (96 bits, exact).
    pub fn put_vector3(&mut self, value: Vec3) {
        self.put_float(value.x);
        self.put_float(value.y);
        self.put_float(value.z);
    }

    /// Writes `value` quantized onto `bits` bits over `[min, max]`.
    ///
    /// Out-of-range input is clamped; NaN encodes as `min`. The decoded value
    /// is within `(max - min) / (2^bits - 1)` of the input.
    ///
    /// # Arguments
    ///
    /// * `value` - Float to encode
    /// * `min` - Lower bound of the expected range
    /// * `max` - Upper bound of the expected range
    /// * `bits` - Field width (1-32)
    ///
    /// # Panics
    ///
    /// Panics if `bits` is outside `1..=32` or `min >= max`.
    pub fn put_ranged_float(&mut self, value: f32, min: f32, max: f32, bits: u32) {
        assert_width(bits);
        assert!(min < max, "invalid ranged float bounds: [{min}, {max}]");
        self.put_uint(quantize(value, min, max, bits), bits);
    }

    /// Writes an angle in radians, wrapped into the policy's angle interval.
    ///
    /// Only the wrapped angle survives: `3π` decodes as `-π`. The top code
    /// names the upper bound, which is the same angle as the lower bound, so
    /// it is folded onto zero.
    pub fn put_radians_quantized(&mut self, angle: f32) {
        let policy = self.policy;
        let wrapped = policy.wrap_angle(angle);
        let code = quantize(wrapped, policy.angle_min, policy.angle_max, policy.bits_angle);
        let code = if code == max_code(policy.bits_angle) { 0 } else { code };
        self.put_uint(code, policy.bits_angle);
    }

    /// Writes a direction with smallest-three compression.
    ///
    /// Layout: axis index (2 bits), sign of the dropped component (1 bit),
    /// then the two remaining components in axis order at
    /// `bits_normal_a` and `bits_normal_b`. 32 bits with the protocol
    /// profile.
    ///
    /// `value` need not be unit length. A zero or non-finite vector encodes
    /// as `+X`.
    pub fn put_normal(&mut self, value: Vec3) {
        let policy = self.policy;
        let components = value.try_normalize().unwrap_or(Vec3::X).to_array();
        let (index, largest) = largest_component(&components);

        self.put_uint(index as u32, 2);
        self.put_bool(largest < 0.0);

        let mut rest = remaining(&components, index);
        let widths = [policy.bits_normal_a, policy.bits_normal_b];
        for bits in widths {
            let component = rest.next().unwrap_or(0.0);
            self.put_ranged_float(component, policy.unit_min, policy.unit_max, bits);
        }
    }

    /// Writes a rotation with smallest-three compression.
    ///
    /// Layout: index of the largest-magnitude component (2 bits), then the
    /// other three in `x, y, z, w` order at `bits_component` each. They are
    /// multiplied by the sign of the dropped component first, so `q` and
    /// `-q` produce identical bytes.
    ///
    /// A degenerate quaternion encodes as identity.
    pub fn put_quaternion(&mut self, value: Quaternion) {
        let policy = self.policy;
        let components = value
            .try_normalize()
            .unwrap_or(Quaternion::IDENTITY)
            .to_array();
        let (index, largest) = largest_component(&components);
        let sign = if largest < 0.0 { -1.0 } else { 1.0 };

        self.put_uint(index as u32, 2);
        for component in remaining(&components, index) {
            self.put_ranged_float(
                component * sign,
                policy.unit_min,
                policy.unit_max,
                policy.bits_component,
            );
        }
    }

    fn reserve_bits(&mut self, bits: usize) {
        let needed = bytes_for_bits(self.bit_offset + bits);
        if self.buffer.len() < needed {
            let new_len = needed + GROWTH_BYTES;
            tracing::trace!(from = self.buffer.len(), to = new_len, "growing bit buffer");
            self.buffer.resize(new_len, 0);
        }
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_BITS)
    }
}

fn assert_width(bits: u32) {
    assert!(
        (1..=MAX_BITS).contains(&bits),
        "invalid bit width: {bits} (expected 1..=32)"
    );
}

/// Index and value of the largest-magnitude component. First wins ties.
fn largest_component(components: &[f32]) -> (usize, f32) {
    let mut index = 0;
    for (i, c) in components.iter().enumerate().skip(1) {
        if c.abs() > components[index].abs() {
            index = i;
        }
    }
    (index, components[index])
}

/// Components other than `skip`, in order.
fn remaining(components: &[f32], skip: usize) -> impl Iterator<Item = f32> + '_ {
    components
        .iter()
        .enumerate()
        .filter(move |&(i, _)| i != skip)
        .map(|(_, &c)| c)
}
