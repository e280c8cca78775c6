//! # Bit Reader
//!
//! Mirror of [`BitWriter`](crate::BitWriter). Input comes from the network,
//! so every read is bounds-checked and a short packet is an error, never a
//! panic.
//!
//! A failed read leaves the cursor where it was, including composite reads
//! (vectors, normals, quaternions) that fail part-way through.

use driftwire_shared::{Quaternion, Vec3};

use crate::error::{CodecError, CodecResult};
use crate::packing::unpack_uint;
use crate::policy::{dequantize, max_code, QuantizationPolicy, MAX_BITS};

/// Bit-granular decoder over a borrowed packet.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    bit_offset: usize,
    policy: QuantizationPolicy,
}

impl<'a> BitReader<'a> {
    /// Creates a reader over `bytes` using the protocol quantization profile.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_policy(bytes, QuantizationPolicy::default())
    }

    /// Creates a reader that decodes with `policy`.
    ///
    /// # Panics
    ///
    /// `policy` must pass [`QuantizationPolicy::validate`]; an empty range
    /// would otherwise panic in the middle of decoding untrusted input. Debug
    /// builds check this here.
    #[must_use]
    pub fn with_policy(bytes: &'a [u8], policy: QuantizationPolicy) -> Self {
        debug_assert!(policy.validate().is_ok(), "invalid quantization policy: {policy:?}");
        Self {
            bytes,
            bit_offset: 0,
            policy,
        }
    }

    /// The policy this reader dequantizes with.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> &QuantizationPolicy {
        &self.policy
    }

    /// Bits consumed so far.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.bit_offset
    }

    /// Bits left before the end of the packet.
    #[inline]
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.bytes.len() * 8 - self.bit_offset
    }

    /// Reads one bit.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnexpectedEndOfStream`] if the packet is exhausted.
    #[inline]
    pub fn get_bool(&mut self) -> CodecResult<bool> {
        Ok(self.get_uint(1)? != 0)
    }

    /// Reads a `bits`-wide unsigned value.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidBitWidth`] if `bits` is outside `1..=32`,
    /// [`CodecError::UnexpectedEndOfStream`] if fewer than `bits` remain.
    pub fn get_uint(&mut self, bits: u32) -> CodecResult<u32> {
        if !(1..=MAX_BITS).contains(&bits) {
            return Err(CodecError::InvalidBitWidth(bits));
        }
        let bits = bits as usize;
        let start = self.take(bits)?;
        Ok(unpack_uint(self.bytes, bits, start))
    }

    /// Reads 32 bits as a two's complement integer.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnexpectedEndOfStream`] if fewer than 32 bits remain.
    #[inline]
    pub fn get_int32(&mut self) -> CodecResult<i32> {
        Ok(self.get_uint(32)? as i32)
    }

    /// Reads 8 bits.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnexpectedEndOfStream`] if fewer than 8 bits remain.
    #[inline]
    pub fn get_byte(&mut self) -> CodecResult<u8> {
        Ok(self.get_uint(8)? as u8)
    }

    /// Reads a raw IEEE-754 float. NaN payloads survive.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnexpectedEndOfStream`] if fewer than 32 bits remain.
    #[inline]
    pub fn get_float(&mut self) -> CodecResult<f32> {
        Ok(f32::from_bits(self.get_uint(32)?))
    }

    /// Reads three raw floats.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnexpectedEndOfStream`] if fewer than 96 bits remain.
    pub fn get_vector3(&mut self) -> CodecResult<Vec3> {
        self.atomically(|r| Ok(Vec3::new(r.get_float()?, r.get_float()?, r.get_float()?)))
    }

    /// Reads a ranged float written with the same `min`, `max` and `bits`.
    ///
    /// Accurate to the quantization step, not bit-exact.
    ///
    /// # Errors
    ///
    /// As [`get_uint`](Self::get_uint).
    ///
    /// # Panics
    ///
    /// Panics if `min >= max`.
    pub fn get_ranged_float(&mut self, min: f32, max: f32, bits: u32) -> CodecResult<f32> {
        assert!(min < max, "invalid ranged float bounds: [{min}, {max}]");
        let code = self.get_uint(bits)?;
        Ok(dequantize(code, min, max, bits))
    }

    /// Reads an angle written by `put_radians_quantized`.
    ///
    /// The result lies in the policy's half-open angle interval. The top
    /// code never comes from a conforming writer; it names the upper bound
    /// and is read as the lower bound.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnexpectedEndOfStream`] if the packet is exhausted.
    pub fn get_radians_quantized(&mut self) -> CodecResult<f32> {
        let policy = self.policy;
        let code = self.get_uint(policy.bits_angle)?;
        if code == max_code(policy.bits_angle) {
            return Ok(policy.angle_min);
        }
        Ok(dequantize(code, policy.angle_min, policy.angle_max, policy.bits_angle))
    }

    /// Reads a smallest-three normal and returns it at unit length.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnexpectedEndOfStream`] on a short packet,
    /// [`CodecError::InvalidSelector`] if the axis index is 3.
    pub fn get_normal(&mut self) -> CodecResult<Vec3> {
        let policy = self.policy;
        self.atomically(|r| {
            let index = r.get_uint(2)?;
            if index > 2 {
                return Err(CodecError::InvalidSelector { index });
            }
            let negative = r.get_bool()?;
            let a = r.get_ranged_float(policy.unit_min, policy.unit_max, policy.bits_normal_a)?;
            let b = r.get_ranged_float(policy.unit_min, policy.unit_max, policy.bits_normal_b)?;

            let mut largest = reconstruct(&[a, b]);
            if negative {
                largest = -largest;
            }
            let components = insert_at([a, b], index as usize, largest);
            let v = Vec3::from_array(components);
            Ok(v.try_normalize().unwrap_or(v))
        })
    }

    /// Reads a smallest-three quaternion and returns it at unit length.
    ///
    /// The dropped component comes back non-negative, so the result may be
    /// the negation of what was written. Both are the same rotation.
    ///
    /// # Errors
    ///
    /// [`CodecError::UnexpectedEndOfStream`] on a short packet.
    pub fn get_quaternion(&mut self) -> CodecResult<Quaternion> {
        let policy = self.policy;
        self.atomically(|r| {
            let index = r.get_uint(2)? as usize;
            let mut rest = [0.0f32; 3];
            for slot in &mut rest {
                *slot =
                    r.get_ranged_float(policy.unit_min, policy.unit_max, policy.bits_component)?;
            }

            let largest = reconstruct(&rest);
            let q = Quaternion::from_array(insert_at(rest, index, largest));
            Ok(q.try_normalize().unwrap_or(q))
        })
    }

    /// Claims `bits` bits and returns the offset they start at.
    fn take(&mut self, bits: usize) -> CodecResult<usize> {
        let available = self.bits_remaining();
        if bits > available {
            tracing::debug!(requested = bits, available, "truncated bit stream");
            return Err(CodecError::UnexpectedEndOfStream {
                requested: bits,
                available,
            });
        }
        let start = self.bit_offset;
        self.bit_offset += bits;
        Ok(start)
    }

    /// Runs a multi-field read, rewinding the cursor if any part fails.
    fn atomically<T>(&mut self, read: impl FnOnce(&mut Self) -> CodecResult<T>) -> CodecResult<T> {
        let start = self.bit_offset;
        let result = read(self);
        if result.is_err() {
            self.bit_offset = start;
        }
        result
    }
}

/// The dropped component of a unit vector: `sqrt(max(0, 1 - Σ rest²))`.
fn reconstruct(rest: &[f32]) -> f32 {
    let sum: f32 = rest.iter().map(|c| c * c).sum();
    (1.0 - sum).max(0.0).sqrt()
}

/// Puts `value` back at `index`, shifting later components up.
fn insert_at<const N: usize, const M: usize>(rest: [f32; N], index: usize, value: f32) -> [f32; M] {
    debug_assert_eq!(N + 1, M);
    let mut out = [0.0f32; M];
    let mut src = rest.iter();
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = if i == index {
            value
        } else {
            src.next().copied().unwrap_or(0.0)
        };
    }
    out
}
