//! # Quantization Policy
//!
//! The numeric contract host and peer must share bit-for-bit. None of it is
//! transmitted: a peer decoding with a different policy reads garbage.
//!
//! ## Protocol Constants
//!
//! | Field | Value |
//! |---|---|
//! | Angle interval | `[-π, π)`, 16 bits |
//! | Unit interval | `[-1, 1]` |
//! | Normal components | 14 + 15 bits |
//! | Quaternion components | 15 bits each |
//!
//! The widths are wire constants, not derived values. Changing any of them
//! breaks every peer built against the defaults.

use serde::Deserialize;

use crate::error::PolicyError;
use crate::reader::BitReader;
use crate::writer::BitWriter;

/// Lower bound of the canonical angle interval (inclusive).
pub const ANGLE_MIN: f32 = -std::f32::consts::PI;

/// Upper bound of the canonical angle interval (exclusive).
pub const ANGLE_MAX: f32 = std::f32::consts::PI;

/// Lower bound for normal and quaternion components.
pub const UNIT_MIN: f32 = -1.0;

/// Upper bound for normal and quaternion components.
pub const UNIT_MAX: f32 = 1.0;

/// Width of a quantized angle.
pub const BITS_ANGLE: u32 = 16;

/// Width of the first remaining normal component.
pub const BITS_NORMAL_A: u32 = 14;

/// Width of the second remaining normal component.
pub const BITS_NORMAL_B: u32 = 15;

/// Width of each remaining quaternion component.
pub const BITS_COMPONENT: u32 = 15;

/// Widest value a single `put_uint` can carry.
pub const MAX_BITS: u32 = 32;

/// Shared quantization parameters.
///
/// `Default` is the protocol profile. A profile can also be loaded from TOML
/// at startup; every key is optional and falls back to the default.
///
/// ```toml
/// angle_min = -3.1415927
/// angle_max = 3.1415927
/// bits_component = 15
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuantizationPolicy {
    /// Lower bound of the angle interval (inclusive).
    pub angle_min: f32,
    /// Upper bound of the angle interval (exclusive).
    pub angle_max: f32,
    /// Lower bound for unit components.
    pub unit_min: f32,
    /// Upper bound for unit components.
    pub unit_max: f32,
    /// Angle width in bits.
    pub bits_angle: u32,
    /// First remaining normal component width.
    pub bits_normal_a: u32,
    /// Second remaining normal component width.
    pub bits_normal_b: u32,
    /// Quaternion component width.
    pub bits_component: u32,
}

impl QuantizationPolicy {
    /// The protocol profile.
    pub const PROTOCOL: Self = Self {
        angle_min: ANGLE_MIN,
        angle_max: ANGLE_MAX,
        unit_min: UNIT_MIN,
        unit_max: UNIT_MAX,
        bits_angle: BITS_ANGLE,
        bits_normal_a: BITS_NORMAL_A,
        bits_normal_b: BITS_NORMAL_B,
        bits_component: BITS_COMPONENT,
    };

    /// Parses and validates a TOML profile.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Parse`] for malformed TOML or unknown keys, and
    /// the [`validate`](Self::validate) errors for inconsistent values.
    pub fn from_toml_str(text: &str) -> Result<Self, PolicyError> {
        let policy: Self = toml::from_str(text).map_err(|e| PolicyError::Parse(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Checks that every range is finite and non-empty and every width fits
    /// a single `put_uint`.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), PolicyError> {
        check_range("angle", self.angle_min, self.angle_max)?;
        check_range("unit", self.unit_min, self.unit_max)?;
        check_width("bits_angle", self.bits_angle)?;
        check_width("bits_normal_a", self.bits_normal_a)?;
        check_width("bits_normal_b", self.bits_normal_b)?;
        check_width("bits_component", self.bits_component)?;
        Ok(())
    }

    /// Wraps `angle` into `[angle_min, angle_max)`.
    ///
    /// Modular, never clamped: `3π` lands on `-π`, not on the upper bound.
    #[must_use]
    pub fn wrap_angle(&self, angle: f32) -> f32 {
        wrap_min_max(angle, self.angle_min, self.angle_max)
    }

    /// Creates a writer that encodes with this policy.
    #[must_use]
    pub fn writer(&self, initial_capacity_bits: usize) -> BitWriter {
        BitWriter::with_policy(initial_capacity_bits, *self)
    }

    /// Creates a reader that decodes with this policy.
    #[must_use]
    pub fn reader<'a>(&self, bytes: &'a [u8]) -> BitReader<'a> {
        BitReader::with_policy(bytes, *self)
    }
}

impl Default for QuantizationPolicy {
    fn default() -> Self {
        Self::PROTOCOL
    }
}

fn check_range(name: &'static str, min: f32, max: f32) -> Result<(), PolicyError> {
    if min.is_finite() && max.is_finite() && min < max {
        Ok(())
    } else {
        Err(PolicyError::InvalidRange { name, min, max })
    }
}

fn check_width(name: &'static str, bits: u32) -> Result<(), PolicyError> {
    if (1..=MAX_BITS).contains(&bits) {
        Ok(())
    } else {
        Err(PolicyError::InvalidBitWidth { name, bits })
    }
}

/// `min + (x - min) mod (max - min)`, result in `[min, max)`.
///
/// In-range input is returned untouched, so wrapping is idempotent.
/// Non-finite input passes through and is left to the quantizer.
#[must_use]
pub fn wrap_min_max(x: f32, min: f32, max: f32) -> f32 {
    if (min..max).contains(&x) {
        return x;
    }
    let span = max - min;
    let wrapped = min + (x - min).rem_euclid(span);
    // Rounding in the final add can land exactly on `max`.
    if wrapped >= max {
        min
    } else {
        wrapped
    }
}

/// Largest code a `bits`-wide field can hold.
#[inline]
#[must_use]
pub fn max_code(bits: u32) -> u32 {
    u32::MAX >> (MAX_BITS - bits)
}

/// Maps `value` from `[min, max]` onto `0..=2^bits - 1`, rounding to nearest
/// and clamping out-of-range input. NaN maps to 0.
#[must_use]
pub fn quantize(value: f32, min: f32, max: f32, bits: u32) -> u32 {
    let top = f64::from(max_code(bits));
    let unit = (f64::from(value) - f64::from(min)) / (f64::from(max) - f64::from(min));
    let scaled = (unit * top).round();
    if scaled.is_nan() || scaled <= 0.0 {
        0
    } else if scaled >= top {
        max_code(bits)
    } else {
        scaled as u32
    }
}

/// Inverse of [`quantize`]: `min + q / (2^bits - 1) * (max - min)`.
#[must_use]
pub fn dequantize(code: u32, min: f32, max: f32, bits: u32) -> f32 {
    let unit = f64::from(code) / f64::from(max_code(bits));
    (f64::from(min) + unit * (f64::from(max) - f64::from(min))) as f32
}

/// Distance between adjacent codes of a `bits`-wide ranged float, an upper
/// bound on its reconstruction error.
///
/// Kept in `f64`: at 32 bits the step is far below an `f32` ulp of the range.
#[must_use]
pub fn quantization_step(min: f32, max: f32, bits: u32) -> f64 {
    (f64::from(max) - f64::from(min)) / f64::from(max_code(bits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_default_is_protocol() {
        let policy = QuantizationPolicy::default();
        assert_eq!(policy, QuantizationPolicy::PROTOCOL);
        assert_eq!(policy.bits_component, 15);
        assert_eq!((policy.bits_normal_a, policy.bits_normal_b), (14, 15));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_wrap_is_modular() {
        let policy = QuantizationPolicy::default();
        assert!((policy.wrap_angle(0.5) - 0.5).abs() < 1e-6);
        assert!((policy.wrap_angle(PI + 0.25) - (-PI + 0.25)).abs() < 1e-5);
        assert!((policy.wrap_angle(-PI - 0.25) - (PI - 0.25)).abs() < 1e-5);
        // Far outside the interval still lands inside it.
        let far = policy.wrap_angle(1000.0 * PI + 1.0);
        assert!((ANGLE_MIN..ANGLE_MAX).contains(&far));
        assert_eq!(policy.wrap_angle(ANGLE_MAX), ANGLE_MIN);
    }

    #[test]
    fn test_quantize_endpoints_and_clamp() {
        assert_eq!(quantize(-1.0, -1.0, 1.0, 8), 0);
        assert_eq!(quantize(1.0, -1.0, 1.0, 8), 255);
        assert_eq!(quantize(5.0, -1.0, 1.0, 8), 255);
        assert_eq!(quantize(-5.0, -1.0, 1.0, 8), 0);
        assert_eq!(quantize(f32::NAN, -1.0, 1.0, 8), 0);
        assert_eq!(quantize(1.0, 0.0, 1.0, 32), u32::MAX);
    }

    #[test]
    fn test_quantize_rounds_to_nearest() {
        // 3 bits over [0, 7]: one unit per code.
        assert_eq!(quantize(2.4, 0.0, 7.0, 3), 2);
        assert_eq!(quantize(2.6, 0.0, 7.0, 3), 3);
        assert_eq!(dequantize(3, 0.0, 7.0, 3), 3.0);
    }

    #[test]
    fn test_max_code() {
        assert_eq!(max_code(1), 1);
        assert_eq!(max_code(16), 0xFFFF);
        assert_eq!(max_code(32), u32::MAX);
    }

    #[test]
    fn test_validate_rejects_bad_profiles() {
        let mut policy = QuantizationPolicy::default();
        policy.unit_min = 1.0;
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::InvalidRange { name: "unit", .. })
        ));

        let mut policy = QuantizationPolicy::default();
        policy.bits_component = 0;
        assert_eq!(
            policy.validate(),
            Err(PolicyError::InvalidBitWidth { name: "bits_component", bits: 0 })
        );

        let mut policy = QuantizationPolicy::default();
        policy.angle_max = f32::INFINITY;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let policy =
            QuantizationPolicy::from_toml_str("bits_component = 12\nbits_angle = 10\n").unwrap();
        assert_eq!(policy.bits_component, 12);
        assert_eq!(policy.bits_angle, 10);
        assert_eq!(policy.unit_min, UNIT_MIN);

        assert_eq!(QuantizationPolicy::from_toml_str("").unwrap(), QuantizationPolicy::PROTOCOL);
        assert!(matches!(
            QuantizationPolicy::from_toml_str("bits_unknown = 3"),
            Err(PolicyError::Parse(_))
        ));
        assert!(matches!(
            QuantizationPolicy::from_toml_str("bits_angle = 40"),
            Err(PolicyError::InvalidBitWidth { name: "bits_angle", bits: 40 })
        ));
    }
}
