//! # Codec Error Types
//!
//! Errors surfaced to the packet assembler. Decode errors come from
//! untrusted input and are always recoverable; the caller drops the packet.

use thiserror::Error;

/// Errors that can occur while decoding a bit stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A read asked for more bits than the stream has left.
    #[error("unexpected end of stream: requested {requested} bits, {available} available")]
    UnexpectedEndOfStream {
        /// Bits the read needed.
        requested: usize,
        /// Bits left in the stream.
        available: usize,
    },

    /// Bit width outside `1..=32`.
    #[error("invalid bit width: {0} (expected 1..=32)")]
    InvalidBitWidth(u32),

    /// A smallest-three selector named a component that does not exist.
    #[error("invalid smallest-three selector: {index}")]
    InvalidSelector {
        /// The decoded selector.
        index: u32,
    },
}

/// Errors raised when a quantization profile is inconsistent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    /// Lower bound is not strictly below the upper bound, or either is not finite.
    #[error("invalid {name} range: [{min}, {max})")]
    InvalidRange {
        /// Which range.
        name: &'static str,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },

    /// A configured width is outside `1..=32`.
    #[error("invalid {name} width: {bits} bits")]
    InvalidBitWidth {
        /// Which width.
        name: &'static str,
        /// Configured value.
        bits: u32,
    },

    /// The profile text could not be parsed.
    #[error("invalid policy profile: {0}")]
    Parse(String),
}

/// Result type for decode operations.
pub type CodecResult<T> = Result<T, CodecError>;
