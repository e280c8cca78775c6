//! # DRIFTWIRE Codec
//!
//! Bit-packed encoding of replicated entity state.
//!
//! ## Architecture
//!
//! - **`BitWriter`**: packs values at bit granularity into a growable buffer
//! - **`BitReader`**: consumes the same fields, in the same order, from a
//!   received packet
//! - **`QuantizationPolicy`**: the bounds and widths both peers agree on
//!
//! ## Wire Format
//!
//! ```text
//! put_uint(0b101, 3); put_uint(0b11, 2);
//!
//! bit:   7 6 5 4 3 2 1 0
//! byte0: 0 0 0 1 1 1 0 1
//!              └─┴─┘└─┴─┴─ first field (LSB-first)
//!              second field
//! ```
//!
//! No length prefix, no type tags, no checksum. The ordered call sequence is
//! the schema, and versioning it is the caller's job.
//!
//! ## Costs
//!
//! | Call | Bits |
//! |---|---|
//! | `put_bool` | 1 |
//! | `put_float` | 32 |
//! | `put_vector3` | 96 |
//! | `put_radians_quantized` | 16 |
//! | `put_normal` | 32 |
//! | `put_quaternion` | 47 |
//!
//! ## Errors
//!
//! Writer misuse (bad width, empty range) panics: it is a bug in the message
//! definition. Reader failures come from untrusted input and are returned as
//! [`CodecError`]; drop the packet and carry on.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod packing;
pub mod policy;
pub mod reader;
pub mod writer;

// Re-exports for convenience
pub use driftwire_shared::{Quaternion, Vec3};
pub use error::{CodecError, CodecResult, PolicyError};
pub use policy::{
    QuantizationPolicy, ANGLE_MAX, ANGLE_MIN, BITS_ANGLE, BITS_COMPONENT, BITS_NORMAL_A,
    BITS_NORMAL_B, UNIT_MAX, UNIT_MIN,
};
pub use reader::BitReader;
pub use writer::BitWriter;
