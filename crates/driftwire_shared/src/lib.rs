//! # DRIFTWIRE Shared
//!
//! Value types used by both the simulation host and remote peers.
//!
//! ## RULE
//!
//! This crate holds data, not wire logic. Anything that decides how many
//! bits a value costs belongs in `driftwire_codec`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod math;

pub use math::{Quaternion, Vec3};
