//! Codec layer for the compact integer encodings of the format.
//!
//! # Submodules
//!
//! - [`varint`][]: base-128 variable-width integers (forward and backward)

pub mod varint;
