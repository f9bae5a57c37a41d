//! Foundational data structures, error types, and tag vocabularies.

pub mod error;
pub mod models;
pub mod tags;
