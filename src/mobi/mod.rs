//! Core Mobipocket reader module

pub mod codec;
pub mod cursor;
pub mod format;
pub mod reader;
pub mod types;

pub use reader::{MobiReader, ReaderOptions};
pub use types::error::{MobiError, Result};
pub use types::models;
