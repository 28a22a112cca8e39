//! Shared utility helpers.

pub mod error;

pub use error::{AdSkipError, AdSkipResult, ErrorKind};
