//! Utilities
//!
//! Common utilities used throughout the governor.

pub mod error;

pub use error::*;
