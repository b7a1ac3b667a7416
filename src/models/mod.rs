//! Data Models
//!
//! Serializable records shared by the governor services and their consumers.

pub mod metrics;
pub mod outcome;
pub mod report;

pub use metrics::*;
pub use outcome::*;
pub use report::*;
