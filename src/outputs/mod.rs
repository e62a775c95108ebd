//! Serialization of results for callers.
//!
//! - [`json`]: Wraps results in the response envelope and writes them to
//!   stdout or a date-based directory.

pub mod json;
