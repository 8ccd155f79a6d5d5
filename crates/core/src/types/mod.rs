//! Core types for the inflyshop bridge.
//!
//! This module provides type-safe wrappers for the identifiers and payloads
//! that cross the bridge.

pub mod id;
pub mod lenient;
pub mod payload;

pub use id::*;
pub use lenient::parse_int_prefix;
pub use payload::*;
