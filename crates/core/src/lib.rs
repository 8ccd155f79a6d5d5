//! Inflyshop Bridge Core - Shared types library.
//!
//! This crate provides the types exchanged between the bridge and its two
//! peers:
//! - the order-management system that calls the bridge's webhooks
//! - the Shopify Admin API the bridge calls on its behalf
//!
//! # Architecture
//!
//! The core crate contains only types and parsing helpers - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, lenient number parsing and inbound payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
