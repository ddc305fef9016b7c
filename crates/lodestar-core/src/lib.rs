//! lodestar-core: Core types for the lodestar resolver
//!
//! This crate provides the fundamental types used throughout lodestar:
//! - Dial-target parsing
//! - Registry wire types and address derivation
//! - Retry backoff schedule
//! - Error handling

pub mod address;
pub mod backoff;
pub mod entry;
pub mod error;
pub mod target;

pub use address::*;
pub use backoff::*;
pub use entry::*;
pub use error::*;
pub use target::*;
