//! lodestar-registry: Registry client for the lodestar resolver
//!
//! This crate provides the HTTP client for the distributed service
//! registry's health-by-service endpoint, including blocking (long-poll)
//! queries and consistency-index bookkeeping.

pub mod client;

pub use client::{HealthQuery, HealthResponse, Registry, RegistryClient};
