//! lodestar-resolver: Pluggable client-side name resolver
//!
//! This crate provides the resolver plugin surface consumed by an RPC
//! framework and its Consul-backed implementation:
//! - The [`ResolverBuilder`]/[`Resolver`]/[`AddressSink`] plugin contract
//! - A scheme-keyed [`SchemeRegistry`] populated once at startup
//! - The [`ConsulResolver`] watch loop tracking live service addresses
//!
//! ```no_run
//! use lodestar_resolver::{ConsulBuilder, SchemeRegistry};
//! use std::sync::Arc;
//!
//! let mut schemes = SchemeRegistry::new();
//! schemes.register(Arc::new(ConsulBuilder::new()));
//! // hand `schemes` to the RPC framework; dialing
//! // consul://10.0.0.5:8500/inventory?tag=grpc now resolves through it
//! ```

pub mod builder;
pub mod plugin;
pub mod watcher;

pub use builder::{ConsulBuilder, CONSUL_SCHEME};
pub use plugin::{AddressSink, Resolver, ResolverBuilder, SchemeRegistry};
pub use watcher::ConsulResolver;
