//! Resolver plugin contract
//!
//! The surface the RPC framework consumes: builders keyed by URI scheme,
//! running resolvers, and the sink resolvers push address sets into. The
//! scheme registry is an explicit object populated once at startup and
//! read-only afterwards; nothing here registers itself via import-time
//! side effects.

use lodestar_core::LodestarResult;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Callback surface accepting an updated address set for load balancing.
///
/// Supplied by the RPC framework; each resolver pushes to it from a single
/// task, so updates from one resolver are strictly ordered.
pub trait AddressSink: Send + Sync {
    /// Replace the current address set in one atomic call
    fn update(&self, addresses: Vec<String>) -> LodestarResult<()>;
}

/// A running resolver bound to one dialed channel
pub trait Resolver: Send {
    /// Hint that a re-resolve would be welcome. Resolvers that already
    /// watch for changes continuously may ignore it.
    fn resolve_now(&mut self) {}

    /// Terminate the watch task. Terminal; calling it again is a no-op.
    fn close(&mut self);
}

/// Factory turning a dial URI into a running [`Resolver`]
pub trait ResolverBuilder: Send + Sync {
    /// Parse and validate `uri`, then start a resolver pushing into `sink`.
    ///
    /// Returns as soon as the watch task is started; the first address set
    /// may arrive after the call returns, so callers must tolerate an
    /// initially empty set.
    fn build(
        &self,
        uri: &str,
        sink: Arc<dyn AddressSink>,
    ) -> LodestarResult<Box<dyn Resolver>>;

    /// The fixed URI scheme this builder handles
    fn scheme(&self) -> &'static str;
}

/// Scheme-keyed builder registry
///
/// Populated during process startup via [`register`](Self::register) and
/// treated as read-only for the rest of the process lifetime.
pub struct SchemeRegistry {
    builders: HashMap<&'static str, Arc<dyn ResolverBuilder>>,
}

impl SchemeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Associate a builder with its scheme; a later registration for the
    /// same scheme replaces the earlier one
    pub fn register(&mut self, builder: Arc<dyn ResolverBuilder>) {
        let scheme = builder.scheme();
        if self.builders.insert(scheme, builder).is_some() {
            warn!(scheme = scheme, "Replaced previously registered resolver builder");
        }
    }

    /// Look up the builder for a URI scheme
    pub fn lookup(&self, scheme: &str) -> Option<Arc<dyn ResolverBuilder>> {
        self.builders.get(scheme).cloned()
    }
}

impl Default for SchemeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
