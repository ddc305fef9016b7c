//! Consul resolver builder

use crate::plugin::{AddressSink, Resolver, ResolverBuilder};
use crate::watcher::ConsulResolver;
use lodestar_core::{LodestarResult, Target};
use lodestar_registry::RegistryClient;
use std::sync::Arc;
use tracing::debug;

/// URI scheme routed to the Consul builder
pub const CONSUL_SCHEME: &str = "consul";

/// Builder for registry-backed resolvers.
///
/// Register one instance in the [`SchemeRegistry`](crate::SchemeRegistry)
/// during startup; the RPC framework then routes every
/// `consul://...` dial URI through it.
#[derive(Debug, Default)]
pub struct ConsulBuilder;

impl ConsulBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self
    }
}

impl ResolverBuilder for ConsulBuilder {
    fn build(
        &self,
        uri: &str,
        sink: Arc<dyn AddressSink>,
    ) -> LodestarResult<Box<dyn Resolver>> {
        let target = Target::parse(uri)?;
        let client = RegistryClient::new(&target.registry)?;

        debug!(
            service = %target.service,
            registry = %target.registry,
            "Starting resolver watch task"
        );
        Ok(Box::new(ConsulResolver::spawn(
            target,
            Arc::new(client),
            sink,
        )))
    }

    fn scheme(&self) -> &'static str {
        CONSUL_SCHEME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestar_core::LodestarError;

    struct NullSink;

    impl AddressSink for NullSink {
        fn update(&self, _addresses: Vec<String>) -> LodestarResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_scheme() {
        assert_eq!(ConsulBuilder::new().scheme(), "consul");
    }

    #[tokio::test]
    async fn test_build_rejects_bad_uri() {
        let builder = ConsulBuilder::new();
        // Box<dyn Resolver> has no Debug, so drop the Ok value before
        // unwrapping the error
        let err = builder
            .build("consul://127.0.0.1:8500/", Arc::new(NullSink))
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, LodestarError::Target(_)));

        let err = builder
            .build("consul://127.0.0.1:8500/api?wait=soon", Arc::new(NullSink))
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, LodestarError::Target(_)));
    }

    #[tokio::test]
    async fn test_build_returns_running_resolver() {
        let builder = ConsulBuilder::new();
        let mut resolver = builder
            .build("consul://127.0.0.1:8500/inventory?wait=1s", Arc::new(NullSink))
            .unwrap();
        // Build returns before any query completes; closing immediately
        // must be clean
        resolver.close();
        resolver.close();
    }
}
