//! Registry watch loop
//!
//! One background task per resolver instance: issue a blocking health
//! query at the current consistency index, turn the response into a
//! deduplicated address set, push it to the sink, repeat. Query errors are
//! never fatal; the loop retries with jittered exponential backoff until
//! it is cancelled.

use crate::plugin::{AddressSink, Resolver};
use lodestar_core::{resolve_addresses, Backoff, Target};
use lodestar_registry::{HealthQuery, Registry};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Registry-backed resolver for one dialed channel.
///
/// Owns its watch task exclusively; distinct resolvers never share the
/// long-poll cursor or backoff state, even when they target the same
/// service.
pub struct ConsulResolver {
    cancel: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl ConsulResolver {
    /// Start the watch task. Must be called within a tokio runtime.
    pub fn spawn(
        target: Target,
        registry: Arc<dyn Registry>,
        sink: Arc<dyn AddressSink>,
    ) -> Self {
        let (cancel, cancelled) = watch::channel(false);
        let handle = tokio::spawn(watch_loop(target, registry, sink, cancelled));
        Self {
            cancel,
            handle: Some(handle),
        }
    }
}

impl Resolver for ConsulResolver {
    // The watch loop re-resolves continuously; an explicit request adds
    // nothing, so this stays the trait's no-op.

    fn close(&mut self) {
        let _ = self.cancel.send(true);
    }
}

impl Drop for ConsulResolver {
    fn drop(&mut self) {
        let _ = self.cancel.send(true);
    }
}

/// The watch loop body.
///
/// `last_index` starts at 0, only ever advances on a successful query, and
/// is never reset for the life of the task. Cancellation is observed at
/// every suspension point: the blocking query and the backoff sleep both
/// race the cancellation channel.
async fn watch_loop(
    target: Target,
    registry: Arc<dyn Registry>,
    sink: Arc<dyn AddressSink>,
    mut cancelled: watch::Receiver<bool>,
) {
    let mut backoff = Backoff::new(target.max_backoff);
    let mut last_index: u64 = 0;

    loop {
        if *cancelled.borrow() {
            return;
        }

        let query = HealthQuery::for_target(&target, last_index);
        let result = tokio::select! {
            _ = cancelled.changed() => return,
            result = registry.health_service(&query) => result,
        };

        match result {
            Err(e) => {
                let delay = backoff.next_delay();
                warn!(
                    service = %target.service,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Health query failed, backing off"
                );
                tokio::select! {
                    _ = cancelled.changed() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Ok(response) => {
                backoff.reset();
                // The cursor never moves backwards: a degraded response
                // reporting a lower index (or none at all, mapped to 0 by
                // the client) must not make later queries re-observe
                // state already seen.
                last_index = last_index.max(response.index);

                let addresses = resolve_addresses(&response.entries, target.limit);
                debug!(
                    service = %target.service,
                    addresses = addresses.len(),
                    index = last_index,
                    "Pushing resolved address set"
                );
                if let Err(e) = sink.update(addresses) {
                    warn!(
                        service = %target.service,
                        error = %e,
                        "Sink rejected address update"
                    );
                }
            }
        }
    }
}
