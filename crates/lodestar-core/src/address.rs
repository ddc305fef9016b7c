//! Address-set derivation from registry responses

use crate::ServiceEntry;

/// Turn raw registry entries into the deduplicated address set pushed to
/// the RPC framework.
///
/// When `limit > 0` the candidates are truncated to the first `limit`
/// entries *before* deduplication. The registry gives no stable ordering
/// guarantee, so this can yield fewer than `limit` distinct addresses even
/// when more exist; that matches the registry query's documented `limit`
/// semantics and is kept as-is.
pub fn resolve_addresses(entries: &[ServiceEntry], limit: usize) -> Vec<String> {
    let candidates = if limit > 0 && entries.len() > limit {
        &entries[..limit]
    } else {
        entries
    };

    let mut addresses: Vec<String> = Vec::with_capacity(candidates.len());
    for entry in candidates {
        let address = entry.endpoint();
        if !addresses.contains(&address) {
            addresses.push(address);
        }
    }
    addresses
}
