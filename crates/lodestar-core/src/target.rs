//! Dial-target parsing
//!
//! A dial URI of the form `consul://<registry-address>/<service>?<query>`
//! is parsed once into an immutable [`Target`] that the resolver owns for
//! its whole lifetime.

use crate::{LodestarError, LodestarResult};
use std::time::Duration;
use url::Url;

/// Default server-side long-poll bound for a single blocking query
pub const DEFAULT_WAIT: Duration = Duration::from_secs(10);

/// Default ceiling for the retry backoff schedule
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(1);

/// Parsed, immutable resolve request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Registry address from the URI authority (`host` or `host:port`)
    pub registry: String,
    /// Logical service name to query
    pub service: String,
    /// Tag filter; an instance must carry all of them (AND semantics)
    pub tags: Vec<String>,
    /// Only return instances passing their health checks
    pub healthy: bool,
    /// Node name used for proximity-biased ordering by the registry
    pub near: Option<String>,
    /// Target datacenter
    pub dc: Option<String>,
    /// Allow stale reads from non-leader registry servers
    pub allow_stale: bool,
    /// Require fully consistent reads
    pub require_consistent: bool,
    /// Upper bound on how long a single blocking query may wait server-side
    pub wait: Duration,
    /// Cap on the number of resolved addresses; 0 means unbounded
    pub limit: usize,
    /// Ceiling for the retry backoff schedule
    pub max_backoff: Duration,
}

impl Target {
    /// Parse a dial URI into a `Target`.
    ///
    /// Recognized query keys: `tag` (repeatable), `healthy`, `near`, `dc`,
    /// `allow-stale`, `require-consistent`, `wait`, `limit`, `max-backoff`.
    /// Unknown keys are rejected. Omitted keys take the documented
    /// defaults (`healthy=true`, `wait=10s`, `max-backoff=1s`, `limit=0`).
    pub fn parse(uri: &str) -> LodestarResult<Target> {
        let url = Url::parse(uri)
            .map_err(|e| LodestarError::Target(format!("Failed to parse dial URI: {}", e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| LodestarError::Target("Missing registry address".to_string()))?;
        let registry = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let service = url.path().trim_matches('/').to_string();
        if service.is_empty() || service.contains('/') {
            return Err(LodestarError::Target(format!(
                "Expected a single service name in the URI path, got {:?}",
                url.path()
            )));
        }

        let mut target = Target {
            registry,
            service,
            tags: Vec::new(),
            healthy: true,
            near: None,
            dc: None,
            allow_stale: false,
            require_consistent: false,
            wait: DEFAULT_WAIT,
            limit: 0,
            max_backoff: DEFAULT_MAX_BACKOFF,
        };

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "tag" => target.tags.push(value.into_owned()),
                "healthy" => target.healthy = parse_bool(&key, &value)?,
                "near" => target.near = Some(value.into_owned()),
                "dc" => target.dc = Some(value.into_owned()),
                "allow-stale" => target.allow_stale = parse_bool(&key, &value)?,
                "require-consistent" => target.require_consistent = parse_bool(&key, &value)?,
                "wait" => target.wait = parse_duration(&key, &value)?,
                "limit" => {
                    target.limit = value.parse().map_err(|_| {
                        LodestarError::Target(format!("Invalid limit: {:?}", value))
                    })?;
                }
                "max-backoff" => target.max_backoff = parse_duration(&key, &value)?,
                _ => {
                    return Err(LodestarError::Target(format!(
                        "Unknown query parameter: {:?}",
                        key
                    )));
                }
            }
        }

        Ok(target)
    }
}

/// Parse a boolean query value; a bare key with no value counts as true.
fn parse_bool(key: &str, value: &str) -> LodestarResult<bool> {
    match value {
        "" | "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(LodestarError::Target(format!(
            "Invalid boolean for {:?}: {:?}",
            key, value
        ))),
    }
}

/// Parse a single-unit duration value (`150ms`, `10s`, `3m`, `1h`).
/// A bare integer means seconds.
fn parse_duration(key: &str, value: &str) -> LodestarResult<Duration> {
    let (digits, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(pos) => value.split_at(pos),
        None => (value, "s"),
    };
    let n: u64 = digits.parse().map_err(|_| {
        LodestarError::Target(format!("Invalid duration for {:?}: {:?}", key, value))
    })?;
    match unit {
        "ms" => Ok(Duration::from_millis(n)),
        "s" => Ok(Duration::from_secs(n)),
        "m" => Ok(Duration::from_secs(n * 60)),
        "h" => Ok(Duration::from_secs(n * 3600)),
        _ => Err(LodestarError::Target(format!(
            "Invalid duration for {:?}: {:?}",
            key, value
        ))),
    }
}
