//! Registry client
//!
//! HTTP client for the registry's health-by-service endpoint. A single
//! blocking (long-poll) query is the only operation the resolver needs:
//! the registry holds the request open until its state advances past the
//! supplied index or the wait bound elapses.

use async_trait::async_trait;
use lodestar_core::{LodestarError, LodestarResult, ServiceEntry, Target};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Registry port assumed when the address does not name one
const DEFAULT_REGISTRY_PORT: u16 = 8500;

/// Header carrying the consistency index of a health response
const INDEX_HEADER: &str = "X-Consul-Index";

/// Slack added on top of the server-side wait so the long poll always
/// finishes before the client-side request timeout
const REQUEST_TIMEOUT_GRACE: Duration = Duration::from_secs(2);

/// One health-by-service query
#[derive(Debug, Clone)]
pub struct HealthQuery {
    /// Logical service name
    pub service: String,
    /// Tags an instance must all carry
    pub tags: Vec<String>,
    /// Only return instances passing their health checks
    pub passing: bool,
    /// Target datacenter
    pub dc: Option<String>,
    /// Node name for proximity-biased ordering
    pub near: Option<String>,
    /// Allow stale reads
    pub allow_stale: bool,
    /// Require fully consistent reads
    pub require_consistent: bool,
    /// Block until the registry state advances past this index
    pub wait_index: u64,
    /// Server-side bound on how long the query may block
    pub wait: Duration,
}

impl HealthQuery {
    /// Build the query for `target` at the given long-poll cursor
    pub fn for_target(target: &Target, wait_index: u64) -> Self {
        Self {
            service: target.service.clone(),
            tags: target.tags.clone(),
            passing: target.healthy,
            dc: target.dc.clone(),
            near: target.near.clone(),
            allow_stale: target.allow_stale,
            require_consistent: target.require_consistent,
            wait_index,
            wait: target.wait,
        }
    }
}

/// Response to a health-by-service query
#[derive(Debug, Clone)]
pub struct HealthResponse {
    /// Instances currently matching the query
    pub entries: Vec<ServiceEntry>,
    /// Consistency index to use as the next `wait_index`
    pub index: u64,
}

/// Seam over the registry so the watch loop can be driven by a fake
/// in tests
#[async_trait]
pub trait Registry: Send + Sync {
    /// Issue one blocking health-by-service query
    async fn health_service(&self, query: &HealthQuery) -> LodestarResult<HealthResponse>;
}

/// HTTP registry client
pub struct RegistryClient {
    /// Underlying HTTP client
    http: reqwest::Client,
    /// Registry base URL
    base: Url,
}

impl RegistryClient {
    /// Create a client for the registry at `address`.
    ///
    /// `address` is `host`, `host:port`, or a full `http(s)://` base URL.
    /// A bare host gets `http` and port 8500; a full URL is taken as-is.
    pub fn new(address: &str) -> LodestarResult<Self> {
        let bare_authority = !address.contains("://");
        let raw = if bare_authority {
            format!("http://{}", address)
        } else {
            address.to_string()
        };
        let mut base = Url::parse(&raw)
            .map_err(|e| LodestarError::Registry(format!("Invalid registry address: {}", e)))?;
        if base.host_str().is_none() {
            return Err(LodestarError::Registry(format!(
                "Registry address has no host: {:?}",
                address
            )));
        }
        if bare_authority && base.port().is_none() {
            // set_port only fails for schemes without a known default;
            // http always accepts it
            let _ = base.set_port(Some(DEFAULT_REGISTRY_PORT));
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LodestarError::Registry(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, base })
    }

    /// The URL a given query is issued against
    fn query_url(&self, query: &HealthQuery) -> LodestarResult<Url> {
        let mut url = self
            .base
            .join(&format!("v1/health/service/{}", query.service))
            .map_err(|e| LodestarError::Registry(format!("Invalid service name: {}", e)))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(dc) = &query.dc {
                pairs.append_pair("dc", dc);
            }
            if let Some(near) = &query.near {
                pairs.append_pair("near", near);
            }
            for tag in &query.tags {
                pairs.append_pair("tag", tag);
            }
            if query.passing {
                pairs.append_key_only("passing");
            }
            if query.allow_stale {
                pairs.append_key_only("stale");
            }
            if query.require_consistent {
                pairs.append_key_only("consistent");
            }
            pairs.append_pair("index", &query.wait_index.to_string());
            pairs.append_pair("wait", &format!("{}ms", query.wait.as_millis()));
        }
        Ok(url)
    }

    /// Client-side timeout for one long-poll round trip. The registry may
    /// hold the request slightly past the wait bound, so the timeout adds
    /// wait/16 plus a fixed grace period.
    fn request_timeout(wait: Duration) -> Duration {
        wait + wait / 16 + REQUEST_TIMEOUT_GRACE
    }
}

#[async_trait]
impl Registry for RegistryClient {
    async fn health_service(&self, query: &HealthQuery) -> LodestarResult<HealthResponse> {
        let url = self.query_url(query)?;

        let response = self
            .http
            .get(url.clone())
            .timeout(Self::request_timeout(query.wait))
            .send()
            .await
            .map_err(|e| LodestarError::Registry(format!("Health query failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LodestarError::Registry(format!(
                "Health query returned {}",
                status
            )));
        }

        let index = match response
            .headers()
            .get(INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::parse::<u64>)
        {
            Some(Ok(index)) => index,
            _ => {
                warn!(url = %url, "Missing or malformed {} header", INDEX_HEADER);
                0
            }
        };

        let entries: Vec<ServiceEntry> = response
            .json()
            .await
            .map_err(|e| LodestarError::Registry(format!("Invalid health response: {}", e)))?;

        debug!(
            service = %query.service,
            instances = entries.len(),
            index = index,
            "Health query completed"
        );

        Ok(HealthResponse { entries, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Json};
    use axum::routing::get;
    use axum::Router;
    use std::sync::{Arc, Mutex};

    fn query(service: &str) -> HealthQuery {
        HealthQuery {
            service: service.to_string(),
            tags: Vec::new(),
            passing: true,
            dc: None,
            near: None,
            allow_stale: false,
            require_consistent: false,
            wait_index: 0,
            wait: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_address_normalization() {
        let client = RegistryClient::new("127.0.0.1").unwrap();
        assert_eq!(client.base.as_str(), "http://127.0.0.1:8500/");

        let client = RegistryClient::new("consul.internal:8501").unwrap();
        assert_eq!(client.base.as_str(), "http://consul.internal:8501/");

        // Full URLs are taken as-is
        let client = RegistryClient::new("https://consul.internal").unwrap();
        assert_eq!(client.base.as_str(), "https://consul.internal/");
        let client = RegistryClient::new("http://127.0.0.1:80").unwrap();
        assert_eq!(client.base.as_str(), "http://127.0.0.1/");

        assert!(RegistryClient::new("http://").is_err());
    }

    #[test]
    fn test_query_url_contract() {
        let client = RegistryClient::new("127.0.0.1:8500").unwrap();
        let mut q = query("inventory");
        q.tags = vec!["grpc".to_string(), "v2".to_string()];
        q.dc = Some("dc1".to_string());
        q.near = Some("node-7".to_string());
        q.allow_stale = true;
        q.wait_index = 42;
        q.wait = Duration::from_secs(30);

        let url = client.query_url(&q).unwrap();
        assert_eq!(url.path(), "/v1/health/service/inventory");
        let qs = url.query().unwrap();
        assert!(qs.contains("dc=dc1"));
        assert!(qs.contains("near=node-7"));
        assert!(qs.contains("tag=grpc"));
        assert!(qs.contains("tag=v2"));
        assert!(qs.contains("passing"));
        assert!(qs.contains("stale"));
        assert!(!qs.contains("consistent"));
        assert!(qs.contains("index=42"));
        assert!(qs.contains("wait=30000ms"));
    }

    #[test]
    fn test_request_timeout_exceeds_wait() {
        let wait = Duration::from_secs(10);
        assert!(RegistryClient::request_timeout(wait) > wait);
    }

    /// Queries captured by the fake registry
    type SeenQueries = Arc<Mutex<Vec<String>>>;

    async fn fake_health(
        State(seen): State<SeenQueries>,
        Path(service): Path<String>,
        request: axum::extract::RawQuery,
    ) -> impl IntoResponse {
        seen.lock().unwrap().push(request.0.unwrap_or_default());
        if service == "broken" {
            return (StatusCode::INTERNAL_SERVER_ERROR, "registry down").into_response();
        }
        let body = serde_json::json!([
            {"Node": {"Address": "10.0.0.2"},
             "Service": {"Address": "10.0.0.1", "Port": 9003}},
            {"Node": {"Address": "10.0.0.3"},
             "Service": {"Address": "", "Port": 9003}}
        ]);
        ([("x-consul-index", "7")], Json(body)).into_response()
    }

    async fn spawn_fake_registry() -> (String, SeenQueries) {
        let seen: SeenQueries = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/v1/health/service/:service", get(fake_health))
            .with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (addr.to_string(), seen)
    }

    #[tokio::test]
    async fn test_health_service_round_trip() {
        let (addr, seen) = spawn_fake_registry().await;
        let client = RegistryClient::new(&addr).unwrap();

        let mut q = query("inventory");
        q.wait_index = 5;
        let response = client.health_service(&q).await.unwrap();

        assert_eq!(response.index, 7);
        assert_eq!(response.entries.len(), 2);
        assert_eq!(response.entries[0].endpoint(), "10.0.0.1:9003");
        assert_eq!(response.entries[1].endpoint(), "10.0.0.3:9003");

        let captured = seen.lock().unwrap();
        assert!(captured[0].contains("index=5"));
        assert!(captured[0].contains("passing"));
    }

    #[tokio::test]
    async fn test_health_service_error_status() {
        let (addr, _seen) = spawn_fake_registry().await;
        let client = RegistryClient::new(&addr).unwrap();

        let err = client.health_service(&query("broken")).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
