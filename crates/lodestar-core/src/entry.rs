//! Registry wire types
//!
//! Serde mappings for the Consul health API response. Field names follow
//! the registry's PascalCase JSON exactly; this contract must be preserved
//! for registry compatibility.

use serde::{Deserialize, Serialize};

/// One instance returned by a health-by-service query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Node the instance runs on
    #[serde(rename = "Node")]
    pub node: Node,
    /// The registered service instance
    #[serde(rename = "Service")]
    pub service: AgentService,
}

/// Node-level registration data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Address of the node itself
    #[serde(rename = "Address", default)]
    pub address: String,
}

/// Service-level registration data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentService {
    /// Service-specific address; empty means "use the node address"
    #[serde(rename = "Address", default)]
    pub address: String,
    /// Port the service listens on
    #[serde(rename = "Port")]
    pub port: u16,
}

impl ServiceEntry {
    /// The dialable `host:port` for this instance: the service-level
    /// address when set, otherwise the node-level address.
    pub fn endpoint(&self) -> String {
        let host = if self.service.address.is_empty() {
            &self.node.address
        } else {
            &self.service.address
        };
        format!("{}:{}", host, self.service.port)
    }
}
