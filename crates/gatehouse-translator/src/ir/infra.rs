//! Infrastructure IR: the runtime shape of a proxy fleet

use std::collections::BTreeMap;

use gatehouse_common::kube_utils::deterministic_hash;
use gatehouse_common::{
    LABEL_COMPONENT, LABEL_MANAGED_BY, LABEL_MANAGED_BY_GATEHOUSE, LABEL_NAME,
};
use serde::{Deserialize, Serialize};

/// Prefix of every generated proxy resource name
pub const PROXY_NAME_PREFIX: &str = "gatehouse";

/// Maximum length of a DNS-1123 label
const MAX_NAME_LEN: usize = 63;

/// Length of the hash suffix in generated names
const HASH_LEN: usize = 8;

/// Name segment used when the owner sanitizes to nothing
const EMPTY_OWNER_SEGMENT: &str = "proxy";

/// Ports below this are shifted so the proxy can run unprivileged
const PRIVILEGED_PORT_LIMIT: i32 = 1024;

/// Offset added to privileged service ports to get the container port
const UNPRIVILEGED_PORT_OFFSET: i32 = 10000;

/// Infrastructure for one IR bundle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Infra {
    /// The proxy fleet
    pub proxy: ProxyInfra,
}

impl Infra {
    /// Wrap a proxy description
    pub fn new(proxy: ProxyInfra) -> Self {
        Self { proxy }
    }
}

/// A managed proxy fleet
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyInfra {
    /// Owner identity: the IR key the fleet serves
    pub name: String,
    /// Namespace of the owning Gateway
    pub namespace: String,
    /// Extra labels applied to every generated object
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Workload settings
    pub config: ProxyConfig,
    /// Listeners exposed through the proxy Service
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub listeners: Vec<ProxyListener>,
}

impl ProxyInfra {
    /// Create a proxy fleet with no listeners
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, config: ProxyConfig) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            labels: BTreeMap::new(),
            config,
            listeners: Vec::new(),
        }
    }

    /// DNS-safe name shared by the fleet's ServiceAccount, ConfigMap,
    /// Deployment, and Service
    ///
    /// `gatehouse-<sanitized owner>-<hash>`, truncated to 63 characters. The
    /// hash is over the unsanitized owner so distinct owners never collide.
    pub fn resource_name(&self) -> String {
        let owner = format!("{}/{}", self.namespace, self.name);
        let hash = &deterministic_hash(&owner)[..HASH_LEN];
        let sanitized = sanitize_dns_label(&format!("{}-{}", self.namespace, self.name));

        let budget = MAX_NAME_LEN - PROXY_NAME_PREFIX.len() - HASH_LEN - 2;
        let body: String = sanitized.chars().take(budget).collect();
        let body = match body.trim_matches('-') {
            "" => EMPTY_OWNER_SEGMENT,
            trimmed => trimmed,
        };
        format!("{PROXY_NAME_PREFIX}-{body}-{hash}")
    }

    /// Add a listener, dropping ports the fleet already exposes.
    ///
    /// A Service port is identified by its Service protocol and number, so a
    /// second HTTP listener on port 80 (another hostname, or another Gateway
    /// in merged mode) shares the first one's port. A listener left without
    /// ports is not added.
    pub fn add_listener(&mut self, mut listener: ProxyListener) {
        let mut kept: Vec<ListenerPort> = Vec::with_capacity(listener.ports.len());
        for port in listener.ports.drain(..) {
            let exposed = self
                .listeners
                .iter()
                .flat_map(|l| &l.ports)
                .chain(&kept)
                .any(|p| p.same_service_port(&port));
            if !exposed {
                kept.push(port);
            }
        }
        listener.ports = kept;
        if !listener.ports.is_empty() {
            self.listeners.push(listener);
        }
    }

    /// Labels selecting the fleet's pods
    pub fn selector_labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (LABEL_NAME.to_string(), self.resource_name()),
            (LABEL_COMPONENT.to_string(), "proxy".to_string()),
        ])
    }

    /// Labels applied to every generated object
    pub fn object_labels(&self) -> BTreeMap<String, String> {
        let mut labels = self.labels.clone();
        labels.extend(self.selector_labels());
        labels.insert(
            LABEL_MANAGED_BY.to_string(),
            LABEL_MANAGED_BY_GATEHOUSE.to_string(),
        );
        labels
    }
}

/// Workload settings of a proxy fleet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Container image
    pub image: String,
    /// Replica count
    pub replicas: i32,
}

/// A listener exposed by the proxy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyListener {
    /// Listener name
    pub name: String,
    /// Bind address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Ports of the listener
    pub ports: Vec<ListenerPort>,
}

/// Transport protocol of a listener port
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListenerProtocol {
    /// HTTP
    Http,
    /// HTTPS
    Https,
    /// TLS passthrough
    Tls,
    /// TCP
    Tcp,
    /// UDP
    Udp,
}

impl ListenerProtocol {
    /// Kubernetes Service port protocol
    pub fn service_protocol(&self) -> &'static str {
        match self {
            Self::Udp => "UDP",
            _ => "TCP",
        }
    }
}

/// A single port of a listener
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerPort {
    /// Port name, unique within the Service
    pub name: String,
    /// Protocol
    pub protocol: ListenerProtocol,
    /// Port exposed on the Service
    pub service_port: i32,
    /// Port the proxy container binds
    pub container_port: i32,
}

impl ListenerPort {
    /// Port whose container port is derived from the service port
    pub fn new(name: impl Into<String>, protocol: ListenerProtocol, service_port: i32) -> Self {
        Self {
            name: name.into(),
            protocol,
            service_port,
            container_port: container_port_for(service_port),
        }
    }

    /// Returns true if both ports map to the same Service port
    fn same_service_port(&self, other: &ListenerPort) -> bool {
        self.service_port == other.service_port
            && self.protocol.service_protocol() == other.protocol.service_protocol()
    }
}

/// Container port for a service port: privileged ports shift by 10000
pub fn container_port_for(service_port: i32) -> i32 {
    if service_port < PRIVILEGED_PORT_LIMIT {
        service_port + UNPRIVILEGED_PORT_OFFSET
    } else {
        service_port
    }
}

fn sanitize_dns_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}
