//! Proxy configuration IR
//!
//! An upstream gateway pass creates one [`XdsIr`] per target in the
//! [`XdsIrMap`]. Policy resolution only looks entries up and appends to them.

use std::collections::BTreeMap;
use std::time::Duration;

use gatehouse_common::crd::{self, ProxyPatchPolicy};
use gatehouse_common::Result;
use kube::ResourceExt;
use serde::{Deserialize, Serialize};

/// Identity of a policy object, used as a back-reference from the IR
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyKey {
    /// Policy namespace
    pub namespace: String,
    /// Policy name
    pub name: String,
}

impl PolicyKey {
    /// Create a key from namespace and name
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an existing policy object
    pub fn of(policy: &ProxyPatchPolicy) -> Self {
        Self::new(policy.namespace().unwrap_or_default(), policy.name_any())
    }
}

impl std::fmt::Display for PolicyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Key of an IR bundle: `namespace/name` of a Gateway, or a GatewayClass
/// name when gateways are merged
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IrKey(String);

impl IrKey {
    /// Key for a single Gateway
    pub fn for_gateway(namespace: &str, name: &str) -> Self {
        Self(format!("{namespace}/{name}"))
    }

    /// Key shared by every Gateway of a class in merged mode
    pub fn for_gateway_class(class: &str) -> Self {
        Self(class.to_string())
    }

    /// The key as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IrKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// All proxy configuration bundles of one translation pass
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct XdsIrMap(BTreeMap<IrKey, XdsIr>);

impl XdsIrMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bundle for a target, replacing any previous one
    pub fn insert(&mut self, key: IrKey, ir: XdsIr) {
        self.0.insert(key, ir);
    }

    /// Look up a bundle
    pub fn get(&self, key: &IrKey) -> Option<&XdsIr> {
        self.0.get(key)
    }

    /// Look up a bundle for appending
    pub fn get_mut(&mut self, key: &IrKey) -> Option<&mut XdsIr> {
        self.0.get_mut(key)
    }

    /// Returns true if a bundle exists for the key
    pub fn contains_key(&self, key: &IrKey) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate bundles in key order
    pub fn iter(&self) -> impl Iterator<Item = (&IrKey, &XdsIr)> {
        self.0.iter()
    }

    /// Number of bundles
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no bundles
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Proxy configuration for one target
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XdsIr {
    /// HTTP listeners of the target
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http_listeners: Vec<HttpListener>,
    /// Accepted patch policies in processing order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patch_policies: Vec<PatchPolicyIr>,
}

/// An HTTP listener on the proxy
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpListener {
    /// Unique name, conventionally `namespace/gateway/listener`
    pub name: String,
    /// Bind address
    pub address: String,
    /// Container port the proxy listens on
    pub port: u32,
    /// Hostnames matched by this listener
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hostnames: Vec<String>,
    /// Downstream connection limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_limit: Option<ConnectionLimit>,
}

impl HttpListener {
    /// Apply user connection settings to the listener
    pub fn with_connection(mut self, connection: &crd::Connection) -> Result<Self> {
        connection.validate()?;
        self.connection_limit = connection
            .connection_limit
            .as_ref()
            .map(ConnectionLimit::from_settings)
            .transpose()?;
        Ok(self)
    }
}

/// Resolved connection limit of a listener
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionLimit {
    /// Maximum concurrent connections
    pub value: u64,
    /// Delay before closing rejected connections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_delay: Option<Duration>,
}

impl ConnectionLimit {
    /// Resolve user settings, parsing the close delay
    pub fn from_settings(limit: &crd::ConnectionLimit) -> Result<Self> {
        limit.validate()?;
        Ok(Self {
            value: limit.value.unsigned_abs(),
            close_delay: limit.close_delay_duration()?,
        })
    }
}

/// An accepted patch policy attached to a bundle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchPolicyIr {
    /// Policy the patches came from, for status reporting
    pub policy: PolicyKey,
    /// Priority the policy was sorted by
    pub priority: i32,
    /// Compiled patches in declaration order
    pub patches: Vec<JsonPatchConfig>,
}

/// A single patch against generated proxy configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonPatchConfig {
    /// Type URL of the proxy resource to patch
    pub type_url: String,
    /// Name of the resource to patch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The operation
    pub operation: PatchOperation,
}

/// RFC 6902 operation, unchecked
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOperation {
    /// Operation kind
    pub op: PatchOp,
    /// Target JSON pointer
    pub path: String,
    /// Source JSON pointer for move and copy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Value for add, replace, and test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Operation kinds understood by the renderer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    /// add
    Add,
    /// remove
    Remove,
    /// replace
    Replace,
    /// move
    Move,
    /// copy
    Copy,
    /// test
    Test,
}
