//! Offline resource snapshots
//!
//! A snapshot is a multi-document YAML file holding `ProxyPatchPolicy`
//! objects and the `Gateway`s they attach to. Gateways of the configured
//! class become IR bundles and proxy fleets; everything else is ignored.

use std::collections::BTreeMap;

use gatehouse_common::config::GatewayConfig;
use gatehouse_common::crd::{Connection, ProxyPatchPolicy};
use gatehouse_common::gateway_api::KIND_GATEWAY;
use gatehouse_common::yaml::parse_yaml_multi;
use gatehouse_common::{Error, Result, GATEHOUSE_SYSTEM_NAMESPACE};
use gatehouse_translator::ir::{
    container_port_for, HttpListener, Infra, IrKey, ListenerPort, ListenerProtocol, ProxyConfig,
    ProxyInfra, ProxyListener, XdsIr, XdsIrMap,
};
use gatehouse_translator::{TargetMode, TranslatorConfig};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

const KIND_PROXY_PATCH_POLICY: &str = "ProxyPatchPolicy";

/// Namespace of snapshot objects that do not name one
const DEFAULT_NAMESPACE: &str = "default";

/// Address HTTP listeners bind inside the proxy
const LISTENER_ADDRESS: &str = "0.0.0.0";

/// The subset of a Gateway the snapshot needs
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayDoc {
    /// Object metadata
    pub metadata: ObjectMeta,
    /// Class and listeners
    pub spec: GatewaySpec,
}

/// Gateway spec fields used for translation
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySpec {
    /// GatewayClass the Gateway belongs to
    pub gateway_class_name: String,
    /// Listeners in declaration order
    #[serde(default)]
    pub listeners: Vec<GatewayListener>,
}

/// One Gateway listener
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayListener {
    /// Listener name, unique within the Gateway
    pub name: String,
    /// Service port
    pub port: i32,
    /// Listener protocol
    pub protocol: ListenerProtocol,
    /// Hostname matched by the listener
    #[serde(default)]
    pub hostname: Option<String>,
}

impl GatewayDoc {
    fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    fn http_listeners(&self, connection: Option<&Connection>) -> Result<Vec<HttpListener>> {
        self.spec
            .listeners
            .iter()
            .filter(|l| matches!(l.protocol, ListenerProtocol::Http | ListenerProtocol::Https))
            .map(|l| {
                let listener = HttpListener {
                    name: format!("{}/{}/{}", self.namespace(), self.name(), l.name),
                    address: LISTENER_ADDRESS.to_string(),
                    port: container_port_for(l.port).unsigned_abs(),
                    hostnames: l.hostname.iter().cloned().collect(),
                    connection_limit: None,
                };
                match connection {
                    Some(connection) => listener.with_connection(connection),
                    None => Ok(listener),
                }
            })
            .collect()
    }

    fn proxy_listeners(&self) -> Vec<ProxyListener> {
        self.spec
            .listeners
            .iter()
            .map(|l| ProxyListener {
                name: format!("{}/{}/{}", self.namespace(), self.name(), l.name),
                address: None,
                ports: vec![ListenerPort::new(
                    format!("{}-{}", l.protocol.service_protocol().to_lowercase(), l.port),
                    l.protocol,
                    l.port,
                )],
            })
            .collect()
    }
}

/// Parsed snapshot contents
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    /// Policies, each with a namespace
    pub policies: Vec<ProxyPatchPolicy>,
    /// Gateways of every class
    pub gateways: Vec<GatewayDoc>,
}

impl Snapshot {
    /// Parse a multi-document YAML snapshot. Objects without a namespace
    /// are placed in `default`.
    pub fn from_yaml(input: &str) -> Result<Self> {
        let docs = parse_yaml_multi(input).map_err(|e| Error::serialization(e.to_string()))?;
        let mut snapshot = Self::default();

        for doc in docs {
            let kind = doc.get("kind").and_then(Value::as_str).unwrap_or_default().to_string();
            match kind.as_str() {
                KIND_PROXY_PATCH_POLICY => {
                    let mut policy: ProxyPatchPolicy = serde_json::from_value(doc)
                        .map_err(|e| Error::serialization_for_kind(&kind, e.to_string()))?;
                    policy
                        .metadata
                        .namespace
                        .get_or_insert_with(|| DEFAULT_NAMESPACE.to_string());
                    snapshot.policies.push(policy);
                }
                KIND_GATEWAY => snapshot.gateways.push(
                    serde_json::from_value(doc)
                        .map_err(|e| Error::serialization_for_kind(&kind, e.to_string()))?,
                ),
                other => debug!(kind = other, "skipping snapshot document"),
            }
        }
        Ok(snapshot)
    }

    /// Gateways handled by this controller
    fn owned_gateways<'a>(
        &'a self,
        config: &'a GatewayConfig,
    ) -> impl Iterator<Item = &'a GatewayDoc> + 'a {
        self.gateways
            .iter()
            .filter(move |gw| gw.spec.gateway_class_name == config.gateway_class_name)
    }

    /// Build the IR store the resolver appends to.
    ///
    /// Per-gateway mode gets one bundle per owned Gateway. Merged mode gets
    /// a single bundle keyed by the class holding every owned listener.
    /// The configured connection settings apply to every HTTP listener.
    pub fn xds_ir(&self, config: &GatewayConfig) -> Result<XdsIrMap> {
        let mode = target_mode(config);
        let mut bundles: BTreeMap<IrKey, XdsIr> = BTreeMap::new();
        for gw in self.owned_gateways(config) {
            let key = mode.ir_key(gw.namespace(), gw.name());
            bundles
                .entry(key)
                .or_default()
                .http_listeners
                .extend(gw.http_listeners(config.connection.as_ref())?);
        }

        let mut map = XdsIrMap::new();
        for (key, ir) in bundles {
            map.insert(key, ir);
        }
        Ok(map)
    }

    /// Proxy fleets for the owned Gateways, one per IR bundle
    pub fn infra(&self, config: &GatewayConfig) -> Vec<Infra> {
        let proxy_config = {
            let settings = config.kubernetes_provider().proxy_deployment;
            ProxyConfig {
                image: settings.image,
                replicas: settings.replicas,
            }
        };

        if config.merge_gateways {
            let mut proxy = ProxyInfra::new(
                config.gateway_class_name.clone(),
                GATEHOUSE_SYSTEM_NAMESPACE,
                proxy_config,
            );
            for listener in self.owned_gateways(config).flat_map(GatewayDoc::proxy_listeners) {
                proxy.add_listener(listener);
            }
            if proxy.listeners.is_empty() {
                return Vec::new();
            }
            return vec![Infra::new(proxy)];
        }

        self.owned_gateways(config)
            .map(|gw| {
                let mut proxy = ProxyInfra::new(gw.name(), gw.namespace(), proxy_config.clone());
                for listener in gw.proxy_listeners() {
                    proxy.add_listener(listener);
                }
                Infra::new(proxy)
            })
            .collect()
    }
}

/// Resolver settings derived from the gateway configuration
pub fn translator_config(config: &GatewayConfig) -> TranslatorConfig {
    TranslatorConfig {
        mode: target_mode(config),
        patch_policy_enabled: config.patch_policy_enabled(),
    }
}

fn target_mode(config: &GatewayConfig) -> TargetMode {
    if config.merge_gateways {
        TargetMode::MergedGateways {
            gateway_class: config.gateway_class_name.clone(),
        }
    } else {
        TargetMode::PerGateway
    }
}
