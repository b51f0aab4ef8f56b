//! Proxy fleet objects: ServiceAccount, bootstrap ConfigMap, Deployment, Service

use std::collections::BTreeMap;

use gatehouse_common::{Error, Result};
use gatehouse_translator::ir::ProxyInfra;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, ContainerPort, PodSpec, PodTemplateSpec,
    Service, ServiceAccount, ServicePort, ServiceSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde_json::json;

/// ConfigMap key holding the proxy bootstrap
pub const PROXY_CONFIG_KEY: &str = "bootstrap.json";

/// Proxy admin interface port
pub const PROXY_ADMIN_PORT: i32 = 19000;

const CONFIG_MOUNT_PATH: &str = "/config";
const XDS_SERVER_ADDRESS: &str = "gatehouse.gatehouse-system.svc.cluster.local";
const XDS_SERVER_PORT: i32 = 18000;

fn metadata(proxy: &ProxyInfra, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(proxy.resource_name()),
        namespace: Some(namespace.to_string()),
        labels: Some(proxy.object_labels()),
        ..Default::default()
    }
}

pub(super) fn service_account(proxy: &ProxyInfra, namespace: &str) -> ServiceAccount {
    ServiceAccount {
        metadata: metadata(proxy, namespace),
        ..Default::default()
    }
}

/// Minimal bootstrap: admin listener plus ADS from the controller
fn bootstrap(proxy: &ProxyInfra) -> serde_json::Value {
    json!({
        "node": { "id": proxy.resource_name(), "cluster": proxy.name },
        "admin": {
            "address": { "socket_address": { "address": "127.0.0.1", "port_value": PROXY_ADMIN_PORT } }
        },
        "dynamic_resources": {
            "ads_config": {
                "api_type": "DELTA_GRPC",
                "transport_api_version": "V3",
                "grpc_services": [{ "envoy_grpc": { "cluster_name": "xds_cluster" } }]
            },
            "lds_config": { "ads": {}, "resource_api_version": "V3" },
            "cds_config": { "ads": {}, "resource_api_version": "V3" }
        },
        "static_resources": {
            "clusters": [{
                "name": "xds_cluster",
                "type": "STRICT_DNS",
                "typed_extension_protocol_options": {
                    "envoy.extensions.upstreams.http.v3.HttpProtocolOptions": {
                        "@type": "type.googleapis.com/envoy.extensions.upstreams.http.v3.HttpProtocolOptions",
                        "explicit_http_config": { "http2_protocol_options": {} }
                    }
                },
                "load_assignment": {
                    "cluster_name": "xds_cluster",
                    "endpoints": [{ "lb_endpoints": [{ "endpoint": { "address": {
                        "socket_address": { "address": XDS_SERVER_ADDRESS, "port_value": XDS_SERVER_PORT }
                    } } }] }]
                }
            }]
        }
    })
}

pub(super) fn config_map(proxy: &ProxyInfra, namespace: &str) -> Result<ConfigMap> {
    let rendered = serde_json::to_string_pretty(&bootstrap(proxy))
        .map_err(|e| Error::serialization_for_kind("ConfigMap", e.to_string()))?;
    Ok(ConfigMap {
        metadata: metadata(proxy, namespace),
        data: Some(BTreeMap::from([(PROXY_CONFIG_KEY.to_string(), rendered)])),
        ..Default::default()
    })
}

pub(super) fn deployment(proxy: &ProxyInfra, namespace: &str) -> Deployment {
    let name = proxy.resource_name();
    let ports: Vec<ContainerPort> = proxy
        .listeners
        .iter()
        .flat_map(|l| &l.ports)
        .map(|p| ContainerPort {
            name: Some(p.name.clone()),
            container_port: p.container_port,
            protocol: Some(p.protocol.service_protocol().to_string()),
            ..Default::default()
        })
        .collect();

    Deployment {
        metadata: metadata(proxy, namespace),
        spec: Some(DeploymentSpec {
            replicas: Some(proxy.config.replicas),
            selector: LabelSelector {
                match_labels: Some(proxy.selector_labels()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(proxy.object_labels()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(name.clone()),
                    containers: vec![Container {
                        name: "envoy".to_string(),
                        image: Some(proxy.config.image.clone()),
                        args: Some(vec![
                            "--config-path".to_string(),
                            format!("{CONFIG_MOUNT_PATH}/{PROXY_CONFIG_KEY}"),
                            "--service-cluster".to_string(),
                            proxy.name.clone(),
                        ]),
                        ports: (!ports.is_empty()).then_some(ports),
                        volume_mounts: Some(vec![VolumeMount {
                            name: "bootstrap".to_string(),
                            mount_path: CONFIG_MOUNT_PATH.to_string(),
                            read_only: Some(true),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    volumes: Some(vec![Volume {
                        name: "bootstrap".to_string(),
                        config_map: Some(ConfigMapVolumeSource {
                            name: name.clone(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(super) fn service(proxy: &ProxyInfra, namespace: &str) -> Service {
    let ports: Vec<ServicePort> = proxy
        .listeners
        .iter()
        .flat_map(|l| &l.ports)
        .map(|p| ServicePort {
            name: Some(p.name.clone()),
            port: p.service_port,
            target_port: Some(IntOrString::Int(p.container_port)),
            protocol: Some(p.protocol.service_protocol().to_string()),
            ..Default::default()
        })
        .collect();

    Service {
        metadata: metadata(proxy, namespace),
        spec: Some(ServiceSpec {
            type_: Some("LoadBalancer".to_string()),
            selector: Some(proxy.selector_labels()),
            ports: Some(ports),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_translator::ir::{ListenerPort, ListenerProtocol, ProxyConfig, ProxyListener};

    fn proxy() -> ProxyInfra {
        let mut p = ProxyInfra::new(
            "eg",
            "default",
            ProxyConfig {
                image: "envoy:test".to_string(),
                replicas: 1,
            },
        );
        p.listeners = vec![
            ProxyListener {
                name: "http".to_string(),
                address: None,
                ports: vec![ListenerPort::new("http-80", ListenerProtocol::Http, 80)],
            },
            ProxyListener {
                name: "dns".to_string(),
                address: None,
                ports: vec![ListenerPort::new("udp-5353", ListenerProtocol::Udp, 5353)],
            },
        ];
        p
    }

    #[test]
    fn service_maps_service_ports_to_container_ports() {
        let svc = service(&proxy(), "gatehouse-system");
        let ports = svc.spec.unwrap().ports.unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].port, 80);
        assert_eq!(ports[0].target_port, Some(IntOrString::Int(10080)));
        assert_eq!(ports[1].protocol.as_deref(), Some("UDP"));
    }

    #[test]
    fn deployment_selector_matches_pod_labels() {
        let d = deployment(&proxy(), "gatehouse-system");
        let spec = d.spec.unwrap();
        let selector = spec.selector.match_labels.unwrap();
        let pod_labels = spec.template.metadata.unwrap().labels.unwrap();
        for (k, v) in &selector {
            assert_eq!(pod_labels.get(k), Some(v));
        }
        let pod = spec.template.spec.unwrap();
        assert_eq!(pod.containers[0].ports.as_ref().unwrap()[0].container_port, 10080);
        assert_eq!(
            pod.volumes.unwrap()[0].config_map.as_ref().unwrap().name,
            proxy().resource_name()
        );
    }

    #[test]
    fn config_map_holds_bootstrap_for_this_proxy() {
        let cm = config_map(&proxy(), "gatehouse-system").unwrap();
        let raw = &cm.data.unwrap()[PROXY_CONFIG_KEY];
        let parsed: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed["node"]["id"], proxy().resource_name());
        assert_eq!(parsed["admin"]["address"]["socket_address"]["port_value"], PROXY_ADMIN_PORT);
    }

    #[test]
    fn listenerless_proxy_has_no_container_ports() {
        let mut p = proxy();
        p.listeners.clear();
        let pod = deployment(&p, "ns").spec.unwrap().template.spec.unwrap();
        assert!(pod.containers[0].ports.is_none());
    }
}
