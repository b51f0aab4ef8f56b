//! Shared rate limit service objects

use std::collections::BTreeMap;

use gatehouse_common::config::DeploymentSettings;
use gatehouse_common::{LABEL_COMPONENT, LABEL_MANAGED_BY, LABEL_MANAGED_BY_GATEHOUSE, LABEL_NAME};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

/// Name of the rate limit Deployment and Service
pub const RATE_LIMIT_NAME: &str = "gatehouse-ratelimit";

/// gRPC port proxies call for rate limit decisions
pub const RATE_LIMIT_GRPC_PORT: i32 = 8081;

fn selector_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        (LABEL_NAME.to_string(), RATE_LIMIT_NAME.to_string()),
        (LABEL_COMPONENT.to_string(), "ratelimit".to_string()),
    ])
}

fn metadata(namespace: &str) -> ObjectMeta {
    let mut labels = selector_labels();
    labels.insert(
        LABEL_MANAGED_BY.to_string(),
        LABEL_MANAGED_BY_GATEHOUSE.to_string(),
    );
    ObjectMeta {
        name: Some(RATE_LIMIT_NAME.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(labels),
        ..Default::default()
    }
}

pub(super) fn deployment(settings: &DeploymentSettings, namespace: &str) -> Deployment {
    Deployment {
        metadata: metadata(namespace),
        spec: Some(DeploymentSpec {
            replicas: Some(settings.replicas),
            selector: LabelSelector {
                match_labels: Some(selector_labels()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(selector_labels()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "ratelimit".to_string(),
                        image: Some(settings.image.clone()),
                        command: Some(vec!["/bin/ratelimit".to_string()]),
                        env: Some(vec![
                            EnvVar {
                                name: "GRPC_PORT".to_string(),
                                value: Some(RATE_LIMIT_GRPC_PORT.to_string()),
                                ..Default::default()
                            },
                            EnvVar {
                                name: "USE_STATSD".to_string(),
                                value: Some("false".to_string()),
                                ..Default::default()
                            },
                        ]),
                        ports: Some(vec![ContainerPort {
                            name: Some("grpc".to_string()),
                            container_port: RATE_LIMIT_GRPC_PORT,
                            protocol: Some("TCP".to_string()),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub(super) fn service(namespace: &str) -> Service {
    Service {
        metadata: metadata(namespace),
        spec: Some(ServiceSpec {
            selector: Some(selector_labels()),
            ports: Some(vec![ServicePort {
                name: Some("grpc".to_string()),
                port: RATE_LIMIT_GRPC_PORT,
                target_port: Some(IntOrString::Int(RATE_LIMIT_GRPC_PORT)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
