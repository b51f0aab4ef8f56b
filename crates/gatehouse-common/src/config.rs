//! Gateway controller configuration
//!
//! Loaded once at startup from a YAML file. Every field has a default so a
//! partial file only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::crd::Connection;
use crate::yaml::parse_yaml_as;
use crate::{Error, Result};

/// Default GatewayClass handled by the controller
pub const DEFAULT_GATEWAY_CLASS: &str = "gatehouse";

/// Default controller name written into route statuses
pub const DEFAULT_CONTROLLER_NAME: &str = "gatehouse.dev/gatehouse-controller";

/// Default proxy image
pub const DEFAULT_PROXY_IMAGE: &str = "docker.io/envoyproxy/envoy:distroless-v1.31.0";

/// Default rate limit service image
pub const DEFAULT_RATE_LIMIT_IMAGE: &str = "docker.io/envoyproxy/ratelimit:master";

/// Top-level controller configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    /// GatewayClass this controller reconciles
    pub gateway_class_name: String,
    /// Controller name matched against `GatewayClass.spec.controllerName`
    pub controller_name: String,
    /// Where the proxy fleet runs
    pub provider: Provider,
    /// Optional extension APIs
    pub extension_apis: ExtensionApis,
    /// Merge every Gateway of the class into one proxy fleet
    pub merge_gateways: bool,
    /// Gateway API settings of the cluster
    pub gateway_api: GatewayApiSettings,
    /// Shared rate limit service
    pub rate_limit: RateLimitSettings,
    /// Connection settings applied to every HTTP listener
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<Connection>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateway_class_name: DEFAULT_GATEWAY_CLASS.to_string(),
            controller_name: DEFAULT_CONTROLLER_NAME.to_string(),
            provider: Provider::default(),
            extension_apis: ExtensionApis::default(),
            merge_gateways: false,
            gateway_api: GatewayApiSettings::default(),
            rate_limit: RateLimitSettings::default(),
            connection: None,
        }
    }
}

impl GatewayConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(input: &str) -> Result<Self> {
        let config: Self = parse_yaml_as(input).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.gateway_class_name.trim().is_empty() {
            return Err(Error::config("gatewayClassName must not be empty"));
        }
        if self.controller_name.trim().is_empty() {
            return Err(Error::config("controllerName must not be empty"));
        }
        if let Some(k8s) = &self.provider.kubernetes {
            k8s.proxy_deployment.validate("proxyDeployment")?;
            k8s.rate_limit_deployment.validate("rateLimitDeployment")?;
        }
        if let Some(connection) = &self.connection {
            connection.validate()?;
        }
        Ok(())
    }

    /// Returns true when ProxyPatchPolicy processing is switched on
    pub fn patch_policy_enabled(&self) -> bool {
        self.extension_apis.enable_patch_policy
    }

    /// Kubernetes provider settings, defaulted when the section is absent
    pub fn kubernetes_provider(&self) -> KubernetesProvider {
        self.provider.kubernetes.clone().unwrap_or_default()
    }
}

/// Kind of infrastructure provider
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderType {
    /// Proxies run as Kubernetes workloads
    #[default]
    Kubernetes,
    /// Resources are read from files; no managed infrastructure
    File,
    /// Externally managed infrastructure
    Custom,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kubernetes => write!(f, "Kubernetes"),
            Self::File => write!(f, "File"),
            Self::Custom => write!(f, "Custom"),
        }
    }
}

/// Infrastructure provider selection
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Provider {
    /// Provider kind
    #[serde(rename = "type")]
    pub type_: ProviderType,
    /// Settings for the Kubernetes provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubernetes: Option<KubernetesProvider>,
}

/// Settings for proxies and the rate limit service on Kubernetes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubernetesProvider {
    /// Proxy Deployment settings
    pub proxy_deployment: DeploymentSettings,
    /// Rate limit Deployment settings
    pub rate_limit_deployment: DeploymentSettings,
}

impl Default for KubernetesProvider {
    fn default() -> Self {
        Self {
            proxy_deployment: DeploymentSettings {
                image: DEFAULT_PROXY_IMAGE.to_string(),
                replicas: 1,
            },
            rate_limit_deployment: DeploymentSettings {
                image: DEFAULT_RATE_LIMIT_IMAGE.to_string(),
                replicas: 1,
            },
        }
    }
}

/// Image and scale of a managed Deployment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploymentSettings {
    /// Container image
    pub image: String,
    /// Replica count
    #[serde(default = "default_replicas")]
    pub replicas: i32,
}

fn default_replicas() -> i32 {
    1
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            image: String::new(),
            replicas: default_replicas(),
        }
    }
}

impl DeploymentSettings {
    fn validate(&self, field: &str) -> Result<()> {
        if self.image.trim().is_empty() {
            return Err(Error::config(format!("{field}.image must not be empty")));
        }
        if self.replicas < 0 {
            return Err(Error::config(format!(
                "{field}.replicas must be non-negative, got {}",
                self.replicas
            )));
        }
        Ok(())
    }
}

/// Opt-in extension APIs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtensionApis {
    /// Process ProxyPatchPolicy resources
    pub enable_patch_policy: bool,
}

/// Newest Gateway API version served by the cluster
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServedVersion {
    /// GA version
    #[default]
    #[serde(rename = "v1")]
    V1,
    /// Beta: GA request paths are rewritten to `v1beta1`
    #[serde(rename = "v1beta1")]
    V1Beta1,
    /// Alpha: `v1beta1` objects are converted to `v1alpha2` and back
    #[serde(rename = "v1alpha2")]
    V1Alpha2,
}

/// Gateway API settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayApiSettings {
    /// Highest Gateway API version the cluster serves
    pub served_version: ServedVersion,
}

impl GatewayApiSettings {
    /// Returns true when the client must rewrite `v1` request paths
    pub fn needs_path_rewrite(&self) -> bool {
        self.served_version == ServedVersion::V1Beta1
    }

    /// Returns true when reads and writes must go through the version shim
    pub fn needs_version_shim(&self) -> bool {
        self.served_version == ServedVersion::V1Alpha2
    }
}

/// Shared rate limit service settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RateLimitSettings {
    /// Deploy the rate limit service
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = GatewayConfig::from_yaml("").unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(config.provider.type_, ProviderType::Kubernetes);
        assert!(!config.patch_policy_enabled());
        assert!(!config.merge_gateways);
        assert!(!config.gateway_api.needs_version_shim());
        assert!(!config.gateway_api.needs_path_rewrite());
        assert!(!config.rate_limit.enabled);
    }

    #[test]
    fn full_file_overrides_every_section() {
        let yaml = r#"
gatewayClassName: edge
controllerName: example.com/edge
provider:
  type: Kubernetes
  kubernetes:
    proxyDeployment:
      image: envoy:test
      replicas: 3
    rateLimitDeployment:
      image: ratelimit:test
      replicas: 2
extensionApis:
  enablePatchPolicy: true
mergeGateways: true
gatewayApi:
  servedVersion: v1beta1
rateLimit:
  enabled: true
"#;
        let config = GatewayConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.gateway_class_name, "edge");
        assert!(config.patch_policy_enabled());
        assert!(config.merge_gateways);
        assert!(config.gateway_api.needs_path_rewrite());
        assert!(!config.gateway_api.needs_version_shim());
        assert!(config.rate_limit.enabled);
        let k8s = config.kubernetes_provider();
        assert_eq!(k8s.proxy_deployment.replicas, 3);
        assert_eq!(k8s.rate_limit_deployment.image, "ratelimit:test");
    }

    #[test]
    fn partial_deployment_section_keeps_other_defaults() {
        let yaml = "provider:\n  kubernetes:\n    proxyDeployment:\n      image: envoy:x\n      replicas: 1\n";
        let config = GatewayConfig::from_yaml(yaml).unwrap();
        let k8s = config.kubernetes_provider();
        assert_eq!(k8s.proxy_deployment.image, "envoy:x");
        assert_eq!(k8s.rate_limit_deployment.image, DEFAULT_RATE_LIMIT_IMAGE);
    }

    #[test]
    fn omitted_replicas_default_to_one() {
        let yaml = "provider:\n  kubernetes:\n    proxyDeployment:\n      image: envoy:x\n";
        let k8s = GatewayConfig::from_yaml(yaml).unwrap().kubernetes_provider();
        assert_eq!(k8s.proxy_deployment.image, "envoy:x");
        assert_eq!(k8s.proxy_deployment.replicas, 1);
    }

    #[test]
    fn connection_settings_are_parsed_and_validated() {
        let yaml = "connection:\n  connectionLimit:\n    value: 100\n    closeDelay: 5s\n";
        let config = GatewayConfig::from_yaml(yaml).unwrap();
        let limit = config.connection.unwrap().connection_limit.unwrap();
        assert_eq!(limit.value, 100);
        assert_eq!(limit.close_delay.as_deref(), Some("5s"));

        let bad = "connection:\n  connectionLimit:\n    value: 1\n    closeDelay: soon\n";
        let err = GatewayConfig::from_yaml(bad).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn non_kubernetes_providers_parse() {
        let config = GatewayConfig::from_yaml("provider:\n  type: File\n").unwrap();
        assert_eq!(config.provider.type_, ProviderType::File);
        assert_eq!(config.provider.type_.to_string(), "File");
    }

    #[test]
    fn alpha_served_version_selects_the_shim() {
        let config = GatewayConfig::from_yaml("gatewayApi:\n  servedVersion: v1alpha2\n").unwrap();
        assert_eq!(config.gateway_api.served_version, ServedVersion::V1Alpha2);
        assert!(config.gateway_api.needs_version_shim());
        assert!(!config.gateway_api.needs_path_rewrite());
    }

    #[test]
    fn empty_class_name_is_rejected() {
        let err = GatewayConfig::from_yaml("gatewayClassName: \"\"").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("gatewayClassName"));
    }

    #[test]
    fn negative_replicas_are_rejected() {
        let yaml = "provider:\n  kubernetes:\n    proxyDeployment:\n      image: envoy\n      replicas: -1\n";
        let err = GatewayConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("proxyDeployment.replicas"));
    }

    #[test]
    fn unknown_provider_type_is_a_config_error() {
        let err = GatewayConfig::from_yaml("provider:\n  type: Nomad\n").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
