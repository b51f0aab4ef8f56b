//! Shared Kubernetes helpers using kube-rs
//!
//! Building `ApiResource`s:
//! - Compile-time known apiVersion/kind: implement [`HasApiResource`].
//! - apiVersion from a manifest or a version table: [`build_api_resource`].

use kube::core::{DynamicObject, ObjectMeta};
use kube::discovery::ApiResource;

/// Trait for types that have a known API group, version, and kind.
///
/// # Example
/// ```ignore
/// impl HasApiResource for ProxyDeployment {
///     const API_VERSION: &'static str = "apps/v1";
///     const KIND: &'static str = "Deployment";
/// }
/// ```
pub trait HasApiResource {
    /// Full API version (e.g., "apps/v1", "v1")
    const API_VERSION: &'static str;
    /// Resource kind (e.g., "Deployment")
    const KIND: &'static str;

    /// Build an ApiResource from the type's constants.
    fn api_resource() -> ApiResource {
        build_api_resource(Self::API_VERSION, Self::KIND)
    }
}

/// Build an ApiResource from an apiVersion string and kind.
///
/// ```ignore
/// let ar = build_api_resource("gateway.networking.k8s.io/v1beta1", "HTTPRoute");
/// ```
pub fn build_api_resource(api_version: &str, kind: &str) -> ApiResource {
    let (group, version) = parse_api_version(api_version);
    ApiResource {
        group,
        version,
        kind: kind.to_string(),
        api_version: api_version.to_string(),
        plural: pluralize_kind(kind),
    }
}

/// Split an apiVersion into (group, version). Core resources have an empty group.
///
/// ```ignore
/// let (group, version) = parse_api_version("v1");
/// assert_eq!(group, "");
/// assert_eq!(version, "v1");
/// ```
pub fn parse_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

/// Join a group and version into an apiVersion string
pub fn join_api_version(group: &str, version: &str) -> String {
    if group.is_empty() {
        version.to_string()
    } else {
        format!("{group}/{version}")
    }
}

/// Known irregular plurals
const KIND_PLURALS: &[(&str, &str)] = &[
    ("gatewayclass", "gatewayclasses"),
    ("proxypatchpolicy", "proxypatchpolicies"),
    ("endpoints", "endpoints"),
];

/// Pluralize a Kubernetes resource kind
///
/// Uses a lookup table for known irregular kinds, falling back to simple
/// pluralization rules.
pub fn pluralize_kind(kind: &str) -> String {
    let lower = kind.to_lowercase();

    for (singular, plural) in KIND_PLURALS {
        if *singular == lower {
            return (*plural).to_string();
        }
    }

    if lower.ends_with('s') || lower.ends_with("ch") || lower.ends_with("sh") {
        format!("{}es", lower)
    } else if lower.ends_with('y') && !lower.ends_with("ay") && !lower.ends_with("ey") {
        format!("{}ies", &lower[..lower.len() - 1])
    } else {
        format!("{}s", lower)
    }
}

/// Build an empty DynamicObject with identity metadata for the given resource
pub fn dynamic_object(ar: &ApiResource, name: &str, namespace: Option<&str>) -> DynamicObject {
    let mut obj = DynamicObject::new(name, ar);
    obj.metadata = ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespace.map(str::to_string),
        ..Default::default()
    };
    obj
}

/// Compute a deterministic hash of the input string, returning a 16-char hex digest.
///
/// Uses truncated SHA-256 so generated names are stable across toolchains.
pub fn deterministic_hash(input: &str) -> String {
    use aws_lc_rs::digest;
    let hash = digest::digest(&digest::SHA256, input.as_bytes());
    hash.as_ref()[..8]
        .iter()
        .fold(String::with_capacity(16), |mut s, b| {
            use std::fmt::Write;
            let _ = write!(s, "{:02x}", b);
            s
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ProxyDeployment;

    impl HasApiResource for ProxyDeployment {
        const API_VERSION: &'static str = "apps/v1";
        const KIND: &'static str = "Deployment";
    }

    #[test]
    fn has_api_resource_builds_consistent_resource() {
        let ar = ProxyDeployment::api_resource();
        assert_eq!(ar.group, "apps");
        assert_eq!(ar.version, "v1");
        assert_eq!(ar.kind, "Deployment");
        assert_eq!(ar.plural, "deployments");
    }

    #[test]
    fn parse_api_version_handles_core_group() {
        assert_eq!(parse_api_version("v1"), (String::new(), "v1".to_string()));
        assert_eq!(
            parse_api_version("gateway.networking.k8s.io/v1beta1"),
            ("gateway.networking.k8s.io".to_string(), "v1beta1".to_string())
        );
        assert_eq!(join_api_version("", "v1"), "v1");
        assert_eq!(join_api_version("apps", "v1"), "apps/v1");
    }

    #[test]
    fn pluralize_known_and_regular_kinds() {
        assert_eq!(pluralize_kind("GatewayClass"), "gatewayclasses");
        assert_eq!(pluralize_kind("ProxyPatchPolicy"), "proxypatchpolicies");
        assert_eq!(pluralize_kind("HTTPRoute"), "httproutes");
        assert_eq!(pluralize_kind("Gateway"), "gateways");
        assert_eq!(pluralize_kind("Service"), "services");
        assert_eq!(pluralize_kind("ConfigMap"), "configmaps");
    }

    #[test]
    fn dynamic_object_carries_identity() {
        let ar = build_api_resource("gateway.networking.k8s.io/v1beta1", "Gateway");
        let obj = dynamic_object(&ar, "eg", Some("infra"));
        assert_eq!(obj.metadata.name.as_deref(), Some("eg"));
        assert_eq!(obj.metadata.namespace.as_deref(), Some("infra"));
        let types = obj.types.unwrap();
        assert_eq!(types.kind, "Gateway");
        assert_eq!(types.api_version, "gateway.networking.k8s.io/v1beta1");
    }

    #[test]
    fn deterministic_hash_is_stable_and_short() {
        let a = deterministic_hash("default/eg");
        assert_eq!(a.len(), 16);
        assert_eq!(a, deterministic_hash("default/eg"));
        assert_ne!(a, deterministic_hash("default/other"));
    }
}
