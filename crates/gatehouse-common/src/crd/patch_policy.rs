//! ProxyPatchPolicy Custom Resource Definition
//!
//! A ProxyPatchPolicy carries raw JSON patches that the downstream renderer
//! applies to the generated proxy configuration of the Gateway it targets.
//! Patches are an escape hatch: the translator copies them verbatim and never
//! validates paths or values.
//!
//! ## Ordering
//!
//! Policies are applied in ascending `priority` order; ties keep the order in
//! which the policies were listed.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::policy::PolicyTargetReference;
use super::types::Conditions;

/// JSON Patch operation (RFC 6902)
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JsonPatchOp {
    /// Add a value at the path
    Add,
    /// Remove the value at the path
    Remove,
    /// Replace the value at the path
    Replace,
    /// Move the value at `from` to the path
    Move,
    /// Copy the value at `from` to the path
    Copy,
    /// Test that the value at the path equals the given value
    Test,
}

impl std::fmt::Display for JsonPatchOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Remove => write!(f, "remove"),
            Self::Replace => write!(f, "replace"),
            Self::Move => write!(f, "move"),
            Self::Copy => write!(f, "copy"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// A single JSON Patch operation
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JsonPatchOperation {
    /// Operation to perform
    pub op: JsonPatchOp,

    /// JSON Pointer to the location the operation acts on
    pub path: String,

    /// JSON Pointer to the source location (move and copy only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Value to add, replace, or test against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub value: Option<serde_json::Value>,
}

/// A patch against one generated proxy resource
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyJsonPatch {
    /// Type URL of the proxy resource being patched
    /// (e.g., type.googleapis.com/envoy.config.listener.v3.Listener)
    #[serde(rename = "type")]
    pub type_url: String,

    /// Name of the resource being patched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The patch operation
    pub operation: JsonPatchOperation,
}

/// Status of a ProxyPatchPolicy
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyPatchPolicyStatus {
    /// Status conditions, one per type
    #[serde(default, skip_serializing_if = "Conditions::is_empty")]
    pub conditions: Conditions,
}

/// Specification for a ProxyPatchPolicy
///
/// ## Example
///
/// ```yaml
/// apiVersion: gatehouse.dev/v1alpha1
/// kind: ProxyPatchPolicy
/// metadata:
///   name: listener-buffer
///   namespace: default
/// spec:
///   targetRef:
///     group: gateway.networking.k8s.io
///     kind: Gateway
///     name: eg
///   priority: 10
///   jsonPatches:
///     - type: type.googleapis.com/envoy.config.listener.v3.Listener
///       name: default/eg/http
///       operation:
///         op: add
///         path: /per_connection_buffer_limit_bytes
///         value: 1024
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "gatehouse.dev",
    version = "v1alpha1",
    kind = "ProxyPatchPolicy",
    plural = "proxypatchpolicies",
    shortname = "ppp",
    namespaced,
    status = "ProxyPatchPolicyStatus",
    printcolumn = r#"{"name":"Target","type":"string","jsonPath":".spec.targetRef.name"}"#,
    printcolumn = r#"{"name":"Priority","type":"integer","jsonPath":".spec.priority"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProxyPatchPolicySpec {
    /// Resource this policy attaches to
    pub target_ref: PolicyTargetReference,

    /// Ordering among policies targeting the same resource (lower first)
    #[serde(default)]
    pub priority: i32,

    /// Patches applied in declaration order
    #[serde(default)]
    pub json_patches: Vec<ProxyJsonPatch>,
}

/// Schema for free-form JSON values in CRD fields
fn preserve_unknown_fields(_gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
    let mut obj = schemars::schema::SchemaObject::default();
    obj.extensions.insert(
        "x-kubernetes-preserve-unknown-fields".to_string(),
        serde_json::Value::Bool(true),
    );
    schemars::schema::Schema::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::CustomResourceExt;

    fn sample_yaml_json() -> serde_json::Value {
        serde_json::json!({
            "apiVersion": "gatehouse.dev/v1alpha1",
            "kind": "ProxyPatchPolicy",
            "metadata": { "name": "listener-buffer", "namespace": "default" },
            "spec": {
                "targetRef": {
                    "group": "gateway.networking.k8s.io",
                    "kind": "Gateway",
                    "name": "eg"
                },
                "priority": 10,
                "jsonPatches": [{
                    "type": "type.googleapis.com/envoy.config.listener.v3.Listener",
                    "name": "default/eg/http",
                    "operation": {
                        "op": "add",
                        "path": "/per_connection_buffer_limit_bytes",
                        "value": 1024
                    }
                }]
            }
        })
    }

    #[test]
    fn policy_deserializes_from_manifest() {
        let policy: ProxyPatchPolicy = serde_json::from_value(sample_yaml_json()).unwrap();
        assert_eq!(policy.spec.priority, 10);
        assert_eq!(policy.spec.target_ref.kind, "Gateway");
        let patch = &policy.spec.json_patches[0];
        assert_eq!(patch.operation.op, JsonPatchOp::Add);
        assert_eq!(patch.operation.value, Some(serde_json::json!(1024)));
        assert!(patch.operation.from.is_none());
        assert!(policy.status.is_none());
    }

    #[test]
    fn priority_and_patches_default_when_omitted() {
        let mut value = sample_yaml_json();
        let spec = value["spec"].as_object_mut().unwrap();
        spec.remove("priority");
        spec.remove("jsonPatches");
        let policy: ProxyPatchPolicy = serde_json::from_value(value).unwrap();
        assert_eq!(policy.spec.priority, 0);
        assert!(policy.spec.json_patches.is_empty());
    }

    #[test]
    fn ops_use_rfc6902_names() {
        for (op, name) in [
            (JsonPatchOp::Add, "add"),
            (JsonPatchOp::Remove, "remove"),
            (JsonPatchOp::Replace, "replace"),
            (JsonPatchOp::Move, "move"),
            (JsonPatchOp::Copy, "copy"),
            (JsonPatchOp::Test, "test"),
        ] {
            assert_eq!(op.to_string(), name);
            assert_eq!(serde_json::to_value(op).unwrap(), serde_json::json!(name));
        }
    }

    #[test]
    fn crd_has_expected_identity() {
        let crd = ProxyPatchPolicy::crd();
        assert_eq!(crd.spec.group, "gatehouse.dev");
        assert_eq!(crd.spec.names.kind, "ProxyPatchPolicy");
        assert_eq!(crd.spec.names.plural, "proxypatchpolicies");
        assert_eq!(crd.spec.scope, "Namespaced");
    }

    #[test]
    fn patch_value_schema_preserves_unknown_fields() {
        let crd = serde_json::to_value(ProxyPatchPolicy::crd()).unwrap();
        let rendered = crd.to_string();
        assert!(rendered.contains("x-kubernetes-preserve-unknown-fields"));
    }
}
