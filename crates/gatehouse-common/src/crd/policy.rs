//! Policy attachment vocabulary shared by gatehouse policy CRDs
//!
//! Policies attach to a target resource through a [`PolicyTargetReference`]
//! and report attachment through a single `Accepted` condition whose reason
//! is one of [`PolicyReason`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type written by the translator onto every processed policy
pub const POLICY_CONDITION_ACCEPTED: &str = "Accepted";

/// Reason recorded on the `Accepted` condition
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum PolicyReason {
    /// Policy was attached to its target
    Accepted,
    /// Policy references an unsupported target or crosses namespaces
    Invalid,
    /// Policy kind is disabled in the gateway configuration
    Disabled,
    /// Target does not exist (reserved; unknown targets are deferred instead)
    TargetNotFound,
}

impl PolicyReason {
    /// String form used in the condition's `reason` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Invalid => "Invalid",
            Self::Disabled => "Disabled",
            Self::TargetNotFound => "TargetNotFound",
        }
    }
}

impl std::fmt::Display for PolicyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference from a policy to the resource it attaches to
///
/// `group` and `kind` have no implicit defaults: an omitted value is an empty
/// string and never matches a supported target.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyTargetReference {
    /// API group of the target (e.g., gateway.networking.k8s.io)
    #[serde(default)]
    pub group: String,

    /// Kind of the target (e.g., Gateway)
    #[serde(default)]
    pub kind: String,

    /// Name of the target
    pub name: String,

    /// Namespace of the target; defaults to the policy's namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Section of the target (e.g., a listener name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,
}

impl PolicyTargetReference {
    /// Namespace the reference resolves to for a policy living in `policy_namespace`
    pub fn effective_namespace<'a>(&'a self, policy_namespace: &'a str) -> &'a str {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => ns,
            _ => policy_namespace,
        }
    }
}
