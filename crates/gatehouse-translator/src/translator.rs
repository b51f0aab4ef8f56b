//! Policy attachment
//!
//! Policies are processed in ascending priority order. Each one is looked up
//! in the IR by its target, validated, and either appended to the target's
//! bundle or rejected with a status condition. A policy whose target has no
//! bundle yet is deferred: nothing is written for it.

use gatehouse_common::crd::{PolicyReason, ProxyPatchPolicy};
use gatehouse_common::gateway_api::{GROUP, KIND_GATEWAY, KIND_GATEWAY_CLASS};
use tracing::{debug, info, warn};

use crate::ir::{IrKey, PolicyKey, XdsIrMap};
use crate::patch::compile_policy;
use crate::status::{set_accepted, set_rejected};

/// Message recorded when patch policies are switched off
pub const MESSAGE_DISABLED: &str = "ProxyPatchPolicy is disabled in the gateway configuration";

/// How targets map onto IR bundles
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetMode {
    /// One bundle per Gateway, keyed `namespace/name`
    PerGateway,
    /// All Gateways of a class share one bundle keyed by the class name
    MergedGateways {
        /// The GatewayClass whose bundle every policy attaches to
        gateway_class: String,
    },
}

impl TargetMode {
    /// Target kind policies must reference in this mode
    pub fn target_kind(&self) -> &'static str {
        match self {
            Self::PerGateway => KIND_GATEWAY,
            Self::MergedGateways { .. } => KIND_GATEWAY_CLASS,
        }
    }

    /// Bundle key for a target in `namespace` called `name`
    pub fn ir_key(&self, namespace: &str, name: &str) -> IrKey {
        match self {
            Self::PerGateway => IrKey::for_gateway(namespace, name),
            Self::MergedGateways { gateway_class } => IrKey::for_gateway_class(gateway_class),
        }
    }
}

/// Translator settings fixed for the lifetime of a [`Translator`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslatorConfig {
    /// Target keying mode
    pub mode: TargetMode,
    /// Whether ProxyPatchPolicy is enabled; disabled policies are rejected
    pub patch_policy_enabled: bool,
}

/// Result of processing one policy
#[derive(Clone, Debug, PartialEq)]
pub enum PolicyOutcome {
    /// Appended to the target's bundle
    Accepted {
        /// The policy
        policy: PolicyKey,
        /// Bundle it was appended to
        target: IrKey,
    },
    /// Rejected; the reason and message were written to status
    Rejected {
        /// The policy
        policy: PolicyKey,
        /// Why
        reason: PolicyReason,
        /// Explanation recorded on the condition
        message: String,
    },
    /// Target has no bundle yet; no status written
    Deferred {
        /// The policy
        policy: PolicyKey,
        /// Bundle key that was missing
        key: IrKey,
    },
}

impl PolicyOutcome {
    /// The policy this outcome is for
    pub fn policy(&self) -> &PolicyKey {
        match self {
            Self::Accepted { policy, .. }
            | Self::Rejected { policy, .. }
            | Self::Deferred { policy, .. } => policy,
        }
    }

    /// Returns true if the policy was accepted
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

struct Rejection {
    reason: PolicyReason,
    message: String,
}

/// Attaches policies to IR bundles
#[derive(Clone, Debug)]
pub struct Translator {
    config: TranslatorConfig,
}

impl Translator {
    /// Create a translator
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    /// Settings this translator was built with
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Process every policy exactly once against `xds`.
    ///
    /// Returns one outcome per policy in processing order: ascending
    /// priority, ties in slice order. The slice itself is not reordered;
    /// only the status of each policy is written.
    pub fn process_patch_policies(
        &self,
        policies: &mut [ProxyPatchPolicy],
        xds: &mut XdsIrMap,
    ) -> Vec<PolicyOutcome> {
        let mut order: Vec<usize> = (0..policies.len()).collect();
        order.sort_by_key(|&i| policies[i].spec.priority);

        order
            .into_iter()
            .map(|i| self.process_policy(&mut policies[i], xds))
            .collect()
    }

    fn process_policy(&self, policy: &mut ProxyPatchPolicy, xds: &mut XdsIrMap) -> PolicyOutcome {
        let key = PolicyKey::of(policy);
        let target_ref = &policy.spec.target_ref;
        let target_namespace = target_ref.effective_namespace(&key.namespace).to_string();
        let ir_key = self.config.mode.ir_key(&target_namespace, &target_ref.name);

        let Some(ir) = xds.get_mut(&ir_key) else {
            debug!(policy = %key, target = %ir_key, "target not translated yet, deferring policy");
            return PolicyOutcome::Deferred {
                policy: key,
                key: ir_key,
            };
        };

        if let Err(Rejection { reason, message }) =
            self.validate(policy, &key.namespace, &target_namespace)
        {
            warn!(policy = %key, target = %ir_key, reason = %reason, message = %message, "rejecting ProxyPatchPolicy");
            set_rejected(policy, reason, message.clone());
            return PolicyOutcome::Rejected {
                policy: key,
                reason,
                message,
            };
        }

        let fragment = compile_policy(policy);
        let patches = fragment.patches.len();
        ir.patch_policies.push(fragment);
        set_accepted(policy);
        info!(policy = %key, target = %ir_key, patches, "accepted ProxyPatchPolicy");

        PolicyOutcome::Accepted {
            policy: key,
            target: ir_key,
        }
    }

    /// Checks run in order: group/kind, namespace, enablement. The first
    /// failure wins.
    fn validate(
        &self,
        policy: &ProxyPatchPolicy,
        policy_namespace: &str,
        target_namespace: &str,
    ) -> Result<(), Rejection> {
        let target_ref = &policy.spec.target_ref;
        let target_kind = self.config.mode.target_kind();

        if target_ref.group != GROUP || target_ref.kind != target_kind {
            return Err(Rejection {
                reason: PolicyReason::Invalid,
                message: format!(
                    "TargetRef.Group:{} TargetRef.Kind:{}, only TargetRef.Group:{} and TargetRef.Kind:{} is supported.",
                    target_ref.group, target_ref.kind, GROUP, target_kind
                ),
            });
        }

        if policy_namespace != target_namespace {
            return Err(Rejection {
                reason: PolicyReason::Invalid,
                message: format!(
                    "Namespace:{} TargetRef.Namespace:{}, ProxyPatchPolicy can only target a {} in the same namespace.",
                    policy_namespace, target_namespace, target_kind
                ),
            });
        }

        if !self.config.patch_policy_enabled {
            return Err(Rejection {
                reason: PolicyReason::Disabled,
                message: MESSAGE_DISABLED.to_string(),
            });
        }

        Ok(())
    }
}
