//! Custom Resource Definitions for gatehouse
//!
//! This module contains the CRDs the translator reads and the status types it
//! writes back onto them.

mod connection;
mod patch_policy;
mod policy;
mod types;

pub use connection::{parse_gateway_duration, Connection, ConnectionLimit};
pub use patch_policy::{
    JsonPatchOp, JsonPatchOperation, ProxyJsonPatch, ProxyPatchPolicy, ProxyPatchPolicySpec,
    ProxyPatchPolicyStatus,
};
pub use policy::{PolicyReason, PolicyTargetReference, POLICY_CONDITION_ACCEPTED};
pub use types::{Condition, ConditionStatus, Conditions};
