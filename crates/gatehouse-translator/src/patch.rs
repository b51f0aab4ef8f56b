//! Compiles a policy's JSON patches into IR patch records
//!
//! Copies every field verbatim and keeps declaration order. Path syntax and
//! value types are checked by the renderer that applies the patches.

use gatehouse_common::crd::{JsonPatchOp, ProxyJsonPatch, ProxyPatchPolicy};

use crate::ir::{JsonPatchConfig, PatchOp, PatchOperation, PatchPolicyIr, PolicyKey};

impl From<JsonPatchOp> for PatchOp {
    fn from(op: JsonPatchOp) -> Self {
        match op {
            JsonPatchOp::Add => PatchOp::Add,
            JsonPatchOp::Remove => PatchOp::Remove,
            JsonPatchOp::Replace => PatchOp::Replace,
            JsonPatchOp::Move => PatchOp::Move,
            JsonPatchOp::Copy => PatchOp::Copy,
            JsonPatchOp::Test => PatchOp::Test,
        }
    }
}

/// Compile a single patch
pub fn compile_patch(patch: &ProxyJsonPatch) -> JsonPatchConfig {
    JsonPatchConfig {
        type_url: patch.type_url.clone(),
        name: patch.name.clone(),
        operation: PatchOperation {
            op: patch.operation.op.into(),
            path: patch.operation.path.clone(),
            from: patch.operation.from.clone(),
            value: patch.operation.value.clone(),
        },
    }
}

/// Compile a list of patches, one record per patch, in order
pub fn compile_patches(patches: &[ProxyJsonPatch]) -> Vec<JsonPatchConfig> {
    patches.iter().map(compile_patch).collect()
}

/// Build the IR fragment for an accepted policy
pub fn compile_policy(policy: &ProxyPatchPolicy) -> PatchPolicyIr {
    PatchPolicyIr {
        policy: PolicyKey::of(policy),
        priority: policy.spec.priority,
        patches: compile_patches(&policy.spec.json_patches),
    }
}
