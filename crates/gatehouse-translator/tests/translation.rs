//! End-to-end translation passes over small policy sets

use gatehouse_common::crd::{
    ConditionStatus, JsonPatchOp, JsonPatchOperation, PolicyTargetReference, ProxyJsonPatch,
    ProxyPatchPolicy, ProxyPatchPolicySpec, POLICY_CONDITION_ACCEPTED,
};
use gatehouse_common::gateway_api::{GROUP, KIND_GATEWAY};
use gatehouse_translator::ir::{IrKey, PatchOp, PolicyKey, XdsIr, XdsIrMap};
use gatehouse_translator::{PolicyOutcome, TargetMode, Translator, TranslatorConfig};
use serde_json::json;

const LISTENER_TYPE: &str = "type.googleapis.com/envoy.config.listener.v3.Listener";

fn translator() -> Translator {
    Translator::new(TranslatorConfig {
        mode: TargetMode::PerGateway,
        patch_policy_enabled: true,
    })
}

fn gateway_policy(name: &str, priority: i32, patch_path: &str) -> ProxyPatchPolicy {
    let mut policy = ProxyPatchPolicy::new(
        name,
        ProxyPatchPolicySpec {
            target_ref: PolicyTargetReference {
                group: GROUP.to_string(),
                kind: KIND_GATEWAY.to_string(),
                name: "eg".to_string(),
                namespace: None,
                section_name: None,
            },
            priority,
            json_patches: vec![ProxyJsonPatch {
                type_url: LISTENER_TYPE.to_string(),
                name: Some("default/eg/http".to_string()),
                operation: JsonPatchOperation {
                    op: JsonPatchOp::Add,
                    path: patch_path.to_string(),
                    from: None,
                    value: Some(json!(1024)),
                },
            }],
        },
    );
    policy.metadata.namespace = Some("default".to_string());
    policy
}

fn store() -> (XdsIrMap, IrKey) {
    let key = IrKey::for_gateway("default", "eg");
    let mut xds = XdsIrMap::new();
    xds.insert(key.clone(), XdsIr::default());
    (xds, key)
}

fn condition_of(policy: &ProxyPatchPolicy) -> (ConditionStatus, String) {
    let c = policy
        .status
        .as_ref()
        .and_then(|s| s.conditions.get(POLICY_CONDITION_ACCEPTED))
        .expect("Accepted condition");
    (c.status, c.reason.clone())
}

/// Story: two policies target the same gateway with priorities 10 and 5.
/// The priority 5 fragment lands in the bundle first.
#[test]
fn story_lower_priority_value_is_bundled_first() {
    let (mut xds, key) = store();
    let mut policies = vec![
        gateway_policy("ten", 10, "/ten"),
        gateway_policy("five", 5, "/five"),
    ];

    let outcomes = translator().process_patch_policies(&mut policies, &mut xds);

    assert!(outcomes.iter().all(PolicyOutcome::is_accepted));
    let bundle: Vec<_> = xds
        .get(&key)
        .unwrap()
        .patch_policies
        .iter()
        .map(|p| (p.policy.name.as_str(), p.patches[0].operation.path.as_str()))
        .collect();
    assert_eq!(bundle, vec![("five", "/five"), ("ten", "/ten")]);
}

/// Story: equal priorities keep their arrival order
#[test]
fn story_ties_keep_input_order() {
    let (mut xds, key) = store();
    let mut policies: Vec<_> = ["a", "b", "c", "d"]
        .iter()
        .map(|n| gateway_policy(n, 0, "/x"))
        .collect();
    policies.insert(2, gateway_policy("first", -1, "/x"));

    let outcomes = translator().process_patch_policies(&mut policies, &mut xds);

    let order: Vec<_> = outcomes.iter().map(|o| o.policy().name.clone()).collect();
    assert_eq!(order, vec!["first", "a", "b", "c", "d"]);
    let bundled: Vec<_> = xds
        .get(&key)
        .unwrap()
        .patch_policies
        .iter()
        .map(|p| p.policy.name.clone())
        .collect();
    assert_eq!(bundled, order);
}

/// Story: a policy targeting a Service in its own namespace is rejected as
/// Invalid and the bundle stays empty
#[test]
fn story_unsupported_kind_is_invalid() {
    let (mut xds, key) = store();
    let mut policy = gateway_policy("svc", 0, "/x");
    policy.spec.target_ref.kind = "Service".to_string();
    let mut policies = vec![policy];

    translator().process_patch_policies(&mut policies, &mut xds);

    assert_eq!(
        condition_of(&policies[0]),
        (ConditionStatus::False, "Invalid".to_string())
    );
    assert!(xds.get(&key).unwrap().patch_policies.is_empty());
}

/// Story: a disabled feature rejects every policy that reaches validation,
/// while unknown targets are still only deferred
#[test]
fn story_disabled_feature_rejects_but_still_defers_unknown_targets() {
    let (mut xds, key) = store();
    let mut orphan = gateway_policy("orphan", 0, "/x");
    orphan.spec.target_ref.name = "missing".to_string();
    let mut policies = vec![gateway_policy("valid", 0, "/x"), orphan];

    let t = Translator::new(TranslatorConfig {
        mode: TargetMode::PerGateway,
        patch_policy_enabled: false,
    });
    let outcomes = t.process_patch_policies(&mut policies, &mut xds);

    assert_eq!(
        condition_of(&policies[0]),
        (ConditionStatus::False, "Disabled".to_string())
    );
    assert!(policies[1].status.is_none());
    assert_eq!(
        outcomes[1],
        PolicyOutcome::Deferred {
            policy: PolicyKey::new("default", "orphan"),
            key: IrKey::for_gateway("default", "missing"),
        }
    );
    assert!(xds.get(&key).unwrap().patch_policies.is_empty());
}

/// Story: rerunning a pass over the same policies with a fresh store yields
/// one Accepted condition per policy, never a duplicate
#[test]
fn story_repeated_passes_are_idempotent_on_status() {
    let mut policies = vec![gateway_policy("p", 0, "/x")];

    for _ in 0..3 {
        let (mut xds, _) = store();
        translator().process_patch_policies(&mut policies, &mut xds);
    }

    let status = policies[0].status.as_ref().unwrap();
    assert_eq!(status.conditions.len(), 1);
    assert_eq!(
        condition_of(&policies[0]),
        (ConditionStatus::True, "Accepted".to_string())
    );
}

/// Story: an accepted policy with no patches still contributes a fragment
#[test]
fn story_empty_patch_list_is_accepted() {
    let (mut xds, key) = store();
    let mut policy = gateway_policy("empty", 0, "/x");
    policy.spec.json_patches.clear();
    let mut policies = vec![policy];

    translator().process_patch_policies(&mut policies, &mut xds);

    let bundle = &xds.get(&key).unwrap().patch_policies;
    assert_eq!(bundle.len(), 1);
    assert!(bundle[0].patches.is_empty());
}

#[test]
fn compiled_fragment_matches_declared_patch() {
    let (mut xds, key) = store();
    let mut policies = vec![gateway_policy("p", 3, "/per_connection_buffer_limit_bytes")];

    translator().process_patch_policies(&mut policies, &mut xds);

    let fragment = &xds.get(&key).unwrap().patch_policies[0];
    assert_eq!(fragment.policy, PolicyKey::new("default", "p"));
    assert_eq!(fragment.priority, 3);
    let patch = &fragment.patches[0];
    assert_eq!(patch.type_url, LISTENER_TYPE);
    assert_eq!(patch.name.as_deref(), Some("default/eg/http"));
    assert_eq!(patch.operation.op, PatchOp::Add);
    assert_eq!(patch.operation.value, Some(json!(1024)));
}
