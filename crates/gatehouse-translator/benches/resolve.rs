//! Criterion benchmarks for Translator::process_patch_policies()
//!
//! Measures a pass over growing policy sets spread across many gateways,
//! with a mix of accepted, rejected, and deferred policies.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use gatehouse_common::crd::{
    JsonPatchOp, JsonPatchOperation, PolicyTargetReference, ProxyJsonPatch, ProxyPatchPolicy,
    ProxyPatchPolicySpec,
};
use gatehouse_common::gateway_api::{GROUP, KIND_GATEWAY};
use gatehouse_translator::ir::{IrKey, XdsIr, XdsIrMap};
use gatehouse_translator::{TargetMode, Translator, TranslatorConfig};

// =============================================================================
// Fixtures
// =============================================================================

const GATEWAYS: usize = 50;

fn make_policy(i: usize) -> ProxyPatchPolicy {
    let kind = if i % 10 == 0 { "Service" } else { KIND_GATEWAY };
    let mut policy = ProxyPatchPolicy::new(
        &format!("policy-{i}"),
        ProxyPatchPolicySpec {
            target_ref: PolicyTargetReference {
                group: GROUP.to_string(),
                kind: kind.to_string(),
                // gw-50 through gw-59 have no bundle and are deferred
                name: format!("gw-{}", i % (GATEWAYS + 10)),
                namespace: None,
                section_name: None,
            },
            priority: (i % 7) as i32,
            json_patches: (0..4)
                .map(|p| ProxyJsonPatch {
                    type_url: "type.googleapis.com/envoy.config.listener.v3.Listener".to_string(),
                    name: Some(format!("default/gw/{p}")),
                    operation: JsonPatchOperation {
                        op: JsonPatchOp::Add,
                        path: format!("/filters/{p}"),
                        from: None,
                        value: Some(serde_json::json!({ "limit": p })),
                    },
                })
                .collect(),
        },
    );
    policy.metadata.namespace = Some("default".to_string());
    policy
}

fn make_store() -> XdsIrMap {
    let mut xds = XdsIrMap::new();
    for g in 0..GATEWAYS {
        xds.insert(IrKey::for_gateway("default", &format!("gw-{g}")), XdsIr::default());
    }
    xds
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_process(c: &mut Criterion) {
    let translator = Translator::new(TranslatorConfig {
        mode: TargetMode::PerGateway,
        patch_policy_enabled: true,
    });

    let mut group = c.benchmark_group("process_patch_policies");
    for size in [10usize, 100, 1000] {
        let policies: Vec<_> = (0..size).map(make_policy).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &policies, |b, policies| {
            b.iter_batched(
                || (policies.clone(), make_store()),
                |(mut policies, mut xds)| {
                    black_box(translator.process_patch_policies(&mut policies, &mut xds))
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_process);
criterion_main!(benches);
