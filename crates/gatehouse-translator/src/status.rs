//! Writes the `Accepted` condition onto policy objects
//!
//! Only the in-memory object is touched. Persisting status is the caller's
//! job.

use gatehouse_common::crd::{
    Condition, ConditionStatus, PolicyReason, ProxyPatchPolicy, POLICY_CONDITION_ACCEPTED,
};

/// Message recorded on acceptance
pub const MESSAGE_ACCEPTED: &str = "ProxyPatchPolicy has been accepted.";

/// Set or overwrite the `Accepted` condition, leaving other condition types alone
pub fn set_accepted_condition(
    policy: &mut ProxyPatchPolicy,
    status: ConditionStatus,
    reason: PolicyReason,
    message: impl Into<String>,
) {
    let condition = Condition::new(POLICY_CONDITION_ACCEPTED, status, reason.as_str(), message)
        .with_observed_generation(policy.metadata.generation);
    policy
        .status
        .get_or_insert_with(Default::default)
        .conditions
        .set(condition);
}

/// Mark the policy accepted
pub fn set_accepted(policy: &mut ProxyPatchPolicy) {
    set_accepted_condition(
        policy,
        ConditionStatus::True,
        PolicyReason::Accepted,
        MESSAGE_ACCEPTED,
    );
}

/// Mark the policy rejected with a reason and explanation
pub fn set_rejected(policy: &mut ProxyPatchPolicy, reason: PolicyReason, message: impl Into<String>) {
    set_accepted_condition(policy, ConditionStatus::False, reason, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_common::crd::{PolicyTargetReference, ProxyPatchPolicySpec};

    fn policy() -> ProxyPatchPolicy {
        let mut p = ProxyPatchPolicy::new(
            "p",
            ProxyPatchPolicySpec {
                target_ref: PolicyTargetReference {
                    name: "eg".to_string(),
                    ..Default::default()
                },
                priority: 0,
                json_patches: vec![],
            },
        );
        p.metadata.namespace = Some("default".to_string());
        p.metadata.generation = Some(4);
        p
    }

    fn accepted(p: &ProxyPatchPolicy) -> &Condition {
        p.status
            .as_ref()
            .and_then(|s| s.conditions.get(POLICY_CONDITION_ACCEPTED))
            .unwrap()
    }

    #[test]
    fn acceptance_creates_status_and_condition() {
        let mut p = policy();
        set_accepted(&mut p);

        let c = accepted(&p);
        assert_eq!(c.status, ConditionStatus::True);
        assert_eq!(c.reason, "Accepted");
        assert_eq!(c.message, MESSAGE_ACCEPTED);
        assert_eq!(c.observed_generation, Some(4));
    }

    #[test]
    fn setting_twice_keeps_one_entry() {
        let mut p = policy();
        set_accepted(&mut p);
        set_accepted(&mut p);
        assert_eq!(p.status.as_ref().unwrap().conditions.len(), 1);
    }

    /// Story: a policy accepted on one pass and rejected on the next shows
    /// only the latest verdict
    #[test]
    fn story_rejection_overwrites_acceptance() {
        let mut p = policy();
        set_accepted(&mut p);
        set_rejected(&mut p, PolicyReason::Disabled, "off");

        let status = p.status.as_ref().unwrap();
        assert_eq!(status.conditions.len(), 1);
        let c = accepted(&p);
        assert_eq!(c.status, ConditionStatus::False);
        assert_eq!(c.reason, "Disabled");
        assert_eq!(c.message, "off");
    }

    #[test]
    fn other_condition_types_are_untouched() {
        let mut p = policy();
        let programmed = Condition::new("Programmed", ConditionStatus::True, "Programmed", "ok");
        p.status
            .get_or_insert_with(Default::default)
            .conditions
            .set(programmed.clone());

        set_rejected(&mut p, PolicyReason::Invalid, "bad");

        let conditions = &p.status.as_ref().unwrap().conditions;
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions.get("Programmed"), Some(&programmed));
    }
}
