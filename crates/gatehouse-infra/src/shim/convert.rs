//! Route body conversion between `v1beta1` and `v1alpha2`
//!
//! Reference lists are converted through the typed converters and merged
//! back into the raw JSON, so fields the typed references do not model
//! (e.g. HTTPRoute backend `filters`) survive untouched.

use gatehouse_common::gateway_api::compat;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

const PARENT_REF_FIELDS: &[&str] = &["group", "kind", "namespace", "name", "sectionName", "port"];
const BACKEND_REF_FIELDS: &[&str] = &["group", "kind", "namespace", "name", "port", "weight"];
const ROUTE_PARENT_STATUS_FIELDS: &[&str] = &["parentRef", "controllerName", "conditions"];

/// Direction of a conversion
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    /// `v1beta1` to `v1alpha2`
    Downgrade,
    /// `v1alpha2` to `v1beta1`
    Upgrade,
}

/// Convert the references of a route body (`spec` and `status`) in place
pub(crate) fn convert_route_body(body: &mut Value, direction: Direction) -> Result<(), String> {
    if let Some(refs) = present(body.pointer_mut("/spec/parentRefs")) {
        match direction {
            Direction::Downgrade => convert_list(
                refs,
                PARENT_REF_FIELDS,
                compat::downgrade_parent_references,
            ),
            Direction::Upgrade => convert_list(
                refs,
                PARENT_REF_FIELDS,
                compat::upgrade_parent_references,
            ),
        }
        .map_err(|e| format!("spec.parentRefs: {e}"))?;
    }

    if let Some(rules) = body.pointer_mut("/spec/rules").and_then(Value::as_array_mut) {
        for (i, rule) in rules.iter_mut().enumerate() {
            let Some(backends) = present(rule.get_mut("backendRefs")) else {
                continue;
            };
            match direction {
                Direction::Downgrade => {
                    convert_list(backends, BACKEND_REF_FIELDS, compat::downgrade_backend_refs)
                }
                Direction::Upgrade => {
                    convert_list(backends, BACKEND_REF_FIELDS, compat::upgrade_backend_refs)
                }
            }
            .map_err(|e| format!("spec.rules[{i}].backendRefs: {e}"))?;
        }
    }

    if let Some(parents) = present(body.pointer_mut("/status/parents")) {
        match direction {
            Direction::Downgrade => convert_list(
                parents,
                ROUTE_PARENT_STATUS_FIELDS,
                compat::downgrade_route_parent_statuses,
            ),
            Direction::Upgrade => convert_list(
                parents,
                ROUTE_PARENT_STATUS_FIELDS,
                compat::upgrade_route_parent_statuses,
            ),
        }
        .map_err(|e| format!("status.parents: {e}"))?;
    }

    Ok(())
}

fn present(value: Option<&mut Value>) -> Option<&mut Value> {
    value.filter(|v| !v.is_null())
}

/// Convert a JSON list of `A` into `B` with `convert`, replacing only the
/// fields `A` models on each element
fn convert_list<A, B>(
    list: &mut Value,
    fields: &[&str],
    convert: impl FnOnce(Vec<A>) -> Vec<B>,
) -> Result<(), String>
where
    A: DeserializeOwned,
    B: Serialize,
{
    let items = list.as_array_mut().ok_or("expected a list")?;
    let typed = items
        .iter()
        .cloned()
        .map(serde_json::from_value)
        .collect::<Result<Vec<A>, _>>()
        .map_err(|e| e.to_string())?;

    for (item, converted) in items.iter_mut().zip(convert(typed)) {
        let Value::Object(converted) = serde_json::to_value(converted).map_err(|e| e.to_string())?
        else {
            return Err("converted element is not an object".to_string());
        };
        let target = item.as_object_mut().ok_or("expected an object element")?;
        for field in fields {
            target.remove(*field);
        }
        target.extend(converted);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn newer_route() -> Value {
        json!({
            "spec": {
                "parentRefs": [{ "name": "eg", "sectionName": "http", "port": 80 }],
                "hostnames": ["example.com"],
                "rules": [
                    {
                        "matches": [{ "path": { "type": "PathPrefix", "value": "/" } }],
                        "backendRefs": [{
                            "name": "api",
                            "port": 8080,
                            "weight": 3,
                            "filters": [{ "type": "RequestHeaderModifier" }]
                        }]
                    },
                    { "matches": [] }
                ]
            },
            "status": {
                "parents": [{
                    "parentRef": { "name": "eg" },
                    "controllerName": "gatehouse.dev/gatehouse-controller",
                    "conditions": [{
                        "type": "Accepted",
                        "status": "True",
                        "reason": "Accepted",
                        "message": "Route is accepted",
                        "lastTransitionTime": "2024-01-01T00:00:00Z"
                    }]
                }]
            }
        })
    }

    #[test]
    fn downgrade_drops_weight_and_keeps_siblings() {
        let mut body = newer_route();
        convert_route_body(&mut body, Direction::Downgrade).unwrap();

        let backend = &body["spec"]["rules"][0]["backendRefs"][0];
        assert!(backend.get("weight").is_none());
        assert_eq!(backend["name"], "api");
        assert_eq!(backend["port"], 8080);
        assert_eq!(backend["filters"][0]["type"], "RequestHeaderModifier");
        assert_eq!(body["spec"]["hostnames"][0], "example.com");
        assert_eq!(body["spec"]["parentRefs"][0]["sectionName"], "http");
        assert_eq!(body["spec"]["rules"][1], json!({ "matches": [] }));
    }

    #[test]
    fn status_parents_survive_both_directions() {
        let original = newer_route();
        let mut body = original.clone();
        convert_route_body(&mut body, Direction::Downgrade).unwrap();
        convert_route_body(&mut body, Direction::Upgrade).unwrap();
        assert_eq!(body["status"], original["status"]);
    }

    #[test]
    fn bodies_without_references_are_untouched() {
        let mut body = json!({ "spec": { "parentRefs": null }, "other": 1 });
        let before = body.clone();
        convert_route_body(&mut body, Direction::Upgrade).unwrap();
        assert_eq!(body, before);
    }

    #[test]
    fn malformed_reference_is_reported_with_path() {
        let mut body = json!({ "spec": { "rules": [{ "backendRefs": [{ "port": 80 }] }] } });
        let err = convert_route_body(&mut body, Direction::Downgrade).unwrap_err();
        assert!(err.starts_with("spec.rules[0].backendRefs"));
    }
}
