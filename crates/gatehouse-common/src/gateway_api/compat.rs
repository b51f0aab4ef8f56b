//! Conversions between `v1alpha2` and `v1beta1` reference types
//!
//! Upgrade goes older to newer, downgrade newer to older. Every field present
//! in both generations is copied; `v1beta1::BackendRef::weight` has no
//! `v1alpha2` counterpart and is dropped on downgrade.

use super::{v1alpha2, v1beta1};

/// Convert a `v1alpha2` parent reference to `v1beta1`
pub fn upgrade_parent_reference(old: v1alpha2::ParentReference) -> v1beta1::ParentReference {
    v1beta1::ParentReference {
        group: old.group,
        kind: old.kind,
        namespace: old.namespace,
        name: old.name,
        section_name: old.section_name,
        port: old.port,
    }
}

/// Convert a `v1beta1` parent reference to `v1alpha2`
pub fn downgrade_parent_reference(new: v1beta1::ParentReference) -> v1alpha2::ParentReference {
    v1alpha2::ParentReference {
        group: new.group,
        kind: new.kind,
        namespace: new.namespace,
        name: new.name,
        section_name: new.section_name,
        port: new.port,
    }
}

/// Convert a list of `v1alpha2` parent references, preserving order
pub fn upgrade_parent_references(
    old: Vec<v1alpha2::ParentReference>,
) -> Vec<v1beta1::ParentReference> {
    old.into_iter().map(upgrade_parent_reference).collect()
}

/// Convert a list of `v1beta1` parent references, preserving order
pub fn downgrade_parent_references(
    new: Vec<v1beta1::ParentReference>,
) -> Vec<v1alpha2::ParentReference> {
    new.into_iter().map(downgrade_parent_reference).collect()
}

/// Convert a `v1alpha2` backend reference to `v1beta1` (weight left unset)
pub fn upgrade_backend_ref(old: v1alpha2::BackendRef) -> v1beta1::BackendRef {
    v1beta1::BackendRef {
        group: old.group,
        kind: old.kind,
        namespace: old.namespace,
        name: old.name,
        port: old.port,
        weight: None,
    }
}

/// Convert a `v1beta1` backend reference to `v1alpha2` (weight dropped)
pub fn downgrade_backend_ref(new: v1beta1::BackendRef) -> v1alpha2::BackendRef {
    v1alpha2::BackendRef {
        group: new.group,
        kind: new.kind,
        namespace: new.namespace,
        name: new.name,
        port: new.port,
    }
}

/// Convert a list of `v1alpha2` backend references, preserving order
pub fn upgrade_backend_refs(old: Vec<v1alpha2::BackendRef>) -> Vec<v1beta1::BackendRef> {
    old.into_iter().map(upgrade_backend_ref).collect()
}

/// Convert a list of `v1beta1` backend references, preserving order
pub fn downgrade_backend_refs(new: Vec<v1beta1::BackendRef>) -> Vec<v1alpha2::BackendRef> {
    new.into_iter().map(downgrade_backend_ref).collect()
}

/// Convert `v1alpha2` per-parent route statuses to `v1beta1`
pub fn upgrade_route_parent_statuses(
    old: Vec<v1alpha2::RouteParentStatus>,
) -> Vec<v1beta1::RouteParentStatus> {
    old.into_iter()
        .map(|rps| v1beta1::RouteParentStatus {
            parent_ref: upgrade_parent_reference(rps.parent_ref),
            controller_name: rps.controller_name,
            conditions: rps.conditions,
        })
        .collect()
}

/// Convert `v1beta1` per-parent route statuses to `v1alpha2`
pub fn downgrade_route_parent_statuses(
    new: Vec<v1beta1::RouteParentStatus>,
) -> Vec<v1alpha2::RouteParentStatus> {
    new.into_iter()
        .map(|rps| v1alpha2::RouteParentStatus {
            parent_ref: downgrade_parent_reference(rps.parent_ref),
            controller_name: rps.controller_name,
            conditions: rps.conditions,
        })
        .collect()
}

/// Resolve an optional namespace, treating an empty string as unset
pub fn namespace_deref_or<'a>(namespace: Option<&'a str>, default_namespace: &'a str) -> &'a str {
    match namespace {
        Some(ns) if !ns.is_empty() => ns,
        _ => default_namespace,
    }
}

impl From<v1alpha2::ParentReference> for v1beta1::ParentReference {
    fn from(old: v1alpha2::ParentReference) -> Self {
        upgrade_parent_reference(old)
    }
}

impl From<v1beta1::ParentReference> for v1alpha2::ParentReference {
    fn from(new: v1beta1::ParentReference) -> Self {
        downgrade_parent_reference(new)
    }
}

impl From<v1alpha2::BackendRef> for v1beta1::BackendRef {
    fn from(old: v1alpha2::BackendRef) -> Self {
        upgrade_backend_ref(old)
    }
}

impl From<v1beta1::BackendRef> for v1alpha2::BackendRef {
    fn from(new: v1beta1::BackendRef) -> Self {
        downgrade_backend_ref(new)
    }
}
