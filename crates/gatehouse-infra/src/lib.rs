//! Backing store access and proxy infrastructure for gatehouse
//!
//! - [`store`]: the [`ObjectStore`] seam over the cluster API
//! - [`shim`]: serves `v1beta1` Gateway API objects from `v1alpha2` storage
//! - [`rewrite`]: request path rewriting for `v1beta1`-only clusters
//! - [`manager`] and [`kubernetes`]: proxy fleet and rate limit objects
//! - [`runner`]: applies infra IR changes through a manager

#![deny(missing_docs)]

pub mod client;
pub mod kubernetes;
pub mod manager;
pub mod rewrite;
pub mod runner;
pub mod shim;
pub mod store;

#[cfg(test)]
mod testing;

pub use client::{build_client, build_store};
pub use kubernetes::KubernetesInfra;
pub use manager::{new_manager, InfraManager};
pub use rewrite::RewriteApiVersionLayer;
pub use runner::{InfraEvent, InfraRunner};
pub use shim::VersionShim;
pub use store::{KubeObjectStore, ObjectStore, StorePatch};
