//! Infrastructure manager contract
//!
//! Given resolved infra IR, the manager creates, updates, and deletes the
//! proxy fleet's runtime objects and the shared rate limit service. All
//! operations are idempotent: create-or-update converges, delete of an
//! absent object succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_common::config::{GatewayConfig, ProviderType};
use gatehouse_common::{Error, Result, GATEHOUSE_SYSTEM_NAMESPACE};
use gatehouse_translator::ir::Infra;

#[cfg(test)]
use mockall::automock;

use crate::kubernetes::KubernetesInfra;
use crate::store::ObjectStore;

/// Manages proxy fleet and rate limit infrastructure
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InfraManager: Send + Sync {
    /// Create or update the proxy fleet described by `infra`
    async fn create_or_update_proxy_infra(&self, infra: &Infra) -> Result<()>;

    /// Delete the proxy fleet described by `infra`
    async fn delete_proxy_infra(&self, infra: &Infra) -> Result<()>;

    /// Create or update the shared rate limit service
    async fn create_or_update_rate_limit_infra(&self) -> Result<()>;

    /// Delete the shared rate limit service
    async fn delete_rate_limit_infra(&self) -> Result<()>;
}

/// Build the manager for the configured provider.
///
/// Only the Kubernetes provider manages infrastructure; any other provider
/// is refused before anything is constructed.
pub fn new_manager(
    config: &GatewayConfig,
    store: Arc<dyn ObjectStore>,
) -> Result<Arc<dyn InfraManager>> {
    match config.provider.type_ {
        ProviderType::Kubernetes => Ok(Arc::new(KubernetesInfra::new(
            store,
            GATEHOUSE_SYSTEM_NAMESPACE,
            config.kubernetes_provider(),
        ))),
        other => Err(Error::unsupported_provider(other.to_string())),
    }
}
