//! Kubernetes infrastructure provider
//!
//! Proxy fleets and the rate limit service are server-side applied as typed
//! k8s-openapi objects through an [`ObjectStore`], which may be wrapped by
//! the version shim.

mod proxy;
mod ratelimit;

use std::sync::Arc;

use async_trait::async_trait;
use gatehouse_common::config::KubernetesProvider;
use gatehouse_common::{Error, Result};
use gatehouse_translator::ir::Infra;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service, ServiceAccount};
use kube::core::DynamicObject;
use kube::discovery::ApiResource;
use kube::Resource;
use serde::Serialize;
use tracing::{debug, info};

use crate::manager::InfraManager;
use crate::store::{ObjectStore, StorePatch};

pub use proxy::{PROXY_ADMIN_PORT, PROXY_CONFIG_KEY};
pub use ratelimit::{RATE_LIMIT_GRPC_PORT, RATE_LIMIT_NAME};

/// Kubernetes-backed [`InfraManager`]
pub struct KubernetesInfra {
    store: Arc<dyn ObjectStore>,
    namespace: String,
    settings: KubernetesProvider,
}

impl KubernetesInfra {
    /// Manage infrastructure in `namespace` through `store`
    pub fn new(
        store: Arc<dyn ObjectStore>,
        namespace: impl Into<String>,
        settings: KubernetesProvider,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            settings,
        }
    }

    async fn apply<K>(&self, obj: &K) -> Result<()>
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        let ar = ApiResource::erase::<K>(&());
        let name = obj
            .meta()
            .name
            .clone()
            .ok_or_else(|| Error::internal_with_context("apply", format!("{} has no name", ar.kind)))?;
        let dynamic = to_dynamic(obj, &ar)?;

        self.store
            .patch(&ar, Some(&self.namespace), &name, &StorePatch::Apply(dynamic))
            .await?;
        debug!(kind = %ar.kind, name = %name, namespace = %self.namespace, "applied");
        Ok(())
    }

    async fn delete<K>(&self, name: &str) -> Result<()>
    where
        K: Resource<DynamicType = ()>,
    {
        let ar = ApiResource::erase::<K>(&());
        match self.store.delete(&ar, Some(&self.namespace), name).await {
            Err(e) if e.is_not_found() => {
                debug!(kind = %ar.kind, name = %name, "already deleted");
                Ok(())
            }
            other => other,
        }
    }
}

fn to_dynamic<K: Serialize>(obj: &K, ar: &ApiResource) -> Result<DynamicObject> {
    serde_json::to_value(obj)
        .and_then(serde_json::from_value)
        .map_err(|e| Error::serialization_for_kind(&ar.kind, e.to_string()))
}

#[async_trait]
impl InfraManager for KubernetesInfra {
    async fn create_or_update_proxy_infra(&self, infra: &Infra) -> Result<()> {
        let proxy = &infra.proxy;
        let ns = &self.namespace;

        self.apply(&proxy::service_account(proxy, ns)).await?;
        self.apply(&proxy::config_map(proxy, ns)?).await?;
        self.apply(&proxy::deployment(proxy, ns)).await?;
        self.apply(&proxy::service(proxy, ns)).await?;

        info!(proxy = %proxy.resource_name(), owner = %proxy.name, "proxy infrastructure applied");
        Ok(())
    }

    async fn delete_proxy_infra(&self, infra: &Infra) -> Result<()> {
        let name = infra.proxy.resource_name();

        self.delete::<Service>(&name).await?;
        self.delete::<Deployment>(&name).await?;
        self.delete::<ConfigMap>(&name).await?;
        self.delete::<ServiceAccount>(&name).await?;

        info!(proxy = %name, owner = %infra.proxy.name, "proxy infrastructure deleted");
        Ok(())
    }

    async fn create_or_update_rate_limit_infra(&self) -> Result<()> {
        let ns = &self.namespace;
        let settings = &self.settings.rate_limit_deployment;

        self.apply(&ratelimit::deployment(settings, ns)).await?;
        self.apply(&ratelimit::service(ns)).await?;

        info!(name = RATE_LIMIT_NAME, "rate limit infrastructure applied");
        Ok(())
    }

    async fn delete_rate_limit_infra(&self) -> Result<()> {
        self.delete::<Service>(RATE_LIMIT_NAME).await?;
        self.delete::<Deployment>(RATE_LIMIT_NAME).await?;

        info!(name = RATE_LIMIT_NAME, "rate limit infrastructure deleted");
        Ok(())
    }
}
